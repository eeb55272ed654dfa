use super::dashboard::{self, DashboardOptions};
use super::ui;
use crate::core::{DashboardState, RateSource};
use anyhow::{Context, Result};

/// Fetches the current rates and renders them as a snapshot of the dashboard.
pub async fn fetch_state(source: &dyn RateSource) -> Result<DashboardState> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let result = source.fetch_snapshot().await;
    pb.finish_and_clear();

    let snapshot = result.context("Failed to fetch exchange rates")?;
    DashboardState::new(snapshot).context("Failed to compute rate statistics")
}

pub async fn run(source: &dyn RateSource, options: &DashboardOptions) -> Result<()> {
    let state = fetch_state(source).await?;
    println!("{}", dashboard::render(&state, options));
    Ok(())
}
