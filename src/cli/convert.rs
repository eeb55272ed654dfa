use super::rates::fetch_state;
use super::ui;
use crate::core::{ConversionRequest, RateSource};
use anyhow::{Context, Result};
use tracing::debug;

/// Converts with the current rates and returns the converted amount.
pub async fn convert(source: &dyn RateSource, request: &ConversionRequest) -> Result<f64> {
    let state = fetch_state(source).await?;
    let rates = state.snapshot.units_per_base();
    debug!("Converting {request} with {} known currencies", rates.len());

    request.apply(&rates).with_context(|| {
        format!(
            "Cannot convert {request} (known currencies: {})",
            state.snapshot.codes().join(", ")
        )
    })
}

pub async fn run(source: &dyn RateSource, request: &ConversionRequest) -> Result<()> {
    let result = convert(source, request).await?;
    println!(
        "{} {} = {} {}",
        request.amount,
        request.from,
        ui::style_text(&format!("{result:.4}"), ui::StyleType::TotalValue),
        request.to
    );
    Ok(())
}
