pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::dashboard::{DashboardOptions, SortKey};
use crate::core::config::AppConfig;
use crate::core::{ConversionRequest, RateSource};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rates {
        sort: SortKey,
        descending: bool,
    },
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
    Watch {
        amount: Option<f64>,
        from: Option<String>,
        to: Option<String>,
        sort: SortKey,
        descending: bool,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Ratewatch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let source = Arc::new(providers::cbr::CbrRateSource::new(
        &config.providers.cbr.base_url,
        config.request_timeout(),
    )?);

    match command {
        AppCommand::Rates { sort, descending } => {
            let options = DashboardOptions {
                sort,
                descending,
                converter: None,
            };
            cli::rates::run(source.as_ref(), &options).await
        }
        AppCommand::Convert { amount, from, to } => {
            let request = ConversionRequest::new(amount, &from, &to);
            cli::convert::run(source.as_ref(), &request).await
        }
        AppCommand::Watch {
            amount,
            from,
            to,
            sort,
            descending,
        } => {
            let converter = &config.converter;
            let request = ConversionRequest::new(
                amount.unwrap_or(converter.amount),
                from.as_deref().unwrap_or(&converter.from),
                to.as_deref().unwrap_or(&converter.to),
            );
            let options = DashboardOptions {
                sort,
                descending,
                converter: Some(request),
            };
            let source: Arc<dyn RateSource> = source;
            cli::watch::run(source, config.refresh_interval(), options).await
        }
    }
}
