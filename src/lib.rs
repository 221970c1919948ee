pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::simulate::SimulateOptions;
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::providers::caching::CachingHistoryProvider;
use crate::providers::yahoo_finance::YahooHistoryProvider;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Simulate(SimulateOptions),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("stackcalc starting...");

    let mut config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let ttl = match config.cache.ttl_hours {
        0 => None,
        hours => Some(Duration::from_secs(hours.saturating_mul(60 * 60))),
    };
    let provider = CachingHistoryProvider::new(
        YahooHistoryProvider::new(config.yahoo_base_url()),
        Cache::new(),
        ttl,
    );

    match command {
        AppCommand::Simulate(options) => {
            options.apply_to(&mut config);
            cli::simulate::run(&config, &provider, &options).await
        }
    }
}
