//! Ties the price history, the purchase simulation and the scenario
//! comparison together. Every failure leaves here as a [`SimulationError`].
use crate::core::dca::{self, Ledger, PurchaseConfig};
use crate::core::error::SimulationError;
use crate::core::price::PriceHistoryProvider;
use crate::core::scenario::{self, Projection, ScenarioComparison};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything a projection run produces.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionReport {
    pub asset: String,
    pub plan: PurchaseConfig,
    pub projection: Projection,
    /// Date of the most recent close in the downloaded history.
    pub last_price_date: NaiveDate,
    pub total_units: f64,
    pub total_invested: f64,
    pub comparison: ScenarioComparison,
    #[serde(skip)]
    pub ledger: Ledger,
}

pub async fn run_projection(
    provider: &(dyn PriceHistoryProvider + Send + Sync),
    asset: &str,
    history_start: NaiveDate,
    plan: &PurchaseConfig,
    projection: &Projection,
) -> Result<ProjectionReport, SimulationError> {
    info!("Fetching {asset} price history since {history_start}");
    let series = provider
        .fetch_daily_closes(asset, history_start)
        .await
        .map_err(|e| {
            warn!("Price history fetch failed: {e:#}");
            SimulationError::DataUnavailable(format!("{e:#}"))
        })?;
    debug!(
        "Received {} closes from {} to {}",
        series.len(),
        series.first_date(),
        series.last_date()
    );

    let ledger = dca::simulate(&series, plan)?;
    let total_units = ledger.total_units();
    let total_invested = ledger.total_invested();
    info!(
        "{} purchases, {total_invested:.2} invested for {total_units:.8} units",
        ledger.len()
    );

    if projection.future_date <= plan.start_date {
        warn!(
            "Future date {} is not after start date {}; growth rates will read 0",
            projection.future_date, plan.start_date
        );
    }
    let comparison = scenario::compare(total_units, total_invested, projection, plan.start_date)?;

    Ok(ProjectionReport {
        asset: asset.to_string(),
        plan: plan.clone(),
        projection: *projection,
        last_price_date: series.last_date(),
        total_units,
        total_invested,
        comparison,
        ledger,
    })
}
