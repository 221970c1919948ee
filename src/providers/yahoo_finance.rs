use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{PriceHistoryProvider, PricePoint, PriceSeries};
use crate::providers::util::with_retry;

/// Daily history from the Yahoo Finance chart API.
pub struct YahooHistoryProvider {
    base_url: String,
}

impl YahooHistoryProvider {
    pub fn new(base_url: &str) -> Self {
        YahooHistoryProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

/// Pairs the chart timestamps with their closes. Only those two arrays are
/// read; anything else in the payload is ignored.
fn extract_daily_closes(item: &ChartItem) -> Result<Vec<PricePoint>> {
    let timestamps = item
        .timestamp
        .as_ref()
        .ok_or_else(|| anyhow!("Chart has no timestamps"))?;
    let closes = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
        .and_then(|q| q.close.as_ref())
        .ok_or_else(|| anyhow!("Chart has no close prices"))?;

    if timestamps.len() != closes.len() {
        return Err(anyhow!(
            "Chart has {} timestamps but {} closes",
            timestamps.len(),
            closes.len()
        ));
    }

    let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.iter().zip(closes) {
        let Some(close) = close else {
            continue;
        };
        let date = Utc
            .timestamp_opt(*ts, 0)
            .single()
            .ok_or_else(|| anyhow!("Invalid timestamp in chart: {ts}"))?
            .date_naive();
        points.push(PricePoint::new(date, *close));
    }

    // The live bar can repeat today's date; keep the latest quote.
    points.sort_by_key(|p| p.date);
    points.reverse();
    points.dedup_by_key(|p| p.date);
    points.reverse();

    Ok(points)
}

#[async_trait]
impl PriceHistoryProvider for YahooHistoryProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(asset = %asset, start = %start)
    )]
    async fn fetch_daily_closes(&self, asset: &str, start: NaiveDate) -> Result<PriceSeries> {
        let period1 = start.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let period2 = Utc::now().timestamp();
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url, asset, period1, period2
        );
        debug!("Requesting price history from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("stackcalc/0.1")
            .build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, 3, 500)
            .await
            .with_context(|| format!("Request failed for asset: {asset}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for asset: {}",
                response.status(),
                asset
            ));
        }

        let text = response
            .text()
            .await
            .context("Failed to read response body")?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", asset, e))?;

        if let Some(err) = data.chart.error {
            return Err(anyhow!(
                "Chart error for {}: {} {}",
                asset,
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            ));
        }

        let item = data
            .chart
            .result
            .as_ref()
            .and_then(|r| r.first())
            .ok_or_else(|| anyhow!("No price data found for asset: {}", asset))?;

        let points = extract_daily_closes(item)
            .with_context(|| format!("Unexpected chart shape for asset: {asset}"))?;
        debug!("Parsed {} daily closes for {}", points.len(), asset);

        PriceSeries::new(points).with_context(|| format!("No usable closes for asset: {asset}"))
    }
}
