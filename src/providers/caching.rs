use crate::core::cache::Cache;
use crate::core::price::{PriceHistoryProvider, PriceSeries};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;

/// Memoizes successful history fetches for `ttl`. Failures always go back
/// to the inner provider.
pub struct CachingHistoryProvider<T: PriceHistoryProvider> {
    inner: T,
    cache: Cache<(String, NaiveDate), PriceSeries>,
    ttl: Option<Duration>,
}

impl<T: PriceHistoryProvider> CachingHistoryProvider<T> {
    pub fn new(inner: T, cache: Cache<(String, NaiveDate), PriceSeries>, ttl: Option<Duration>) -> Self {
        Self { inner, cache, ttl }
    }

    /// Drops any cached series for `asset` from `start`, forcing a refetch.
    pub async fn invalidate(&self, asset: &str, start: NaiveDate) {
        self.cache.invalidate(&(asset.to_string(), start)).await;
    }
}

#[async_trait]
impl<T: PriceHistoryProvider> PriceHistoryProvider for CachingHistoryProvider<T> {
    async fn fetch_daily_closes(&self, asset: &str, start: NaiveDate) -> Result<PriceSeries> {
        let key = (asset.to_string(), start);
        if let Some(series) = self.cache.get(&key).await {
            debug!("Using cached history for {}", asset);
            return Ok(series);
        }

        let series = self.inner.fetch_daily_closes(asset, start).await?;
        self.cache.put(key, series.clone(), self.ttl).await;
        Ok(series)
    }
}
