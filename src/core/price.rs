//! Price history abstractions and core types

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closing price of an asset on one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily closes ordered by date. Never empty; dates are unique and strictly
/// increasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(anyhow!("Price series is empty"));
        }
        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(anyhow!(
                "Price series is not strictly ascending at {} -> {}",
                pair[0].date,
                pair[1].date
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Points dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> &[PricePoint] {
        let idx = self.points.partition_point(|p| p.date < start);
        &self.points[idx..]
    }
}

#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Daily closes for `asset` from `start` through today.
    async fn fetch_daily_closes(&self, asset: &str, start: NaiveDate) -> Result<PriceSeries>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_empty_series() {
        let err = PriceSeries::new(vec![]).unwrap_err();
        assert_eq!(err.to_string(), "Price series is empty");
    }

    #[test]
    fn rejects_duplicate_and_unordered_dates() {
        let dup = vec![
            PricePoint::new(date(2020, 1, 1), 1.0),
            PricePoint::new(date(2020, 1, 1), 2.0),
        ];
        assert!(PriceSeries::new(dup).is_err());

        let unordered = vec![
            PricePoint::new(date(2020, 1, 2), 1.0),
            PricePoint::new(date(2020, 1, 1), 2.0),
        ];
        assert!(PriceSeries::new(unordered).is_err());
    }

    #[test]
    fn since_returns_points_on_or_after_start() {
        let series = PriceSeries::new(vec![
            PricePoint::new(date(2020, 1, 1), 1.0),
            PricePoint::new(date(2020, 1, 3), 2.0),
            PricePoint::new(date(2020, 1, 5), 3.0),
        ])
        .unwrap();

        assert_eq!(series.since(date(2019, 12, 1)).len(), 3);
        assert_eq!(series.since(date(2020, 1, 3)).len(), 2);
        assert_eq!(series.since(date(2020, 1, 4))[0].date, date(2020, 1, 5));
        assert!(series.since(date(2020, 1, 6)).is_empty());
        assert_eq!(series.first_date(), date(2020, 1, 1));
        assert_eq!(series.last_date(), date(2020, 1, 5));
    }
}
