//! Recurring-purchase simulation over a daily price history.
use crate::core::error::SimulationError;
use crate::core::price::{PricePoint, PriceSeries};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Frequency::Daily => "daily",
                Frequency::Weekly => "weekly",
                Frequency::Monthly => "monthly",
            }
        )
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "d" => Ok(Frequency::Daily),
            "weekly" | "w" => Ok(Frequency::Weekly),
            "monthly" | "m" => Ok(Frequency::Monthly),
            _ => Err(anyhow::anyhow!("Invalid frequency: {}", s)),
        }
    }
}

/// When purchases happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "frequency", content = "on", rename_all = "lowercase")]
pub enum Schedule {
    Daily,
    Weekly(Weekday),
    /// Day of month 1-31; months without that day buy on their last
    /// available date.
    Monthly(u32),
}

impl Schedule {
    /// Builds a schedule from a frequency and its day selector: a weekday
    /// index (0 = Monday .. 6 = Sunday) for weekly, a day of month for
    /// monthly. The selector is ignored for daily purchases.
    pub fn new(frequency: Frequency, day: Option<u32>) -> Result<Self, SimulationError> {
        match frequency {
            Frequency::Daily => Ok(Schedule::Daily),
            Frequency::Weekly => {
                let idx = day.ok_or_else(|| {
                    SimulationError::InvalidInput("Weekly purchases need a weekday (0-6)".into())
                })?;
                WEEKDAYS
                    .get(idx as usize)
                    .map(|w| Schedule::Weekly(*w))
                    .ok_or_else(|| {
                        SimulationError::InvalidInput(format!(
                            "Weekday must be between 0 (Monday) and 6 (Sunday), got {idx}"
                        ))
                    })
            }
            Frequency::Monthly => match day {
                Some(d @ 1..=31) => Ok(Schedule::Monthly(d)),
                Some(d) => Err(SimulationError::InvalidInput(format!(
                    "Day of month must be between 1 and 31, got {d}"
                ))),
                None => Err(SimulationError::InvalidInput(
                    "Monthly purchases need a day of month (1-31)".into(),
                )),
            },
        }
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            Schedule::Daily => Frequency::Daily,
            Schedule::Weekly(_) => Frequency::Weekly,
            Schedule::Monthly(_) => Frequency::Monthly,
        }
    }
}

impl Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Schedule::Daily => write!(f, "every day"),
            Schedule::Weekly(w) => write!(f, "every {w}"),
            Schedule::Monthly(d) => write!(f, "monthly on day {d}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseConfig {
    pub start_date: NaiveDate,
    pub amount: f64,
    pub schedule: Schedule,
}

impl PurchaseConfig {
    pub fn new(
        start_date: NaiveDate,
        amount: f64,
        frequency: Frequency,
        day: Option<u32>,
    ) -> Result<Self, SimulationError> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(SimulationError::InvalidInput(format!(
                "Periodic amount must be positive, got {amount}"
            )));
        }
        Ok(Self {
            start_date,
            amount,
            schedule: Schedule::new(frequency, day)?,
        })
    }
}

/// One executed purchase and the running totals after it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub price: f64,
    pub invested: f64,
    pub units: f64,
    pub cumulative_units: f64,
    pub cumulative_invested: f64,
}

impl LedgerRow {
    /// Market value of the units held after this purchase at the day's close.
    pub fn market_value(&self) -> f64 {
        self.cumulative_units * self.price
    }
}

/// Purchases in ascending date order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn last(&self) -> Option<&LedgerRow> {
        self.rows.last()
    }

    pub fn total_units(&self) -> f64 {
        self.last().map_or(0.0, |r| r.cumulative_units)
    }

    pub fn total_invested(&self) -> f64 {
        self.last().map_or(0.0, |r| r.cumulative_invested)
    }
}

fn purchase_dates<'a>(points: &'a [PricePoint], schedule: &Schedule) -> Vec<&'a PricePoint> {
    match schedule {
        Schedule::Daily => points.iter().collect(),
        Schedule::Weekly(weekday) => points
            .iter()
            .filter(|p| p.date.weekday() == *weekday)
            .collect(),
        Schedule::Monthly(day) => points
            .chunk_by(|a, b| a.date.year() == b.date.year() && a.date.month() == b.date.month())
            .filter_map(|month| {
                month
                    .iter()
                    .find(|p| p.date.day() == *day)
                    .or_else(|| month.last())
            })
            .collect(),
    }
}

/// Runs the purchase plan against `series` and returns the resulting ledger.
///
/// Fails with [`SimulationError::NoHistoryForRange`] when nothing can be
/// bought on or after the start date, and with
/// [`SimulationError::Computation`] when a purchase day carries a
/// non-positive price.
pub fn simulate(series: &PriceSeries, config: &PurchaseConfig) -> Result<Ledger, SimulationError> {
    let no_history = || SimulationError::NoHistoryForRange {
        start: config.start_date,
    };

    let available = series.since(config.start_date);
    if available.is_empty() {
        return Err(no_history());
    }

    let selected = purchase_dates(available, &config.schedule);
    debug!(
        "{} of {} days selected for {}",
        selected.len(),
        available.len(),
        config.schedule
    );
    if selected.is_empty() {
        return Err(no_history());
    }

    let mut rows = Vec::with_capacity(selected.len());
    let mut cumulative_units = 0.0;
    let mut cumulative_invested = 0.0;
    for point in selected {
        if point.close <= 0.0 || !point.close.is_finite() {
            return Err(SimulationError::Computation(format!(
                "Invalid price {} on {}",
                point.close, point.date
            )));
        }
        let units = config.amount / point.close;
        cumulative_units += units;
        cumulative_invested += config.amount;
        rows.push(LedgerRow {
            date: point.date,
            price: point.close,
            invested: config.amount,
            units,
            cumulative_units,
            cumulative_invested,
        });
    }

    Ok(Ledger { rows })
}
