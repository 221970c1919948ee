//! Projects accumulated units to a future price and compares selling
//! (and paying tax on the gain) against holding.
use crate::core::error::SimulationError;
use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr;
use serde::Serialize;
use tracing::debug;

/// Tax charged on realised gains in the selling scenario.
pub const TAX_RATE: f64 = 0.25;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub gross_future_value: f64,
    pub tax_paid: f64,
    pub net_value: f64,
    pub cagr_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub gross_future_value: f64,
    pub years: f64,
    /// Units sold at the future price, gain taxed.
    pub taxed: ScenarioResult,
    /// Units kept, no taxable event.
    pub held: ScenarioResult,
    /// `held.net_value - taxed.net_value`
    pub difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub future_price: f64,
    pub future_date: NaiveDate,
}

/// Years between two dates on a 365.25-day year. Negative when `to` is
/// before `from`.
pub fn elapsed_years(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// Compound annual growth rate from `invested` to `net` over `years`, as a
/// fraction. Zero when either `invested` or `years` is not positive.
pub fn compound_annual_growth(invested: f64, net: f64, years: f64) -> Result<f64, SimulationError> {
    if invested <= 0.0 || years <= 0.0 {
        return Ok(0.0);
    }
    if net <= 0.0 {
        return Ok(-1.0);
    }

    // Decimal tops out near 7.9e28, which very short horizons can exceed.
    let estimate = (net / invested).powf(1.0 / years) - 1.0;
    if !estimate.is_finite() || estimate.abs() > 1e12 {
        debug!("cagr out of decimal range, using float estimate {estimate}");
        return Ok(estimate);
    }

    let begin_bal = Decimal::from_f64(invested)
        .ok_or_else(|| SimulationError::Computation("Invalid invested amount".into()))?;
    let end_bal = Decimal::from_f64(net)
        .ok_or_else(|| SimulationError::Computation("Invalid net value".into()))?;
    let n_years = Decimal::from_f64(years)
        .ok_or_else(|| SimulationError::Computation("Invalid duration".into()))?;
    if n_years.is_zero() {
        return Ok(0.0);
    }

    let rate = cagr(begin_bal, end_bal, n_years);
    debug!("cagr: {begin_bal}, {end_bal}, {n_years} = {rate}");
    rate.to_f64()
        .ok_or_else(|| SimulationError::Computation("CAGR conversion failed".into()))
}

fn scenario(
    gross: f64,
    tax_paid: f64,
    invested: f64,
    years: f64,
) -> Result<ScenarioResult, SimulationError> {
    let net_value = gross - tax_paid;
    Ok(ScenarioResult {
        gross_future_value: gross,
        tax_paid,
        net_value,
        cagr_percent: compound_annual_growth(invested, net_value, years)? * 100.0,
    })
}

/// Values `total_units` at the projected price and builds both scenarios.
pub fn compare(
    total_units: f64,
    total_invested: f64,
    projection: &Projection,
    start_date: NaiveDate,
) -> Result<ScenarioComparison, SimulationError> {
    let gross = total_units * projection.future_price;
    if !gross.is_finite() {
        return Err(SimulationError::Computation(format!(
            "Future value is not finite ({total_units} units at {})",
            projection.future_price
        )));
    }

    let years = elapsed_years(start_date, projection.future_date);
    let profit = gross - total_invested;
    let tax = profit.max(0.0) * TAX_RATE;

    let taxed = scenario(gross, tax, total_invested, years)?;
    let held = scenario(gross, 0.0, total_invested, years)?;

    Ok(ScenarioComparison {
        gross_future_value: gross,
        years,
        difference: held.net_value - taxed.net_value,
        taxed,
        held,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn projection(price: f64, on: NaiveDate) -> Projection {
        Projection {
            future_price: price,
            future_date: on,
        }
    }

    #[test]
    fn taxes_only_the_gain() {
        let result = compare(1.0, 100.0, &projection(200.0, date(2021, 1, 1)), date(2020, 1, 1))
            .unwrap();

        assert_eq!(result.gross_future_value, 200.0);
        assert_eq!(result.taxed.tax_paid, 25.0);
        assert_eq!(result.taxed.net_value, 175.0);
        assert_eq!(result.held.tax_paid, 0.0);
        assert_eq!(result.held.net_value, 200.0);
        assert_eq!(result.difference, 25.0);
        assert!((result.years - 366.0 / 365.25).abs() < 1e-12);
    }

    #[test]
    fn loss_is_not_taxed() {
        let result = compare(1.0, 500.0, &projection(200.0, date(2025, 1, 1)), date(2020, 1, 1))
            .unwrap();

        assert_eq!(result.taxed.tax_paid, 0.0);
        assert_eq!(result.taxed.net_value, result.gross_future_value);
        assert_eq!(result.difference, 0.0);
        assert!(result.taxed.cagr_percent < 0.0);
    }

    #[test]
    fn held_net_always_equals_gross() {
        for (units, invested, price) in [(0.5, 1000.0, 50_000.0), (2.0, 10.0, 10_000.0)] {
            let result =
                compare(units, invested, &projection(price, date(2030, 12, 31)), date(2018, 1, 1))
                    .unwrap();
            assert_eq!(result.held.net_value, result.gross_future_value);
            assert!(result.taxed.net_value <= result.gross_future_value);
            assert!(result.taxed.tax_paid >= 0.0);
        }
    }

    #[test]
    fn cagr_is_zero_without_investment_or_time() {
        assert_eq!(compound_annual_growth(0.0, 100.0, 5.0).unwrap(), 0.0);
        assert_eq!(compound_annual_growth(-1.0, 100.0, 5.0).unwrap(), 0.0);
        assert_eq!(compound_annual_growth(100.0, 200.0, 0.0).unwrap(), 0.0);
        assert_eq!(compound_annual_growth(100.0, 200.0, -2.0).unwrap(), 0.0);
    }

    #[test]
    fn cagr_survives_very_short_horizons() {
        let rate = compound_annual_growth(100.0, 10_000.0, 1.0 / 365.25).unwrap();
        assert!(rate.is_infinite() || rate > 1e12);
    }

    #[test]
    fn cagr_compounds_back_to_net() {
        let invested = 1_000.0;
        let net = 3_500.0;
        let years = 4.5;
        let rate = compound_annual_growth(invested, net, years).unwrap();

        let compounded = (1.0 + rate).powf(years) * invested;
        assert!((compounded - net).abs() / net < 1e-6);
    }

    #[test]
    fn future_date_before_start_reports_zero_cagr() {
        let result = compare(1.0, 100.0, &projection(200.0, date(2019, 1, 1)), date(2020, 1, 1))
            .unwrap();

        assert!(result.years < 0.0);
        assert_eq!(result.taxed.cagr_percent, 0.0);
        assert_eq!(result.held.cagr_percent, 0.0);
        assert_eq!(result.difference, 25.0);
    }
}
