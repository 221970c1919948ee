use super::ui;
use crate::core::calculator::{self, ProjectionReport};
use crate::core::config::AppConfig;
use crate::core::dca::{Frequency, LedgerRow, PurchaseConfig};
use crate::core::error::SimulationError;
use crate::core::price::PriceHistoryProvider;
use crate::core::scenario::{Projection, TAX_RATE};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Attribute, Cell, CellAlignment};
use serde::Serialize;
use tracing::{debug, info};

/// Values given on the command line; each one replaces the config file's.
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    pub asset: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub frequency: Option<Frequency>,
    pub day: Option<u32>,
    pub future_price: Option<f64>,
    pub future_date: Option<NaiveDate>,
    pub show_ledger: bool,
    pub json: bool,
}

impl SimulateOptions {
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(asset) = &self.asset {
            config.asset = asset.clone();
        }
        if let Some(start_date) = self.start_date {
            config.plan.start_date = start_date;
        }
        if let Some(amount) = self.amount {
            config.plan.amount = amount;
        }
        if let Some(frequency) = self.frequency {
            config.plan.frequency = frequency;
        }
        if self.day.is_some() {
            config.plan.day = self.day;
        }
        if let Some(future_price) = self.future_price {
            config.projection.future_price = future_price;
        }
        if let Some(future_date) = self.future_date {
            config.projection.future_date = future_date;
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a ProjectionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    ledger: Option<&'a [LedgerRow]>,
}

/// Runs one projection and prints it. Simulation failures are reported to
/// the user here and do not propagate.
pub async fn run(
    config: &AppConfig,
    provider: &(dyn PriceHistoryProvider + Send + Sync),
    options: &SimulateOptions,
) -> Result<()> {
    match project(config, provider).await {
        Ok(report) => {
            if options.json {
                let output = JsonOutput {
                    report: &report,
                    ledger: options.show_ledger.then(|| report.ledger.rows()),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                if options.show_ledger {
                    println!("{}", render_ledger(report.ledger.rows()));
                }
                println!("{}", render_report(&report));
            }
        }
        Err(e) => {
            debug!("Projection failed: {e:?}");
            eprintln!(
                "{} {}",
                ui::style_text("Error:", ui::StyleType::Error),
                e.user_message()
            );
        }
    }
    Ok(())
}

async fn project(
    config: &AppConfig,
    provider: &(dyn PriceHistoryProvider + Send + Sync),
) -> Result<ProjectionReport, SimulationError> {
    config
        .validate()
        .map_err(|e| SimulationError::InvalidInput(e.to_string()))?;

    let plan = PurchaseConfig::new(
        config.plan.start_date,
        config.plan.amount,
        config.plan.frequency,
        config.plan.day,
    )?;
    let projection = Projection {
        future_price: config.projection.future_price,
        future_date: config.projection.future_date,
    };
    info!("Projecting {} for plan {:?}", config.asset, plan);

    let spinner = ui::new_spinner("Processing historical prices...");
    let result = calculator::run_projection(
        provider,
        &config.asset,
        config.history_start,
        &plan,
        &projection,
    )
    .await;
    spinner.finish_and_clear();
    result
}

fn render_ledger(rows: &[LedgerRow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Price"),
        ui::header_cell("Invested"),
        ui::header_cell("Units"),
        ui::header_cell("Total units"),
        ui::header_cell("Total invested"),
        ui::header_cell("Value"),
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.date.to_string()),
            ui::money_cell(row.price),
            ui::money_cell(row.invested),
            Cell::new(format!("{:.8}", row.units)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.8}", row.cumulative_units)).set_alignment(CellAlignment::Right),
            ui::money_cell(row.cumulative_invested),
            ui::money_cell(row.market_value()),
        ]);
    }
    table.to_string()
}

fn render_report(report: &ProjectionReport) -> String {
    let comparison = &report.comparison;
    let tax_pct = TAX_RATE * 100.0;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Scenario"),
        ui::header_cell(&format!("Tax ({tax_pct:.0}%)")),
        ui::header_cell("Net worth"),
        ui::header_cell("CAGR"),
    ]);
    table.add_row(vec![
        Cell::new("A: Sell through an exchange"),
        ui::money_cell(-comparison.taxed.tax_paid),
        ui::money_cell(comparison.taxed.net_value),
        ui::change_cell(comparison.taxed.cagr_percent),
    ]);
    table.add_row(vec![
        Cell::new("B: Hold, never sell").add_attribute(Attribute::Bold),
        ui::money_cell(comparison.held.tax_paid),
        ui::money_cell(comparison.held.net_value),
        ui::change_cell(comparison.held.cagr_percent),
    ]);

    let mut output = format!(
        "Plan: {}\n\n",
        ui::style_text(
            &format!(
                "{} of {} {} from {}",
                ui::format_money(report.plan.amount),
                report.asset,
                report.plan.schedule,
                report.plan.start_date
            ),
            ui::StyleType::Title
        )
    );
    output.push_str(&format!(
        "Purchases: {}  Invested: {}  Units: {:.4}  {}\n",
        report.ledger.len(),
        ui::format_money(report.total_invested),
        report.total_units,
        ui::style_text(
            &format!("(prices through {})", report.last_price_date),
            ui::StyleType::Subtle
        )
    ));
    output.push_str(&format!(
        "Projection: {} per unit on {} ({:.1} years)\n\n",
        ui::format_money(report.projection.future_price),
        report.projection.future_date,
        comparison.years
    ));
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{} {}\n",
        ui::style_text("Cost of selling:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_money(comparison.difference), ui::StyleType::Loss)
    ));
    output.push_str(&ui::style_text(
        &format!(
            "Scenario B keeps all {:.4} units, worth {}.",
            report.total_units,
            ui::format_money(comparison.held.net_value)
        ),
        ui::StyleType::TotalValue,
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::{PricePoint, PriceSeries};
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct StaticProvider;

    #[async_trait]
    impl PriceHistoryProvider for StaticProvider {
        async fn fetch_daily_closes(&self, asset: &str, _start: NaiveDate) -> Result<PriceSeries> {
            if asset != "BTC-USD" {
                return Err(anyhow!("unknown asset"));
            }
            let points = date(2020, 1, 1)
                .iter_days()
                .take(10)
                .map(|d| PricePoint::new(d, 100.0))
                .collect();
            PriceSeries::new(points)
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        SimulateOptions {
            start_date: Some(date(2020, 1, 1)),
            amount: Some(10.0),
            frequency: Some(Frequency::Daily),
            future_price: Some(20_000.0),
            future_date: Some(date(2021, 1, 1)),
            ..Default::default()
        }
        .apply_to(&mut config);
        config
    }

    #[test]
    fn options_override_config() {
        let config = config();
        assert_eq!(config.plan.start_date, date(2020, 1, 1));
        assert_eq!(config.plan.amount, 10.0);
        assert_eq!(config.projection.future_price, 20_000.0);
        assert_eq!(config.asset, "BTC-USD");
    }

    #[tokio::test]
    async fn renders_both_scenarios() {
        let report = project(&config(), &StaticProvider).await.unwrap();
        let text = console::strip_ansi_codes(&render_report(&report)).to_string();

        assert!(text.contains("A: Sell through an exchange"));
        assert!(text.contains("B: Hold, never sell"));
        // 1 unit at 20,000; tax on 19,900 profit = 4,975
        assert!(text.contains("$15,025"));
        assert!(text.contains("$20,000"));
        assert!(text.contains("-$4,975"));
        assert!(text.contains("Cost of selling: $4,975"));
        assert!(text.contains("Scenario B keeps all 1.0000 units"));
    }

    #[tokio::test]
    async fn invalid_inputs_are_reported_not_fatal() {
        let mut config = config();
        config.plan.frequency = Frequency::Weekly;
        config.plan.day = Some(9);
        assert!(matches!(
            project(&config, &StaticProvider).await,
            Err(SimulationError::InvalidInput(_))
        ));
        assert!(run(&config, &StaticProvider, &SimulateOptions::default()).await.is_ok());

        let mut config = self::config();
        config.asset = "ETH-USD".to_string();
        assert!(matches!(
            project(&config, &StaticProvider).await,
            Err(SimulationError::DataUnavailable(_))
        ));
    }

    #[test]
    fn ledger_table_lists_every_row() {
        let series = PriceSeries::new(vec![
            PricePoint::new(date(2020, 1, 1), 100.0),
            PricePoint::new(date(2020, 1, 2), 200.0),
        ])
        .unwrap();
        let plan = PurchaseConfig::new(date(2020, 1, 1), 10.0, Frequency::Daily, None).unwrap();
        let ledger = crate::core::dca::simulate(&series, &plan).unwrap();

        let text = console::strip_ansi_codes(&render_ledger(ledger.rows())).to_string();
        assert!(text.contains("2020-01-01"));
        assert!(text.contains("2020-01-02"));
        assert!(text.contains("0.15000000"));
    }
}
