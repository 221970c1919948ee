use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use stackcalc::cli::simulate::SimulateOptions;
use stackcalc::core::dca::Frequency;
use stackcalc::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SimulateArgs {
    /// Asset symbol, e.g. BTC-USD
    #[arg(long)]
    asset: Option<String>,

    /// First day of the purchase plan (YYYY-MM-DD)
    #[arg(short, long)]
    start: Option<NaiveDate>,

    /// Amount invested on every purchase
    #[arg(short, long)]
    amount: Option<f64>,

    /// daily, weekly or monthly
    #[arg(short, long)]
    frequency: Option<Frequency>,

    /// Weekday for weekly plans (0 = Monday) or day of month for monthly plans
    #[arg(short, long)]
    day: Option<u32>,

    /// Expected price per unit on the target date
    #[arg(long)]
    future_price: Option<f64>,

    /// Target date of the projection (YYYY-MM-DD)
    #[arg(long)]
    future_date: Option<NaiveDate>,

    /// Print every purchase
    #[arg(long)]
    ledger: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl From<SimulateArgs> for SimulateOptions {
    fn from(args: SimulateArgs) -> SimulateOptions {
        SimulateOptions {
            asset: args.asset,
            start_date: args.start,
            amount: args.amount,
            frequency: args.frequency,
            day: args.day,
            future_price: args.future_price,
            future_date: args.future_date,
            show_ledger: args.ledger,
            json: args.json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Project a recurring purchase plan and compare selling against holding
    Simulate(SimulateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => stackcalc::cli::setup::setup(),
        Some(Commands::Simulate(args)) => {
            stackcalc::run_command(
                stackcalc::AppCommand::Simulate(args.into()),
                cli.config_path.as_deref(),
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
