use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};

use fxdash::core::log::init_logging;
use fxdash::core::series::Interval;
use fxdash::{DashboardRequest, run_dashboard, write_default_config};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Setup,
    /// Fetch and display the index, currencies, and correlation dashboard
    Dashboard(DashboardArgs),
}

#[derive(clap::Args)]
struct DashboardArgs {
    /// Start of the date range (YYYY-MM-DD), defaults to one year back
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the date range (YYYY-MM-DD), defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Sampling interval
    #[arg(long, value_enum)]
    interval: Option<Interval>,

    /// Currency symbol to include (repeatable, up to 5)
    #[arg(long = "currency")]
    currencies: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Setup) => write_default_config(),
        Some(Commands::Dashboard(args)) => {
            let request = DashboardRequest {
                start: args.start,
                end: args.end,
                interval: args.interval,
                currencies: args.currencies,
            };
            run_dashboard(request, cli.config_path.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
