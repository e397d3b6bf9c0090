mod commands;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analysis::{AnalyzeArgs, AssumptionsArgs};
use commands::loan::PaymentArgs;

/// Residential property investment analysis
#[derive(Parser)]
#[command(
    name = "realty",
    version,
    about = "Residential property investment analysis",
    long_about = "Score a residential property as a rental, flip, BRRRR, house hack or \
                  appreciation play. Reads the property record and analysis config as JSON \
                  and reports loan details, expenses, cash flow, return metrics, stress \
                  tests and a 0-100 score with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Emit debug logs to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full investment analysis for one property
    Analyze(AnalyzeArgs),
    /// Monthly payment and amortization schedule for a fixed-rate loan
    Payment(PaymentArgs),
    /// Print the default assumptions as editable JSON
    Assumptions(AssumptionsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Assumptions(args) => commands::analysis::run_assumptions(args),
        Commands::Version => {
            println!("realty {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
