mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::budget::{BudgetArgs, ClassifyArgs};
use commands::cashflow::CashFlowArgs;
use commands::financing::{AmortizeArgs, CompareLoansArgs};
use commands::investment::InvestArgs;
use commands::tax::TaxArgs;

/// Construction project finance calculations
#[derive(Parser)]
#[command(
    name = "cpf",
    version,
    about = "Construction project finance calculations",
    long_about = "A CLI for construction project finance calculations with decimal \
                  precision. Supports loan amortization and comparison, investment \
                  analysis, construction cash-flow projection, property tax estimates \
                  and budget variance tracking."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule for a fixed-rate loan
    Amortize(AmortizeArgs),
    /// Rank loan offers by total cost of credit
    CompareLoans(CompareLoansArgs),
    /// ROI, NPV, IRR, payback and sensitivity for a hold-and-sell case
    Invest(InvestArgs),
    /// Period-by-period construction cash-flow projection
    Cashflow(CashFlowArgs),
    /// Estimate VAT, fees, property and gains taxes
    Tax(TaxArgs),
    /// Track budget lines against actual spend
    Budget(BudgetArgs),
    /// Classify a single budgeted/actual pair
    Classify(ClassifyArgs),
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
    logging::init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::CompareLoans(args) => commands::financing::run_compare_loans(args),
        Commands::Invest(args) => commands::investment::run_invest(args),
        Commands::Cashflow(args) => commands::cashflow::run_cashflow(args),
        Commands::Tax(args) => commands::tax::run_tax(args),
        Commands::Budget(args) => commands::budget::run_budget(args),
        Commands::Classify(args) => commands::budget::run_classify(args),
        Commands::Version => {
            println!("cpf {}", env!("CARGO_PKG_VERSION"));
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
