use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use construction_finance_core::financing::amortization::{self, LoanInput};
use construction_finance_core::financing::comparison::{self, LoanComparisonInput};

use crate::input;

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6 for 6%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Omit the month-by-month schedule, keep the yearly roll-up
    #[arg(long)]
    pub summary_only: bool,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for loan offer comparison
#[derive(Args)]
pub struct CompareLoansArgs {
    /// Path to JSON input file with an `offers` array
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if args.input.is_some() || args.principal.is_none() {
        input::read_input(args.input.as_deref(), "amortization")?
    } else {
        LoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
        }
    };

    let mut result = amortization::amortize(&loan_input)?;
    if args.summary_only {
        result.result.schedule.clear();
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare_loans(args: CompareLoansArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input: LoanComparisonInput =
        input::read_input(args.input.as_deref(), "loan comparison")?;
    let result = comparison::compare_loan_options(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}
