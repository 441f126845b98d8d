use clap::{Args, ValueEnum};
use serde_json::Value;

use construction_finance_core::cashflow::projection::{self, CashFlowInput, PeriodGranularity};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GranularityArg {
    Monthly,
    Quarterly,
}

impl From<GranularityArg> for PeriodGranularity {
    fn from(g: GranularityArg) -> Self {
        match g {
            GranularityArg::Monthly => PeriodGranularity::Monthly,
            GranularityArg::Quarterly => PeriodGranularity::Quarterly,
        }
    }
}

/// Arguments for a construction cash-flow projection
#[derive(Args)]
pub struct CashFlowArgs {
    /// Path to JSON input file with `scenario` and optional `policy`
    #[arg(long)]
    pub input: Option<String>,

    /// Period length (overrides the input file)
    #[arg(long)]
    pub granularity: Option<GranularityArg>,

    /// Print only the summary, not every period
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_cashflow(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cf_input: CashFlowInput =
        input::read_input(args.input.as_deref(), "cash-flow projection")?;

    let granularity = args
        .granularity
        .map(PeriodGranularity::from)
        .unwrap_or(cf_input.granularity);
    let policy = cf_input.policy.clone().unwrap_or_default();

    let mut result =
        projection::project_cash_flow_with_policy(&cf_input.scenario, granularity, &policy)?;
    if args.summary_only {
        result.result.periods.clear();
    }
    Ok(serde_json::to_value(result)?)
}
