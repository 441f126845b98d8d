use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use construction_finance_core::budget::actuals::{ActualsProvider, FixedActuals, SimulatedActuals};
use construction_finance_core::budget::variance::{self, BudgetInput};

use crate::input;

/// Arguments for budget tracking
#[derive(Args)]
pub struct BudgetArgs {
    /// Path to JSON input file with `lines` and optional `actuals`
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON or YAML file mapping category to actual spend
    #[arg(long)]
    pub actuals: Option<String>,

    /// Simulate actual spend with this RNG seed instead of reading it
    #[arg(long, conflicts_with = "actuals")]
    pub simulate_seed: Option<u64>,
}

/// Arguments for classifying a single budget line
#[derive(Args)]
pub struct ClassifyArgs {
    /// Budgeted amount
    #[arg(long)]
    pub budgeted: Decimal,

    /// Actual spend
    #[arg(long)]
    pub actual: Decimal,
}

pub fn run_budget(args: BudgetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let budget_input: BudgetInput = input::read_input(args.input.as_deref(), "budget tracking")?;

    let provider: Box<dyn ActualsProvider> = if let Some(seed) = args.simulate_seed {
        tracing::debug!(seed, "simulating actual spend");
        Box::new(SimulatedActuals::with_default_ranges(seed))
    } else if let Some(path) = args.actuals.as_deref() {
        let actuals: FixedActuals = input::file::read_config(path)?;
        Box::new(actuals)
    } else if let Some(actuals) = budget_input.actuals.clone() {
        Box::new(actuals)
    } else {
        return Err("actual spend required: --actuals <file>, --simulate-seed <n>, \
                    or an `actuals` object in the input"
            .into());
    };

    let result = variance::track_budget(&budget_input.lines, provider.as_ref())?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let result = variance::classify_variance(args.budgeted, args.actual)?;
    Ok(serde_json::to_value(result)?)
}
