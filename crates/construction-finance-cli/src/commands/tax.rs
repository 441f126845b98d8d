use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use construction_finance_core::tax::estimator::{self, TaxInput};
use construction_finance_core::tax::policy::TaxPolicy;

use crate::input;

/// Arguments for tax estimation
#[derive(Args)]
pub struct TaxArgs {
    /// Land value
    #[arg(long)]
    pub land: Option<Decimal>,

    /// Construction value
    #[arg(long)]
    pub construction: Option<Decimal>,

    /// Sale price
    #[arg(long)]
    pub sale: Option<Decimal>,

    /// Buyer's first home (VAT exempt where the policy allows)
    #[arg(long)]
    pub first_home: bool,

    /// Commercial property
    #[arg(long)]
    pub commercial: bool,

    /// Holding period in years
    #[arg(long, default_value = "0")]
    pub holding_years: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a tax policy file (JSON or YAML); overrides --jurisdiction
    #[arg(long)]
    pub policy: Option<String>,

    /// Built-in jurisdiction code
    #[arg(long, default_value = "TR")]
    pub jurisdiction: String,

    /// Built-in policy year
    #[arg(long, default_value = "2024")]
    pub year: i32,
}

pub fn run_tax(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let policy: TaxPolicy = match args.policy.as_deref() {
        Some(path) => input::file::read_config(path)?,
        None => TaxPolicy::builtin(&args.jurisdiction, args.year)?,
    };

    let tax_input: TaxInput = if args.input.is_some() || args.land.is_none() {
        input::read_input(args.input.as_deref(), "tax estimation")?
    } else {
        TaxInput {
            land_value: args.land.ok_or("--land is required (or provide --input)")?,
            construction_value: args
                .construction
                .ok_or("--construction is required (or provide --input)")?,
            sale_price: args.sale.ok_or("--sale is required (or provide --input)")?,
            is_first_home: args.first_home,
            is_commercial: args.commercial,
            holding_period_years: args.holding_years,
        }
    };

    let result = estimator::estimate_taxes(&tax_input, &policy)?;
    Ok(serde_json::to_value(result)?)
}
