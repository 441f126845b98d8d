use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use construction_finance_core::investment::analysis::{self, InvestmentInput};

use crate::input;

/// Arguments for investment analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct InvestArgs {
    /// Initial investment (equity plus construction cost)
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Expected sale price at today's prices
    #[arg(long)]
    pub sale_price: Option<Decimal>,

    /// Annual rental income
    #[arg(long, default_value = "0")]
    pub rental_income: Decimal,

    /// Annual operating costs
    #[arg(long, default_value = "0")]
    pub operating_costs: Decimal,

    /// Discount rate in percent
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Holding period in years
    #[arg(long, default_value = "5")]
    pub years: u32,

    /// Annual appreciation in percent
    #[arg(long)]
    pub appreciation: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_invest(args: InvestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let from_file = args.input.is_some() || args.initial_investment.is_none();
    let inv_input: InvestmentInput = if from_file {
        input::read_input(args.input.as_deref(), "investment analysis")?
    } else {
        InvestmentInput {
            initial_investment: args
                .initial_investment
                .ok_or("--initial-investment is required (or provide --input)")?,
            projected_sale_price: args
                .sale_price
                .ok_or("--sale-price is required (or provide --input)")?,
            rental_income: args.rental_income,
            operating_costs: args.operating_costs,
            discount_rate_pct: args.discount_rate.unwrap_or(dec!(10)),
            holding_period_years: args.years,
            appreciation_rate_pct: args.appreciation.unwrap_or(Decimal::ZERO),
        }
    };

    let result = analysis::analyze_investment(&inv_input)?;
    Ok(serde_json::to_value(result)?)
}
