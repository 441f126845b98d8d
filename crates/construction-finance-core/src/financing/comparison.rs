use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ConstructionFinanceError;
use crate::financing::amortization::compute_amortization;
use crate::types::{percent_to_rate, with_metadata, ComputationOutput, Money, Percent};
use crate::ConstructionFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single financing offer, e.g. from one bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOffer {
    pub name: String,
    pub principal: Money,
    pub annual_rate_pct: Percent,
    pub term_months: u32,
    /// Arrangement fee as a percent of principal, paid up front
    #[serde(default)]
    pub upfront_fee_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparisonInput {
    pub offers: Vec<LoanOffer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOptionResult {
    pub name: String,
    /// 1 = cheapest
    pub rank: u32,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub upfront_fee: Money,
    /// Interest plus fees
    pub total_cost_of_credit: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparison {
    /// Sorted cheapest first
    pub options: Vec<LoanOptionResult>,
    pub cheapest: String,
    /// Cost of the most expensive offer minus the cheapest
    pub saving_vs_most_expensive: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Amortize each offer with the shared engine and rank by total cost of credit.
pub fn compare_loan_options(
    input: &LoanComparisonInput,
) -> ConstructionFinanceResult<ComputationOutput<LoanComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.offers.is_empty() {
        return Err(ConstructionFinanceError::InsufficientData(
            "At least one loan offer required".into(),
        ));
    }

    let mut options = Vec::with_capacity(input.offers.len());
    for offer in &input.offers {
        if offer.upfront_fee_pct < Decimal::ZERO {
            return Err(ConstructionFinanceError::invalid(
                format!("offer:{} upfront_fee_pct", offer.name),
                "Upfront fee cannot be negative",
            ));
        }
        let calc = compute_amortization(offer.principal, offer.annual_rate_pct, offer.term_months)
            .map_err(|e| match e {
                ConstructionFinanceError::InvalidInput { field, reason } => {
                    ConstructionFinanceError::InvalidInput {
                        field: format!("offer:{} {field}", offer.name),
                        reason,
                    }
                }
                other => other,
            })?;

        let upfront_fee = offer.principal * percent_to_rate(offer.upfront_fee_pct);
        options.push(LoanOptionResult {
            name: offer.name.clone(),
            rank: 0,
            monthly_payment: calc.monthly_payment,
            total_payment: calc.total_payment + upfront_fee,
            total_interest: calc.total_interest,
            upfront_fee,
            total_cost_of_credit: calc.total_interest + upfront_fee,
        });
    }

    let first_principal = input.offers[0].principal;
    if input.offers.iter().any(|o| o.principal != first_principal) {
        warnings.push(
            "Offers are for different principal amounts; ranking compares absolute cost".into(),
        );
    }

    options.sort_by(|a, b| a.total_cost_of_credit.cmp(&b.total_cost_of_credit));
    for (i, opt) in options.iter_mut().enumerate() {
        opt.rank = i as u32 + 1;
    }

    let cheapest = options[0].name.clone();
    let saving_vs_most_expensive = options[options.len() - 1].total_cost_of_credit
        - options[0].total_cost_of_credit;

    let output = LoanComparison {
        options,
        cheapest,
        saving_vs_most_expensive,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Loan offer comparison by total cost of credit",
        &serde_json::json!({ "offers": input.offers.len() }),
        warnings,
        elapsed,
        output,
    ))
}
