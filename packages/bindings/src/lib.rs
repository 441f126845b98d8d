use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use construction_finance_core::budget::actuals::SimulatedActuals;
use construction_finance_core::budget::variance::{self, BudgetInput};
use construction_finance_core::cashflow::projection::{self, CashFlowInput};
use construction_finance_core::financing::{amortization, comparison};
use construction_finance_core::investment::analysis;
use construction_finance_core::tax::estimator::{self, TaxInput};
use construction_finance_core::tax::policy::TaxPolicy;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_amortization(input_json: String) -> NapiResult<String> {
    let input: amortization::LoanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_loan_options(input_json: String) -> NapiResult<String> {
    let input: comparison::LoanComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare_loan_options(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    let input: analysis::InvestmentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = analysis::analyze_investment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Cash flow
// ---------------------------------------------------------------------------

#[napi]
pub fn project_cash_flow(input_json: String) -> NapiResult<String> {
    let input: CashFlowInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = input.policy.clone().unwrap_or_default();
    let output =
        projection::project_cash_flow_with_policy(&input.scenario, input.granularity, &policy)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TaxRequest {
    #[serde(flatten)]
    input: TaxInput,
    /// Explicit policy; the built-in Turkish 2024 policy otherwise
    #[serde(default)]
    policy: Option<TaxPolicy>,
}

#[napi]
pub fn estimate_taxes(input_json: String) -> NapiResult<String> {
    let request: TaxRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = request.policy.unwrap_or_default();
    let output = estimator::estimate_taxes(&request.input, &policy).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

#[napi]
pub fn classify_variance(budgeted: String, actual: String) -> NapiResult<String> {
    let budgeted: Decimal = budgeted.parse().map_err(to_napi_error)?;
    let actual: Decimal = actual.parse().map_err(to_napi_error)?;
    let output = variance::classify_variance(budgeted, actual).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn track_budget(input_json: String) -> NapiResult<String> {
    let input: BudgetInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let actuals = input.actuals.as_ref().ok_or_else(|| {
        to_napi_error("`actuals` is required; use simulateBudget for simulated spend")
    })?;
    let output = variance::track_budget(&input.lines, actuals).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_budget(input_json: String, seed: u32) -> NapiResult<String> {
    let input: BudgetInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let actuals = SimulatedActuals::with_default_ranges(u64::from(seed));
    let output = variance::track_budget(&input.lines, &actuals).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
