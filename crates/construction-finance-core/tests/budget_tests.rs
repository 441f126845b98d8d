use construction_finance_core::budget::actuals::{ActualsProvider, FixedActuals, SimulatedActuals};
use construction_finance_core::budget::variance::{
    classify_variance, track_budget, BudgetInput, BudgetLine, BudgetStatus,
};
use construction_finance_core::scenario::{ConstructionCosts, CostBreakdown, SoftCosts};
use construction_finance_core::{ConstructionFinanceResult, Money};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

/// Ledger stub that reports every category 10% over budget.
struct TenPercentOver;

impl ActualsProvider for TenPercentOver {
    fn actual_for(&self, _category: &str, budgeted: Money) -> ConstructionFinanceResult<Money> {
        Ok(budgeted * dec!(1.10))
    }
}

fn costs() -> CostBreakdown {
    CostBreakdown {
        construction: ConstructionCosts {
            materials: dec!(550000),
            labor: dec!(300000),
            equipment: dec!(150000),
        },
        soft_costs: SoftCosts {
            permits: dec!(20000),
            design: dec!(40000),
            consulting: dec!(10000),
        },
        site_specific: dec!(30000),
        contingency: dec!(50000),
        total: dec!(1150000),
    }
}

#[test]
fn test_variance_band_boundaries() {
    assert_eq!(
        classify_variance(dec!(1000), dec!(1050)).unwrap().status,
        BudgetStatus::OnBudget
    );
    assert_eq!(
        classify_variance(dec!(1000), dec!(1051)).unwrap().status,
        BudgetStatus::OverBudget
    );
}

#[test]
fn test_custom_provider_drives_tracking() {
    let lines = BudgetLine::from_cost_breakdown(&costs());
    let out = track_budget(&lines, &TenPercentOver).unwrap().result;
    assert_eq!(out.over_budget_count, 8);
    assert_eq!(out.total_budgeted, dec!(1150000));
    assert_eq!(out.total_variance_pct, Some(dec!(10)));
}

#[test]
fn test_budget_input_from_json() {
    let input: BudgetInput = serde_json::from_value(serde_json::json!({
        "lines": [
            { "category": "materials", "budgeted": "1000" },
            { "category": "labor", "budgeted": "400" }
        ],
        "actuals": { "materials": "1030", "labor": "470" }
    }))
    .unwrap();
    let actuals: FixedActuals = input.actuals.unwrap();
    let out = track_budget(&input.lines, &actuals).unwrap().result;
    assert_eq!(out.lines[0].status, Some(BudgetStatus::OnBudget));
    assert_eq!(out.lines[1].status, Some(BudgetStatus::OverBudget));
    assert_eq!(out.lines[1].variance_pct, Some(dec!(17.5)));
}

#[test]
fn test_simulated_actuals_are_reproducible() {
    let lines = BudgetLine::from_cost_breakdown(&costs());
    let a = track_budget(&lines, &SimulatedActuals::with_default_ranges(2024))
        .unwrap()
        .result;
    let b = track_budget(&lines, &SimulatedActuals::with_default_ranges(2024))
        .unwrap()
        .result;
    assert_eq!(a.total_actual, b.total_actual);
    assert_eq!(
        a.under_budget_count + a.on_budget_count + a.over_budget_count,
        8
    );
    // contingency spread is ±15%
    let contingency = &a.lines[7];
    assert!(contingency.actual >= dec!(42499.99) && contingency.actual <= dec!(57500.01));
}
