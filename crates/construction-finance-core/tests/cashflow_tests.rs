use construction_finance_core::cashflow::projection::{
    project_cash_flow, project_cash_flow_with_policy, CashFlowInput, CashFlowPolicy,
    PeriodGranularity,
};
use construction_finance_core::scenario::ProjectScenario;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn scenario_json() -> serde_json::Value {
    serde_json::json!({
        "id": "villa-12",
        "basics": {
            "location": "Antalya",
            "area": "450",
            "building_type": "residential",
            "quality_level": "luxury",
            "start_date": "2025-04-01",
            "completion_date": "2026-01-15"
        },
        "technical_specs": { "floors": 3, "units": 1, "structure_type": "reinforced concrete" },
        "cost_breakdown": {
            "construction": { "materials": "2400000", "labor": "1300000", "equipment": "450000" },
            "soft_costs": { "permits": "90000", "design": "180000", "consulting": "40000" },
            "site_specific": "140000",
            "contingency": "400000",
            "total": "5000000"
        }
    })
}

#[test]
fn test_projection_from_json_scenario() {
    let scenario: ProjectScenario = serde_json::from_value(scenario_json()).unwrap();
    let out = project_cash_flow(&scenario, PeriodGranularity::Monthly).unwrap();
    // 450 * 0.8 / 30 = 12 months
    assert_eq!(out.result.summary.duration_months, 12);
    assert_eq!(out.result.periods.len(), 12);
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
}

#[test]
fn test_quarterly_projection_is_consistent() {
    let scenario: ProjectScenario = serde_json::from_value(scenario_json()).unwrap();
    let out = project_cash_flow(&scenario, PeriodGranularity::Quarterly).unwrap();
    let periods = &out.result.periods;
    assert_eq!(periods.len(), 4);

    let mut running = Decimal::ZERO;
    for p in periods {
        running += p.net_cash_flow;
        assert_eq!(p.cumulative_cash_flow, running);
        assert_eq!(p.net_cash_flow, p.inflows.total - p.outflows.total);
        assert_eq!(p.minimum_balance, (-running).max(Decimal::ZERO));
    }
    // sales: 6M over the last two quarters
    assert_eq!(periods[2].inflows.sales, dec!(3000000));
    assert_eq!(periods[3].inflows.sales, dec!(3000000));
}

#[test]
fn test_input_envelope_with_policy_override() {
    let input: CashFlowInput = serde_json::from_value(serde_json::json!({
        "scenario": scenario_json(),
        "granularity": "quarterly",
        "policy": { "sales_periods": 1, "equity_share": "0.1", "loan_share": "0.2" }
    }))
    .unwrap();
    let policy = input.policy.clone().unwrap();
    // unspecified fields keep their defaults
    assert_eq!(policy.materials_share, CashFlowPolicy::default().materials_share);

    let out = project_cash_flow_with_policy(&input.scenario, input.granularity, &policy).unwrap();
    let periods = &out.result.periods;
    assert_eq!(periods[3].inflows.sales, dec!(6000000));
    assert_eq!(periods[2].inflows.sales, Decimal::ZERO);
    assert!(out.result.summary.peak_funding_requirement > Decimal::ZERO);
    assert_eq!(out.result.summary.recovery_period, Some(3));
}
