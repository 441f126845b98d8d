//! Property-based tests for invariants that must hold across all valid inputs.

use construction_finance_core::budget::variance::{classify_variance, BudgetStatus};
use construction_finance_core::cashflow::projection::{project_cash_flow, PeriodGranularity};
use construction_finance_core::financing::amortization::compute_amortization;
use construction_finance_core::scenario::{
    BuildingType, ConstructionCosts, CostBreakdown, ProjectBasics, ProjectScenario, QualityLevel,
    SoftCosts, TechnicalSpecs,
};
use construction_finance_core::time_value::npv;
use construction_finance_core::Currency;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Generators
// =============================================================================

/// Whole-currency principal between 0 and 50M.
fn arb_principal() -> impl Strategy<Value = Decimal> {
    (0i64..50_000_000).prop_map(Decimal::from)
}

/// Annual rate 0.00% to 60.00%, in hundredths.
fn arb_rate_pct() -> impl Strategy<Value = Decimal> {
    (0i64..6_000).prop_map(|bp| Decimal::new(bp, 2))
}

fn arb_granularity() -> impl Strategy<Value = PeriodGranularity> {
    prop_oneof![
        Just(PeriodGranularity::Monthly),
        Just(PeriodGranularity::Quarterly),
    ]
}

fn arb_scenario() -> impl Strategy<Value = ProjectScenario> {
    (1i64..5_000, 1i64..100_000_000, 0i64..1_000_000).prop_map(|(area, total, soft)| {
        let total = Decimal::from(total);
        let soft = Decimal::from(soft);
        ProjectScenario {
            id: "prop".into(),
            basics: ProjectBasics {
                location: "anywhere".into(),
                area: Decimal::from(area),
                building_type: BuildingType::MixedUse,
                quality_level: QualityLevel::Standard,
                start_date: None,
                completion_date: None,
            },
            technical_specs: TechnicalSpecs::default(),
            cost_breakdown: CostBreakdown {
                construction: ConstructionCosts::default(),
                soft_costs: SoftCosts {
                    permits: soft,
                    design: soft,
                    consulting: soft,
                },
                site_specific: Decimal::ZERO,
                contingency: Decimal::ZERO,
                total,
            },
            currency: Currency::TRY,
        }
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_amortization_closes_at_zero(
        principal in arb_principal(),
        rate in arb_rate_pct(),
        term in 1u32..=360,
    ) {
        let calc = compute_amortization(principal, rate, term).unwrap();
        prop_assert_eq!(calc.schedule.len(), term as usize);
        prop_assert_eq!(calc.schedule.last().unwrap().balance, Decimal::ZERO);
        prop_assert!(calc.schedule.iter().all(|p| p.balance >= Decimal::ZERO));
        let repaid: Decimal = calc.schedule.iter().map(|p| p.principal).sum();
        prop_assert!((repaid - principal).abs() < dec!(0.000001), "repaid {} of {}", repaid, principal);
    }

    #[test]
    fn prop_npv_decreases_with_discount_rate(
        flows in proptest::collection::vec(1i64..1_000_000, 1..20),
        r1 in 0i64..5_000,
        delta in 1i64..5_000,
    ) {
        let flows: Vec<Decimal> = std::iter::once(Decimal::from(-1_000_000i64))
            .chain(flows.into_iter().map(Decimal::from))
            .collect();
        let low = Decimal::new(r1, 4);
        let high = Decimal::new(r1 + delta, 4);
        prop_assert!(npv(low, &flows).unwrap() > npv(high, &flows).unwrap());
    }

    #[test]
    fn prop_cumulative_cash_flow_is_prefix_sum(
        scenario in arb_scenario(),
        granularity in arb_granularity(),
    ) {
        let out = project_cash_flow(&scenario, granularity).unwrap();
        let periods = &out.result.periods;
        prop_assert!(!periods.is_empty());
        prop_assert_eq!(periods[0].cumulative_cash_flow, periods[0].net_cash_flow);
        for i in 1..periods.len() {
            prop_assert_eq!(
                periods[i].cumulative_cash_flow,
                periods[i - 1].cumulative_cash_flow + periods[i].net_cash_flow
            );
            prop_assert!(periods[i].minimum_balance >= Decimal::ZERO);
        }
        let peak = periods.iter().map(|p| p.minimum_balance).max().unwrap_or_default();
        prop_assert_eq!(out.result.summary.peak_funding_requirement, peak);
    }

    #[test]
    fn prop_variance_status_matches_band(
        budgeted in 1i64..10_000_000,
        actual in 0i64..20_000_000,
    ) {
        let b = Decimal::from(budgeted);
        let a = Decimal::from(actual);
        let c = classify_variance(b, a).unwrap();
        let pct = (a - b) / b * dec!(100);
        let expected = if pct.abs() <= dec!(5) {
            BudgetStatus::OnBudget
        } else if pct < dec!(-5) {
            BudgetStatus::UnderBudget
        } else {
            BudgetStatus::OverBudget
        };
        prop_assert_eq!(c.status, expected);
    }
}
