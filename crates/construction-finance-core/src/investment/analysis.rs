use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ConstructionFinanceError;
use crate::time_value::{compound_factor, irr, npv};
use crate::types::{
    percent_to_rate, rate_to_percent, with_metadata, ComputationOutput, Money, Percent, Years,
};
use crate::ConstructionFinanceResult;

const IRR_GUESS: Decimal = dec!(0.10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a buy/build, hold, and sell investment case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentInput {
    /// Up-front equity plus construction cost
    pub initial_investment: Money,
    /// Expected sale price at today's prices
    pub projected_sale_price: Money,
    /// Annual rental income while held
    pub rental_income: Money,
    /// Annual operating costs while held
    pub operating_costs: Money,
    /// Discount rate in percent
    pub discount_rate_pct: Percent,
    pub holding_period_years: u32,
    /// Annual price appreciation in percent
    pub appreciation_rate_pct: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityCase {
    Optimistic,
    Realistic,
    Pessimistic,
}

impl SensitivityCase {
    /// (revenue multiplier, cost multiplier)
    fn multipliers(self) -> (Decimal, Decimal) {
        match self {
            SensitivityCase::Optimistic => (dec!(1.20), dec!(0.90)),
            SensitivityCase::Realistic => (Decimal::ONE, Decimal::ONE),
            SensitivityCase::Pessimistic => (dec!(0.85), dec!(1.15)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub case: SensitivityCase,
    pub revenue_adjustment_pct: Percent,
    pub cost_adjustment_pct: Percent,
    pub roi: Percent,
    pub npv: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAnalysis {
    pub initial_investment: Money,
    /// Sale price after compound appreciation over the holding period
    pub future_value: Money,
    /// Future value plus rent collected over the holding period
    pub projected_revenue: Money,
    /// Operating costs over the holding period
    pub operating_costs: Money,
    pub net_income: Money,
    /// Percent
    pub roi: Percent,
    /// Years; falls back to the holding period when rent never covers costs
    pub payback_period: Years,
    pub payback_is_fallback: bool,
    /// Solved internal rate of return in percent, None when undefined
    pub irr: Option<Percent>,
    /// Annualised total-return proxy in percent
    pub quick_irr_estimate: Option<Percent>,
    pub npv: Money,
    pub profitability_index: Decimal,
    /// Years of net rent needed to recover the investment
    pub break_even_point: Option<Years>,
    pub sensitivity: Vec<SensitivityRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn analyze_investment(
    input: &InvestmentInput,
) -> ConstructionFinanceResult<ComputationOutput<InvestmentAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let years = Decimal::from(input.holding_period_years);
    let initial = input.initial_investment;

    let base = project(input, Decimal::ONE, Decimal::ONE)?;
    let roi = base.roi(initial);

    // --- Payback and break-even ---
    let annual_net = input.rental_income - input.operating_costs;
    let break_even_point = if annual_net > Decimal::ZERO {
        Some(initial / annual_net)
    } else {
        warnings.push(
            "Annual rent does not exceed operating costs; break-even point is not applicable"
                .into(),
        );
        None
    };
    let (payback_period, payback_is_fallback) = match break_even_point {
        Some(p) => (p, false),
        None => {
            warnings.push("Payback period set to the holding period".into());
            (years, true)
        }
    };

    // --- IRR ---
    let irr_pct = match irr(&base.cash_flows, IRR_GUESS) {
        Ok(r) => Some(rate_to_percent(r)),
        Err(e) => {
            warnings.push(format!("IRR not available: {e}"));
            None
        }
    };

    let total_cash_flow = base.future_value + annual_net * years;
    let quick_irr_estimate = if total_cash_flow > Decimal::ZERO {
        (total_cash_flow / initial)
            .checked_powd(Decimal::ONE / years)
            .map(|g| rate_to_percent(g - Decimal::ONE))
    } else {
        None
    };
    if quick_irr_estimate.is_none() {
        warnings.push("Total cash flow is not positive; quick IRR estimate unavailable".into());
    }

    let profitability_index = (base.npv + initial) / initial;

    // --- Sensitivity ---
    let sensitivity = [
        SensitivityCase::Optimistic,
        SensitivityCase::Realistic,
        SensitivityCase::Pessimistic,
    ]
    .into_iter()
    .map(|case| -> ConstructionFinanceResult<SensitivityRow> {
        let (rev, cost) = case.multipliers();
        let p = project(input, rev, cost)?;
        Ok(SensitivityRow {
            case,
            revenue_adjustment_pct: rate_to_percent(rev - Decimal::ONE),
            cost_adjustment_pct: rate_to_percent(cost - Decimal::ONE),
            roi: p.roi(initial),
            npv: p.npv,
        })
    })
    .collect::<ConstructionFinanceResult<Vec<_>>>()?;

    if base.npv < Decimal::ZERO {
        warnings.push(format!(
            "NPV is negative at a {}% discount rate",
            input.discount_rate_pct
        ));
    }

    let output = InvestmentAnalysis {
        initial_investment: initial,
        future_value: base.future_value,
        projected_revenue: base.revenue,
        operating_costs: base.operating_costs,
        net_income: base.net_income,
        roi,
        payback_period,
        payback_is_fallback,
        irr: irr_pct,
        quick_irr_estimate,
        npv: base.npv,
        profitability_index,
        break_even_point,
        sensitivity,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Hold-and-sell investment analysis (annual discounting, compound appreciation)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

struct Projection {
    future_value: Money,
    revenue: Money,
    operating_costs: Money,
    net_income: Money,
    cash_flows: Vec<Money>,
    npv: Money,
}

impl Projection {
    fn roi(&self, initial: Money) -> Percent {
        rate_to_percent(self.net_income / initial)
    }
}

/// Project revenue, net income and discounted value with revenue and cost
/// scaled by the given multipliers.
fn project(
    input: &InvestmentInput,
    revenue_mult: Decimal,
    cost_mult: Decimal,
) -> ConstructionFinanceResult<Projection> {
    let years = Decimal::from(input.holding_period_years);
    let sale = input.projected_sale_price * revenue_mult;
    let rent = input.rental_income * revenue_mult;
    let opex = input.operating_costs * cost_mult;

    let growth = compound_factor(
        percent_to_rate(input.appreciation_rate_pct),
        input.holding_period_years,
    )?;
    let future_value = sale.checked_mul(growth).ok_or_else(|| {
        ConstructionFinanceError::invalid(
            "appreciation_rate_pct",
            "rate/term combination overflows decimal range",
        )
    })?;
    let revenue = future_value + rent * years;
    let operating_costs = opex * years;
    let net_income = revenue - input.initial_investment - operating_costs;

    let mut cash_flows = Vec::with_capacity(input.holding_period_years as usize + 1);
    cash_flows.push(-input.initial_investment);
    for year in 1..=input.holding_period_years {
        let mut cf = rent - opex;
        if year == input.holding_period_years {
            cf += future_value;
        }
        cash_flows.push(cf);
    }

    let npv = npv(percent_to_rate(input.discount_rate_pct), &cash_flows)?;

    Ok(Projection {
        future_value,
        revenue,
        operating_costs,
        net_income,
        cash_flows,
        npv,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &InvestmentInput) -> ConstructionFinanceResult<()> {
    if input.initial_investment <= Decimal::ZERO {
        return Err(ConstructionFinanceError::invalid(
            "initial_investment",
            "Initial investment must be positive",
        ));
    }
    if input.holding_period_years < 1 {
        return Err(ConstructionFinanceError::invalid(
            "holding_period_years",
            "Holding period must be at least 1 year",
        ));
    }
    for (field, value) in [
        ("projected_sale_price", input.projected_sale_price),
        ("rental_income", input.rental_income),
        ("operating_costs", input.operating_costs),
    ] {
        if value < Decimal::ZERO {
            return Err(ConstructionFinanceError::invalid(field, "Cannot be negative"));
        }
    }
    if input.discount_rate_pct <= dec!(-100) {
        return Err(ConstructionFinanceError::invalid(
            "discount_rate_pct",
            "Discount rate must be greater than -100%",
        ));
    }
    if input.appreciation_rate_pct <= dec!(-100) {
        return Err(ConstructionFinanceError::invalid(
            "appreciation_rate_pct",
            "Appreciation rate must be greater than -100%",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> InvestmentInput {
        InvestmentInput {
            initial_investment: dec!(1000000),
            projected_sale_price: dec!(1200000),
            rental_income: dec!(60000),
            operating_costs: dec!(10000),
            discount_rate_pct: dec!(10),
            holding_period_years: 5,
            appreciation_rate_pct: Decimal::ZERO,
        }
    }

    #[test]
    fn test_revenue_and_net_income() {
        let out = analyze_investment(&sample_input()).unwrap().result;
        // revenue = 1.2M + 60k * 5 = 1.5M
        assert_eq!(out.projected_revenue, dec!(1500000));
        assert_eq!(out.operating_costs, dec!(50000));
        // net = 1.5M - 1M - 50k
        assert_eq!(out.net_income, dec!(450000));
        assert_eq!(out.roi, dec!(45));
    }

    #[test]
    fn test_compound_appreciation() {
        let mut input = sample_input();
        input.appreciation_rate_pct = dec!(10);
        input.holding_period_years = 2;
        let out = analyze_investment(&input).unwrap().result;
        assert_eq!(out.future_value, dec!(1452000));
    }

    #[test]
    fn test_payback_and_break_even() {
        let out = analyze_investment(&sample_input()).unwrap().result;
        // 1M / 50k
        assert_eq!(out.payback_period, dec!(20));
        assert!(!out.payback_is_fallback);
        assert_eq!(out.break_even_point, Some(dec!(20)));
    }

    #[test]
    fn test_break_even_not_applicable_when_costs_exceed_rent() {
        let mut input = sample_input();
        input.operating_costs = dec!(60000);
        let out = analyze_investment(&input).unwrap();
        assert_eq!(out.result.break_even_point, None);
        assert!(out.result.payback_is_fallback);
        assert_eq!(out.result.payback_period, dec!(5));
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_npv_matches_manual_discounting() {
        let out = analyze_investment(&sample_input()).unwrap().result;
        let flows = [
            dec!(-1000000),
            dec!(50000),
            dec!(50000),
            dec!(50000),
            dec!(50000),
            dec!(1250000),
        ];
        let expected = npv(dec!(0.10), &flows).unwrap();
        assert_eq!(out.npv, expected);
        assert_eq!(
            out.profitability_index,
            (expected + dec!(1000000)) / dec!(1000000)
        );
    }

    #[test]
    fn test_irr_discounts_to_zero() {
        let out = analyze_investment(&sample_input()).unwrap().result;
        let irr_pct = out.irr.unwrap();
        let mut input = sample_input();
        input.discount_rate_pct = irr_pct;
        let at_irr = analyze_investment(&input).unwrap().result;
        assert!(at_irr.npv.abs() < dec!(0.01));
    }

    #[test]
    fn test_quick_irr_estimate() {
        let out = analyze_investment(&sample_input()).unwrap().result;
        // (1.45M / 1M)^(1/5) - 1 ≈ 7.713%
        let q = out.quick_irr_estimate.unwrap();
        assert!((q - dec!(7.713)).abs() < dec!(0.01));
    }

    #[test]
    fn test_sensitivity_ordering() {
        let out = analyze_investment(&sample_input()).unwrap().result;
        assert_eq!(out.sensitivity.len(), 3);
        let opt = &out.sensitivity[0];
        let real = &out.sensitivity[1];
        let pess = &out.sensitivity[2];
        assert_eq!(opt.case, SensitivityCase::Optimistic);
        assert_eq!(opt.revenue_adjustment_pct, dec!(20));
        assert_eq!(pess.cost_adjustment_pct, dec!(15));
        assert_eq!(real.npv, out.npv);
        assert_eq!(real.roi, out.roi);
        assert!(opt.npv > real.npv && real.npv > pess.npv);
        assert!(opt.roi > real.roi && real.roi > pess.roi);
    }

    #[test]
    fn test_pessimistic_roi_value() {
        let out = analyze_investment(&sample_input()).unwrap().result;
        // revenue 1.5M * 0.85 = 1.275M, costs 50k * 1.15 = 57.5k
        // net = 1.275M - 1M - 57.5k = 217.5k => 21.75%
        assert_eq!(out.sensitivity[2].roi, dec!(21.75));
    }

    #[test]
    fn test_rejects_zero_investment() {
        let mut input = sample_input();
        input.initial_investment = Decimal::ZERO;
        assert!(analyze_investment(&input).is_err());
    }

    #[test]
    fn test_rejects_zero_holding_period() {
        let mut input = sample_input();
        input.holding_period_years = 0;
        assert!(analyze_investment(&input).is_err());
    }

    #[test]
    fn test_total_loss_has_no_quick_irr() {
        let mut input = sample_input();
        input.projected_sale_price = Decimal::ZERO;
        input.rental_income = Decimal::ZERO;
        let out = analyze_investment(&input).unwrap();
        assert_eq!(out.result.quick_irr_estimate, None);
        assert_eq!(out.result.irr, None);
    }
}
