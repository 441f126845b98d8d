use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ConstructionFinanceError;
use crate::scenario::ProjectScenario;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ConstructionFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGranularity {
    #[default]
    Monthly,
    Quarterly,
}

impl PeriodGranularity {
    fn months(self) -> u32 {
        match self {
            PeriodGranularity::Monthly => 1,
            PeriodGranularity::Quarterly => 3,
        }
    }
}

/// Allocation ratios used to lay the cost estimate out over time.
///
/// Shares are fractions of the scenario's total cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CashFlowPolicy {
    /// Construction months per square metre, numerator
    pub duration_area_factor: Decimal,
    /// Construction months per square metre, denominator
    pub duration_divisor: Decimal,
    pub equity_share: Rate,
    pub loan_share: Rate,
    /// Sales proceeds as a multiple of total cost
    pub sales_multiple: Decimal,
    /// Number of trailing periods over which sales are recognised
    pub sales_periods: u32,
    pub materials_share: Rate,
    pub labor_share: Rate,
    pub equipment_share: Rate,
}

impl Default for CashFlowPolicy {
    fn default() -> Self {
        CashFlowPolicy {
            duration_area_factor: dec!(0.8),
            duration_divisor: dec!(30),
            equity_share: dec!(0.30),
            loan_share: dec!(0.70),
            sales_multiple: dec!(1.20),
            sales_periods: 2,
            materials_share: dec!(0.55),
            labor_share: dec!(0.30),
            equipment_share: dec!(0.15),
        }
    }
}

/// Input envelope for file- or binding-driven projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowInput {
    pub scenario: ProjectScenario,
    #[serde(default)]
    pub granularity: PeriodGranularity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<CashFlowPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashInflows {
    pub equity: Money,
    pub loan: Money,
    pub sales: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashOutflows {
    pub materials: Money,
    pub labor: Money,
    pub equipment: Money,
    pub permits: Money,
    /// Design and consulting fees
    pub other: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowPeriod {
    /// 0-based period index
    pub period: u32,
    pub label: String,
    pub inflows: CashInflows,
    pub outflows: CashOutflows,
    pub net_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    /// Funding gap: max(0, -cumulative)
    pub minimum_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub duration_months: u32,
    pub total_inflow: Money,
    pub total_outflow: Money,
    pub net_position: Money,
    /// Largest funding gap over the projection
    pub peak_funding_requirement: Money,
    pub peak_funding_period: Option<u32>,
    /// First period back at a non-negative balance after any negative stretch
    pub recovery_period: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub granularity: PeriodGranularity,
    pub periods: Vec<CashFlowPeriod>,
    pub summary: CashFlowSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project construction cash flows with the default allocation policy.
pub fn project_cash_flow(
    scenario: &ProjectScenario,
    granularity: PeriodGranularity,
) -> ConstructionFinanceResult<ComputationOutput<CashFlowProjection>> {
    project_cash_flow_with_policy(scenario, granularity, &CashFlowPolicy::default())
}

/// Project construction cash flows period by period.
///
/// Equity and loan draw land in the first period, sales in the trailing
/// periods, and hard costs are spread evenly over the estimated duration.
pub fn project_cash_flow_with_policy(
    scenario: &ProjectScenario,
    granularity: PeriodGranularity,
    policy: &CashFlowPolicy,
) -> ConstructionFinanceResult<ComputationOutput<CashFlowProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    scenario.validate()?;
    validate_policy(policy)?;
    scenario.cost_breakdown.check_total(&mut warnings);

    let duration_months = estimate_duration_months(scenario.basics.area, policy)?;
    let period_count = duration_months.div_ceil(granularity.months());

    let total_cost = scenario.cost_breakdown.total;
    let soft = &scenario.cost_breakdown.soft_costs;
    let months = Decimal::from(duration_months);
    let scale = Decimal::from(granularity.months());

    let materials = total_cost * policy.materials_share / months * scale;
    let labor = total_cost * policy.labor_share / months * scale;
    let equipment = total_cost * policy.equipment_share / months * scale;
    let other = (soft.design + soft.consulting) / months * scale;

    let sales_periods = policy.sales_periods.min(period_count);
    let sales_per_period = total_cost * policy.sales_multiple / Decimal::from(sales_periods);
    let first_sales_period = period_count - sales_periods;

    let mut periods = Vec::with_capacity(period_count as usize);
    let mut cumulative = Decimal::ZERO;

    for i in 0..period_count {
        let mut inflows = CashInflows::default();
        if i == 0 {
            inflows.equity = total_cost * policy.equity_share;
            inflows.loan = total_cost * policy.loan_share;
        }
        if i >= first_sales_period {
            inflows.sales = sales_per_period;
        }
        inflows.total = inflows.equity + inflows.loan + inflows.sales;

        let permits = if i == 0 { soft.permits } else { Decimal::ZERO };
        let outflows = CashOutflows {
            materials,
            labor,
            equipment,
            permits,
            other,
            total: materials + labor + equipment + permits + other,
        };

        let net_cash_flow = inflows.total - outflows.total;
        cumulative += net_cash_flow;

        periods.push(CashFlowPeriod {
            period: i,
            label: period_label(granularity, i),
            inflows,
            outflows,
            net_cash_flow,
            cumulative_cash_flow: cumulative,
            minimum_balance: (-cumulative).max(Decimal::ZERO),
        });
    }

    let summary = summarize(&periods, duration_months);

    if summary.peak_funding_requirement > Decimal::ZERO {
        warnings.push(format!(
            "Financing needed: peak funding gap of {} in {}",
            summary.peak_funding_requirement.round_dp(2),
            summary
                .peak_funding_period
                .map(|p| period_label(granularity, p))
                .unwrap_or_default()
        ));
    }

    let output = CashFlowProjection {
        granularity,
        periods,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Construction cash-flow projection (area-based duration, even cost spread)",
        &serde_json::json!({
            "scenario": scenario.id,
            "granularity": granularity,
            "total_cost": total_cost.to_string(),
            "policy": policy,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Heuristic construction duration: ceil(area * factor / divisor), at least one month.
pub fn estimate_duration_months(
    area: Decimal,
    policy: &CashFlowPolicy,
) -> ConstructionFinanceResult<u32> {
    let months = (area * policy.duration_area_factor / policy.duration_divisor).ceil();
    let months = months.to_u32().ok_or_else(|| {
        ConstructionFinanceError::invalid("basics.area", "Area yields an unrepresentable duration")
    })?;
    Ok(months.max(1))
}

fn validate_policy(policy: &CashFlowPolicy) -> ConstructionFinanceResult<()> {
    if policy.duration_divisor <= Decimal::ZERO {
        return Err(ConstructionFinanceError::invalid(
            "policy.duration_divisor",
            "Must be positive",
        ));
    }
    if policy.duration_area_factor <= Decimal::ZERO {
        return Err(ConstructionFinanceError::invalid(
            "policy.duration_area_factor",
            "Must be positive",
        ));
    }
    if policy.sales_periods == 0 {
        return Err(ConstructionFinanceError::invalid(
            "policy.sales_periods",
            "At least one sales period required",
        ));
    }
    for (field, value) in [
        ("policy.equity_share", policy.equity_share),
        ("policy.loan_share", policy.loan_share),
        ("policy.sales_multiple", policy.sales_multiple),
        ("policy.materials_share", policy.materials_share),
        ("policy.labor_share", policy.labor_share),
        ("policy.equipment_share", policy.equipment_share),
    ] {
        if value < Decimal::ZERO {
            return Err(ConstructionFinanceError::invalid(field, "Cannot be negative"));
        }
    }
    Ok(())
}

fn period_label(granularity: PeriodGranularity, index: u32) -> String {
    match granularity {
        PeriodGranularity::Monthly => format!("Month {}", index + 1),
        PeriodGranularity::Quarterly => format!("Q{}", index + 1),
    }
}

fn summarize(periods: &[CashFlowPeriod], duration_months: u32) -> CashFlowSummary {
    let total_inflow: Money = periods.iter().map(|p| p.inflows.total).sum();
    let total_outflow: Money = periods.iter().map(|p| p.outflows.total).sum();

    let mut peak_funding_requirement = Decimal::ZERO;
    let mut peak_funding_period = None;
    for p in periods {
        if p.minimum_balance > peak_funding_requirement {
            peak_funding_requirement = p.minimum_balance;
            peak_funding_period = Some(p.period);
        }
    }

    let recovery_period = periods
        .iter()
        .scan(false, |was_negative, p| {
            let recovered = *was_negative && p.cumulative_cash_flow >= Decimal::ZERO;
            *was_negative |= p.cumulative_cash_flow < Decimal::ZERO;
            Some((p.period, recovered))
        })
        .find(|(_, recovered)| *recovered)
        .map(|(period, _)| period);

    CashFlowSummary {
        duration_months,
        total_inflow,
        total_outflow,
        net_position: total_inflow - total_outflow,
        peak_funding_requirement,
        peak_funding_period,
        recovery_period,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
