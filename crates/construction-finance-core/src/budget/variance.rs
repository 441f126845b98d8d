use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::budget::actuals::{ActualsProvider, FixedActuals};
use crate::error::ConstructionFinanceError;
use crate::scenario::CostBreakdown;
use crate::types::{rate_to_percent, with_metadata, ComputationOutput, Money, Percent};
use crate::ConstructionFinanceResult;

/// Variance within ±5% of budget counts as on budget (inclusive).
const ON_BUDGET_BAND_PCT: Percent = dec!(5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetStatus {
    UnderBudget,
    OnBudget,
    OverBudget,
}

impl BudgetStatus {
    fn from_variance_pct(variance_pct: Percent) -> Self {
        if variance_pct.abs() <= ON_BUDGET_BAND_PCT {
            BudgetStatus::OnBudget
        } else if variance_pct < -ON_BUDGET_BAND_PCT {
            BudgetStatus::UnderBudget
        } else {
            BudgetStatus::OverBudget
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceClassification {
    /// actual - budgeted
    pub variance: Money,
    pub variance_pct: Percent,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    pub budgeted: Money,
}

impl BudgetLine {
    /// One line per cost component of an estimate.
    pub fn from_cost_breakdown(costs: &CostBreakdown) -> Vec<BudgetLine> {
        [
            ("materials", costs.construction.materials),
            ("labor", costs.construction.labor),
            ("equipment", costs.construction.equipment),
            ("permits", costs.soft_costs.permits),
            ("design", costs.soft_costs.design),
            ("consulting", costs.soft_costs.consulting),
            ("site_specific", costs.site_specific),
            ("contingency", costs.contingency),
        ]
        .into_iter()
        .map(|(category, budgeted)| BudgetLine {
            category: category.to_string(),
            budgeted,
        })
        .collect()
    }
}

/// File or binding input: budget lines plus recorded actuals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetInput {
    pub lines: Vec<BudgetLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuals: Option<FixedActuals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLineResult {
    pub category: String,
    pub budgeted: Money,
    pub actual: Money,
    pub variance: Money,
    /// None when nothing was budgeted
    pub variance_pct: Option<Percent>,
    pub status: Option<BudgetStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetTracking {
    pub lines: Vec<BudgetLineResult>,
    pub total_budgeted: Money,
    pub total_actual: Money,
    pub total_variance: Money,
    pub total_variance_pct: Option<Percent>,
    pub overall_status: Option<BudgetStatus>,
    pub under_budget_count: usize,
    pub on_budget_count: usize,
    pub over_budget_count: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Classify a single budget line into under / on / over budget.
pub fn classify_variance(
    budgeted: Money,
    actual: Money,
) -> ConstructionFinanceResult<VarianceClassification> {
    if budgeted < Decimal::ZERO {
        return Err(ConstructionFinanceError::invalid(
            "budgeted",
            "Budget cannot be negative",
        ));
    }
    if actual < Decimal::ZERO {
        return Err(ConstructionFinanceError::invalid(
            "actual",
            "Actual spend cannot be negative",
        ));
    }
    if budgeted.is_zero() {
        return Err(ConstructionFinanceError::NotApplicable {
            metric: "variance_pct".into(),
            reason: "nothing was budgeted".into(),
        });
    }

    let variance = actual - budgeted;
    let variance_pct = rate_to_percent(variance / budgeted);

    Ok(VarianceClassification {
        variance,
        variance_pct,
        status: BudgetStatus::from_variance_pct(variance_pct),
    })
}

/// Compare every budget line against actual spend from `actuals`.
pub fn track_budget(
    lines: &[BudgetLine],
    actuals: &dyn ActualsProvider,
) -> ConstructionFinanceResult<ComputationOutput<BudgetTracking>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if lines.is_empty() {
        return Err(ConstructionFinanceError::InsufficientData(
            "At least one budget line required".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(lines.len());

    for line in lines {
        if !seen.insert(line.category.as_str()) {
            warnings.push(format!("Duplicate budget category '{}'", line.category));
        }

        let actual = actuals.actual_for(&line.category, line.budgeted)?;
        let result = match classify_variance(line.budgeted, actual) {
            Ok(c) => BudgetLineResult {
                category: line.category.clone(),
                budgeted: line.budgeted,
                actual,
                variance: c.variance,
                variance_pct: Some(c.variance_pct),
                status: Some(c.status),
            },
            Err(ConstructionFinanceError::NotApplicable { .. }) => {
                warnings.push(format!(
                    "Category '{}' has no budget; variance percentage not applicable",
                    line.category
                ));
                BudgetLineResult {
                    category: line.category.clone(),
                    budgeted: line.budgeted,
                    actual,
                    variance: actual - line.budgeted,
                    variance_pct: None,
                    status: None,
                }
            }
            Err(ConstructionFinanceError::InvalidInput { field, reason }) => {
                return Err(ConstructionFinanceError::InvalidInput {
                    field: format!("{}.{field}", line.category),
                    reason,
                })
            }
            Err(e) => return Err(e),
        };
        results.push(result);
    }

    let total_budgeted: Money = results.iter().map(|r| r.budgeted).sum();
    let total_actual: Money = results.iter().map(|r| r.actual).sum();
    let total = classify_variance(total_budgeted, total_actual).ok();

    let count = |status: BudgetStatus| results.iter().filter(|r| r.status == Some(status)).count();
    let under_budget_count = count(BudgetStatus::UnderBudget);
    let on_budget_count = count(BudgetStatus::OnBudget);
    let over_budget_count = count(BudgetStatus::OverBudget);

    let output = BudgetTracking {
        total_budgeted,
        total_actual,
        total_variance: total_actual - total_budgeted,
        total_variance_pct: total.as_ref().map(|t| t.variance_pct),
        overall_status: total.as_ref().map(|t| t.status),
        under_budget_count,
        on_budget_count,
        over_budget_count,
        lines: results,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Budget vs actual tracking (±5% on-budget band)",
        &serde_json::json!({ "lines": lines.len() }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(category: &str, budgeted: Decimal) -> BudgetLine {
        BudgetLine {
            category: category.into(),
            budgeted,
        }
    }

    #[test]
    fn test_boundary_is_on_budget() {
        let c = classify_variance(dec!(1000), dec!(1050)).unwrap();
        assert_eq!(c.variance, dec!(50));
        assert_eq!(c.variance_pct, dec!(5));
        assert_eq!(c.status, BudgetStatus::OnBudget);
    }

    #[test]
    fn test_just_over_band() {
        let c = classify_variance(dec!(1000), dec!(1051)).unwrap();
        assert_eq!(c.status, BudgetStatus::OverBudget);
    }

    #[test]
    fn test_under_band() {
        assert_eq!(
            classify_variance(dec!(1000), dec!(950)).unwrap().status,
            BudgetStatus::OnBudget
        );
        assert_eq!(
            classify_variance(dec!(1000), dec!(949)).unwrap().status,
            BudgetStatus::UnderBudget
        );
    }

    #[test]
    fn test_zero_budget_not_applicable() {
        assert!(matches!(
            classify_variance(Decimal::ZERO, dec!(10)),
            Err(ConstructionFinanceError::NotApplicable { .. })
        ));
    }

    #[test]
    fn test_negative_actual_rejected() {
        assert!(matches!(
            classify_variance(dec!(10), dec!(-1)),
            Err(ConstructionFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&BudgetStatus::OnBudget).unwrap();
        assert_eq!(json, "\"on-budget\"");
    }

    #[test]
    fn test_track_budget_totals_and_counts() {
        let lines = vec![
            line("materials", dec!(1000)),
            line("labor", dec!(500)),
            line("equipment", dec!(200)),
        ];
        let actuals: FixedActuals = [
            ("materials".to_string(), dec!(1200)),
            ("labor".to_string(), dec!(500)),
            ("equipment".to_string(), dec!(150)),
        ]
        .into_iter()
        .collect();
        let out = track_budget(&lines, &actuals).unwrap().result;
        assert_eq!(out.total_budgeted, dec!(1700));
        assert_eq!(out.total_actual, dec!(1850));
        assert_eq!(out.total_variance, dec!(150));
        assert_eq!(out.over_budget_count, 1);
        assert_eq!(out.on_budget_count, 1);
        assert_eq!(out.under_budget_count, 1);
        assert_eq!(out.overall_status, Some(BudgetStatus::OverBudget));
        assert_eq!(out.lines[2].status, Some(BudgetStatus::UnderBudget));
    }

    #[test]
    fn test_zero_budget_line_is_kept_with_warning() {
        let lines = vec![line("permits", Decimal::ZERO), line("labor", dec!(100))];
        let actuals: FixedActuals = [
            ("permits".to_string(), dec!(20)),
            ("labor".to_string(), dec!(100)),
        ]
        .into_iter()
        .collect();
        let out = track_budget(&lines, &actuals).unwrap();
        assert_eq!(out.result.lines[0].status, None);
        assert_eq!(out.result.lines[0].variance, dec!(20));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_missing_actual_is_an_error() {
        let lines = vec![line("design", dec!(100))];
        assert!(track_budget(&lines, &FixedActuals::default()).is_err());
    }

    #[test]
    fn test_empty_lines_rejected() {
        assert!(track_budget(&[], &FixedActuals::default()).is_err());
    }

    #[test]
    fn test_lines_from_cost_breakdown() {
        let costs = CostBreakdown {
            site_specific: dec!(7),
            contingency: dec!(9),
            ..CostBreakdown::default()
        };
        let lines = BudgetLine::from_cost_breakdown(&costs);
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[6].category, "site_specific");
        assert_eq!(lines[7].budgeted, dec!(9));
    }
}
