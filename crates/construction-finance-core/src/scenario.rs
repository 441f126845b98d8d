use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ConstructionFinanceError;
use crate::types::{Currency, Money};
use crate::ConstructionFinanceResult;

/// Tolerance before a stated total is reported as drifting from its components.
const TOTAL_DRIFT_TOLERANCE: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Residential,
    Commercial,
    MixedUse,
    Industrial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Economy,
    Standard,
    Premium,
    Luxury,
}

/// Descriptive facts about the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBasics {
    pub location: String,
    /// Gross floor area in square metres
    pub area: Decimal,
    pub building_type: BuildingType,
    pub quality_level: QualityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalSpecs {
    #[serde(default)]
    pub floors: u32,
    #[serde(default)]
    pub units: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructionCosts {
    pub materials: Money,
    pub labor: Money,
    pub equipment: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoftCosts {
    pub permits: Money,
    pub design: Money,
    pub consulting: Money,
}

/// Cost estimate for a scenario. `total` is carried as stated by the
/// estimator and is not recomputed from the components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub construction: ConstructionCosts,
    pub soft_costs: SoftCosts,
    pub site_specific: Money,
    pub contingency: Money,
    pub total: Money,
}

/// Root input entity shared by the dashboard calculators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectScenario {
    pub id: String,
    pub basics: ProjectBasics,
    #[serde(default)]
    pub technical_specs: TechnicalSpecs,
    pub cost_breakdown: CostBreakdown,
    #[serde(default)]
    pub currency: Currency,
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

impl CostBreakdown {
    /// Sum of every cost component, excluding the stated total.
    pub fn component_sum(&self) -> Money {
        self.construction.materials
            + self.construction.labor
            + self.construction.equipment
            + self.soft_costs.permits
            + self.soft_costs.design
            + self.soft_costs.consulting
            + self.site_specific
            + self.contingency
    }

    /// Stated total minus the component sum.
    pub fn drift(&self) -> Money {
        self.total - self.component_sum()
    }

    /// Push a warning when the stated total disagrees with its components.
    pub fn check_total(&self, warnings: &mut Vec<String>) {
        let drift = self.drift();
        if drift.abs() > TOTAL_DRIFT_TOLERANCE {
            warnings.push(format!(
                "Cost breakdown total ({}) differs from the sum of its components ({}) by {}",
                self.total,
                self.component_sum(),
                drift
            ));
        }
    }
}

impl ProjectScenario {
    pub fn validate(&self) -> ConstructionFinanceResult<()> {
        if self.basics.area <= Decimal::ZERO {
            return Err(ConstructionFinanceError::invalid(
                "basics.area",
                "Floor area must be positive",
            ));
        }
        if self.cost_breakdown.total < Decimal::ZERO {
            return Err(ConstructionFinanceError::invalid(
                "cost_breakdown.total",
                "Total cost cannot be negative",
            ));
        }
        if let (Some(start), Some(end)) = (self.basics.start_date, self.basics.completion_date) {
            if end < start {
                return Err(ConstructionFinanceError::invalid(
                    "basics.completion_date",
                    "Completion date precedes start date",
                ));
            }
        }
        Ok(())
    }
}
