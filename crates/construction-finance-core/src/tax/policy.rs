use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ConstructionFinanceError;
use crate::types::{Rate, Years};
use crate::ConstructionFinanceResult;

/// Gains-tax rate applying from a minimum holding period upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPeriodBracket {
    pub min_holding_years: Years,
    pub rate: Rate,
}

/// Property transaction tax rules for one jurisdiction and tax year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxPolicy {
    /// ISO country code, e.g. "TR"
    pub jurisdiction: String,
    pub year: i32,
    /// VAT on construction value; land is never subject to VAT
    pub vat_rate: Rate,
    /// Residential first homes are VAT exempt
    pub first_home_vat_exempt: bool,
    /// Title-deed transfer fee on land plus construction value
    pub transfer_fee_rate: Rate,
    pub property_tax_rate_residential: Rate,
    pub property_tax_rate_commercial: Rate,
    /// Corporate income tax on gains from commercial property
    pub corporate_gains_rate: Rate,
    /// Personal income tax on residential gains, by holding period
    pub personal_gains_brackets: Vec<HoldingPeriodBracket>,
}

impl TaxPolicy {
    /// Turkish rules as of 2024: 18% KDV, 4% tapu harcı, 0.1%/0.2% emlak
    /// vergisi, 25% kurumlar vergisi, and personal gains tax exempt after
    /// five years of ownership.
    pub fn turkey_2024() -> Self {
        TaxPolicy {
            jurisdiction: "TR".into(),
            year: 2024,
            vat_rate: dec!(0.18),
            first_home_vat_exempt: true,
            transfer_fee_rate: dec!(0.04),
            property_tax_rate_residential: dec!(0.001),
            property_tax_rate_commercial: dec!(0.002),
            corporate_gains_rate: dec!(0.25),
            personal_gains_brackets: vec![
                HoldingPeriodBracket {
                    min_holding_years: dec!(0),
                    rate: dec!(0.20),
                },
                HoldingPeriodBracket {
                    min_holding_years: dec!(2),
                    rate: dec!(0.15),
                },
                HoldingPeriodBracket {
                    min_holding_years: dec!(5),
                    rate: dec!(0),
                },
            ],
        }
    }

    /// Look up a built-in policy table.
    pub fn builtin(jurisdiction: &str, year: i32) -> ConstructionFinanceResult<Self> {
        match (jurisdiction.to_ascii_uppercase().as_str(), year) {
            ("TR", 2024) => Ok(Self::turkey_2024()),
            _ => Err(ConstructionFinanceError::InvalidInput {
                field: "jurisdiction".into(),
                reason: format!("No built-in tax policy for {jurisdiction}/{year}"),
            }),
        }
    }

    pub fn validate(&self) -> ConstructionFinanceResult<()> {
        let rates = [
            ("vat_rate", self.vat_rate),
            ("transfer_fee_rate", self.transfer_fee_rate),
            ("property_tax_rate_residential", self.property_tax_rate_residential),
            ("property_tax_rate_commercial", self.property_tax_rate_commercial),
            ("corporate_gains_rate", self.corporate_gains_rate),
        ];
        for (field, rate) in rates {
            check_rate(field, rate)?;
        }

        if self.personal_gains_brackets.is_empty() {
            return Err(ConstructionFinanceError::ConfigError(
                "personal_gains_brackets must not be empty".into(),
            ));
        }
        if !self
            .personal_gains_brackets
            .iter()
            .any(|b| b.min_holding_years.is_zero())
        {
            return Err(ConstructionFinanceError::ConfigError(
                "personal_gains_brackets must include a bracket starting at 0 years".into(),
            ));
        }
        for (i, b) in self.personal_gains_brackets.iter().enumerate() {
            if b.min_holding_years < Decimal::ZERO {
                return Err(ConstructionFinanceError::ConfigError(format!(
                    "personal_gains_brackets[{i}].min_holding_years cannot be negative"
                )));
            }
            check_rate(&format!("personal_gains_brackets[{i}].rate"), b.rate)?;
        }
        Ok(())
    }

    /// Personal gains rate for the longest bracket the holding period reaches.
    pub fn personal_gains_rate(&self, holding_period_years: Years) -> Rate {
        self.personal_gains_brackets
            .iter()
            .filter(|b| holding_period_years >= b.min_holding_years)
            .max_by(|a, b| a.min_holding_years.cmp(&b.min_holding_years))
            .map(|b| b.rate)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn property_tax_rate(&self, is_commercial: bool) -> Rate {
        if is_commercial {
            self.property_tax_rate_commercial
        } else {
            self.property_tax_rate_residential
        }
    }
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self::turkey_2024()
    }
}

fn check_rate(field: &str, rate: Rate) -> ConstructionFinanceResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ConstructionFinanceError::ConfigError(format!(
            "{field} must be between 0 and 1 (got {rate})"
        )));
    }
    Ok(())
}
