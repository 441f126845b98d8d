use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ConstructionFinanceError;
use crate::tax::policy::TaxPolicy;
use crate::types::{rate_to_percent, with_metadata, ComputationOutput, Money, Percent, Years};
use crate::ConstructionFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxInput {
    pub land_value: Money,
    pub construction_value: Money,
    pub sale_price: Money,
    #[serde(default)]
    pub is_first_home: bool,
    #[serde(default)]
    pub is_commercial: bool,
    pub holding_period_years: Years,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCalculation {
    pub jurisdiction: String,
    pub land_value: Money,
    pub construction_value: Money,
    /// Land plus construction: the cost basis
    pub total_value: Money,
    pub vat: Money,
    pub transfer_fees: Money,
    /// Annual-equivalent figure, not apportioned over the holding period
    pub property_tax: Money,
    /// Personal income tax on residential gains
    pub personal_gains_tax: Money,
    /// Corporate tax on commercial gains
    pub corporate_tax: Money,
    pub capital_gain: Money,
    pub total_taxes: Money,
    pub net_profit: Money,
    /// Total taxes over sale price, in percent
    pub effective_tax_rate: Option<Percent>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimate the taxes due on building and selling a property under `policy`.
pub fn estimate_taxes(
    input: &TaxInput,
    policy: &TaxPolicy,
) -> ConstructionFinanceResult<ComputationOutput<TaxCalculation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;
    policy.validate()?;

    let total_value = input.land_value + input.construction_value;

    // --- VAT (construction only) ---
    let vat_exempt =
        policy.first_home_vat_exempt && input.is_first_home && !input.is_commercial;
    let vat = if vat_exempt {
        Decimal::ZERO
    } else {
        input.construction_value * policy.vat_rate
    };
    if input.is_first_home && input.is_commercial {
        warnings.push("First-home VAT exemption does not apply to commercial property".into());
    }

    let transfer_fees = total_value * policy.transfer_fee_rate;
    let property_tax = total_value * policy.property_tax_rate(input.is_commercial);

    // --- Gains ---
    let capital_gain = input.sale_price - total_value;
    let (personal_gains_tax, corporate_tax) = if capital_gain <= Decimal::ZERO {
        warnings.push("Sale price does not exceed cost basis; no gains tax due".into());
        (Decimal::ZERO, Decimal::ZERO)
    } else if input.is_commercial {
        (Decimal::ZERO, capital_gain * policy.corporate_gains_rate)
    } else {
        let rate = policy.personal_gains_rate(input.holding_period_years);
        if rate.is_zero() {
            warnings.push(format!(
                "Residential gain exempt after {} years of ownership",
                input.holding_period_years
            ));
        }
        (capital_gain * rate, Decimal::ZERO)
    };

    let total_taxes = vat + transfer_fees + property_tax + personal_gains_tax + corporate_tax;
    let net_profit = input.sale_price - total_value - total_taxes;
    let effective_tax_rate = if input.sale_price.is_zero() {
        None
    } else {
        Some(rate_to_percent(total_taxes / input.sale_price))
    };

    let output = TaxCalculation {
        jurisdiction: policy.jurisdiction.clone(),
        land_value: input.land_value,
        construction_value: input.construction_value,
        total_value,
        vat,
        transfer_fees,
        property_tax,
        personal_gains_tax,
        corporate_tax,
        capital_gain,
        total_taxes,
        net_profit,
        effective_tax_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        &format!(
            "Property transaction tax estimate ({} {})",
            policy.jurisdiction, policy.year
        ),
        &serde_json::json!({
            "input": input,
            "policy": policy,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &TaxInput) -> ConstructionFinanceResult<()> {
    for (field, value) in [
        ("land_value", input.land_value),
        ("construction_value", input.construction_value),
        ("sale_price", input.sale_price),
        ("holding_period_years", input.holding_period_years),
    ] {
        if value < Decimal::ZERO {
            return Err(ConstructionFinanceError::InvalidInput {
                field: field.into(),
                reason: "Cannot be negative".into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(first_home: bool, commercial: bool, holding: Decimal) -> TaxInput {
        TaxInput {
            land_value: dec!(2000000),
            construction_value: dec!(3000000),
            sale_price: dec!(7000000),
            is_first_home: first_home,
            is_commercial: commercial,
            holding_period_years: holding,
        }
    }

    fn run(input: &TaxInput) -> TaxCalculation {
        estimate_taxes(input, &TaxPolicy::turkey_2024()).unwrap().result
    }

    #[test]
    fn test_first_home_vat_exempt() {
        let t = run(&input(true, false, dec!(1)));
        assert_eq!(t.vat, Decimal::ZERO);
    }

    #[test]
    fn test_vat_on_construction_only() {
        let t = run(&input(false, false, dec!(1)));
        assert_eq!(t.vat, dec!(540000));
    }

    #[test]
    fn test_commercial_first_home_still_pays_vat() {
        let out = estimate_taxes(&input(true, true, dec!(1)), &TaxPolicy::turkey_2024()).unwrap();
        assert_eq!(out.result.vat, dec!(540000));
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_fees_and_property_tax() {
        let t = run(&input(false, false, dec!(1)));
        assert_eq!(t.transfer_fees, dec!(200000));
        assert_eq!(t.property_tax, dec!(5000));
        let c = run(&input(false, true, dec!(1)));
        assert_eq!(c.property_tax, dec!(10000));
    }

    #[test]
    fn test_gains_brackets() {
        // gain = 7M - 5M = 2M
        assert_eq!(run(&input(false, false, dec!(5))).personal_gains_tax, Decimal::ZERO);
        assert_eq!(run(&input(false, false, dec!(4))).personal_gains_tax, dec!(300000));
        assert_eq!(run(&input(false, false, dec!(1))).personal_gains_tax, dec!(400000));
    }

    #[test]
    fn test_commercial_corporate_tax() {
        let t = run(&input(false, true, dec!(10)));
        assert_eq!(t.corporate_tax, dec!(500000));
        assert_eq!(t.personal_gains_tax, Decimal::ZERO);
    }

    #[test]
    fn test_no_gain_no_gains_tax() {
        let mut i = input(false, false, dec!(1));
        i.sale_price = dec!(4000000);
        let t = run(&i);
        assert_eq!(t.capital_gain, dec!(-1000000));
        assert_eq!(t.personal_gains_tax, Decimal::ZERO);
        assert_eq!(t.corporate_tax, Decimal::ZERO);
    }

    #[test]
    fn test_totals_and_net_profit() {
        let t = run(&input(false, false, dec!(1)));
        // 540k + 200k + 5k + 400k
        assert_eq!(t.total_taxes, dec!(1145000));
        assert_eq!(t.net_profit, dec!(855000));
        assert_eq!(t.effective_tax_rate, Some(dec!(1145000) / dec!(7000000) * dec!(100)));
    }

    #[test]
    fn test_zero_sale_price_has_no_effective_rate() {
        let mut i = input(false, false, dec!(1));
        i.sale_price = Decimal::ZERO;
        assert_eq!(run(&i).effective_tax_rate, None);
    }

    #[test]
    fn test_rejects_negative_values() {
        let mut i = input(false, false, dec!(1));
        i.land_value = dec!(-1);
        assert!(estimate_taxes(&i, &TaxPolicy::turkey_2024()).is_err());
    }

    #[test]
    fn test_custom_policy_applies() {
        let mut policy = TaxPolicy::turkey_2024();
        policy.vat_rate = dec!(0.20);
        policy.first_home_vat_exempt = false;
        let t = estimate_taxes(&input(true, false, dec!(1)), &policy).unwrap().result;
        assert_eq!(t.vat, dec!(600000));
    }
}
