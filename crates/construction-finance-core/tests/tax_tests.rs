use construction_finance_core::tax::estimator::{estimate_taxes, TaxInput};
use construction_finance_core::tax::policy::{HoldingPeriodBracket, TaxPolicy};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn residential(holding: Decimal, first_home: bool) -> TaxInput {
    TaxInput {
        land_value: dec!(1500000),
        construction_value: dec!(2500000),
        sale_price: dec!(5000000),
        is_first_home: first_home,
        is_commercial: false,
        holding_period_years: holding,
    }
}

#[test]
fn test_first_home_exemption_boundary() {
    let policy = TaxPolicy::turkey_2024();
    let exempt = estimate_taxes(&residential(dec!(1), true), &policy).unwrap().result;
    assert_eq!(exempt.vat, Decimal::ZERO);
    let taxed = estimate_taxes(&residential(dec!(1), false), &policy).unwrap().result;
    assert_eq!(taxed.vat, dec!(2500000) * dec!(0.18));
}

#[test]
fn test_five_year_exemption() {
    let policy = TaxPolicy::turkey_2024();
    let gain = dec!(1000000);
    let tax = |years| {
        estimate_taxes(&residential(years, false), &policy)
            .unwrap()
            .result
            .personal_gains_tax
    };
    assert_eq!(tax(dec!(5)), Decimal::ZERO);
    assert_eq!(tax(dec!(4)), gain * dec!(0.15));
    assert_eq!(tax(dec!(2)), gain * dec!(0.15));
    assert_eq!(tax(dec!(1)), gain * dec!(0.20));
}

#[test]
fn test_policy_loaded_from_json() {
    let policy: TaxPolicy = serde_json::from_value(serde_json::json!({
        "jurisdiction": "XX",
        "year": 2025,
        "vat_rate": "0.10",
        "first_home_vat_exempt": false,
        "transfer_fee_rate": "0.02",
        "property_tax_rate_residential": "0.005",
        "property_tax_rate_commercial": "0.01",
        "corporate_gains_rate": "0.30",
        "personal_gains_brackets": [
            { "min_holding_years": "0", "rate": "0.25" },
            { "min_holding_years": "10", "rate": "0" }
        ]
    }))
    .unwrap();
    assert_eq!(
        policy.personal_gains_brackets[1],
        HoldingPeriodBracket {
            min_holding_years: dec!(10),
            rate: dec!(0)
        }
    );

    let out = estimate_taxes(&residential(dec!(5), true), &policy).unwrap();
    let t = out.result;
    assert_eq!(t.jurisdiction, "XX");
    assert_eq!(t.vat, dec!(250000));
    assert_eq!(t.transfer_fees, dec!(80000));
    assert_eq!(t.property_tax, dec!(20000));
    assert_eq!(t.personal_gains_tax, dec!(250000));
    assert_eq!(t.total_taxes, dec!(600000));
    assert_eq!(t.net_profit, dec!(400000));
    assert!(out.methodology.contains("XX 2025"));
}

#[test]
fn test_invalid_policy_rejected() {
    let mut policy = TaxPolicy::turkey_2024();
    policy.personal_gains_brackets.clear();
    assert!(estimate_taxes(&residential(dec!(1), false), &policy).is_err());
}
