use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ConstructionFinanceError;
use crate::time_value;
use crate::types::{percent_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::ConstructionFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a fixed-rate, fixed-term loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount borrowed
    pub principal: Money,
    /// Nominal annual interest rate in percent (6 = 6%)
    pub annual_rate_pct: Percent,
    /// Term in months
    pub term_months: u32,
}

/// One row of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    /// 1-based payment number
    pub month: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Outstanding balance after this payment
    pub balance: Money,
}

/// Schedule rows rolled up by loan year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanYearSummary {
    pub year: u32,
    pub total_paid: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanCalculation {
    pub principal: Money,
    pub annual_rate_pct: Percent,
    pub term_months: u32,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub schedule: Vec<LoanPayment>,
    pub yearly_summary: Vec<LoanYearSummary>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level-payment amortization of a fixed-rate loan.
///
/// The final period pays off whatever balance remains, so the schedule
/// always closes at exactly zero and its principal column sums to the
/// amount borrowed.
pub fn compute_amortization(
    principal: Money,
    annual_rate_pct: Percent,
    term_months: u32,
) -> ConstructionFinanceResult<LoanCalculation> {
    validate(principal, annual_rate_pct, term_months)?;

    let monthly_rate: Rate = percent_to_rate(annual_rate_pct) / dec!(12);
    let monthly_payment = time_value::pmt(monthly_rate, term_months, principal)?;

    let mut schedule = Vec::with_capacity(term_months as usize);
    let mut balance = principal;

    for month in 1..=term_months {
        let interest = balance * monthly_rate;
        let mut principal_part = monthly_payment - interest;

        if month == term_months || principal_part > balance {
            principal_part = balance;
        }

        balance -= principal_part;
        if balance < Decimal::ZERO {
            balance = Decimal::ZERO;
        }

        schedule.push(LoanPayment {
            month,
            payment: principal_part + interest,
            principal: principal_part,
            interest,
            balance,
        });
    }

    let total_payment: Money = schedule.iter().map(|p| p.payment).sum();
    let total_interest: Money = schedule.iter().map(|p| p.interest).sum();
    let yearly_summary = summarize_by_year(&schedule);

    Ok(LoanCalculation {
        principal,
        annual_rate_pct,
        term_months,
        monthly_payment,
        total_payment,
        total_interest,
        schedule,
        yearly_summary,
    })
}

/// Envelope wrapper around [`compute_amortization`].
pub fn amortize(input: &LoanInput) -> ConstructionFinanceResult<ComputationOutput<LoanCalculation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let calc = compute_amortization(input.principal, input.annual_rate_pct, input.term_months)?;

    if input.annual_rate_pct.is_zero() {
        warnings.push("Zero interest rate: straight-line principal repayment".into());
    }
    if calc.total_interest > calc.principal {
        warnings.push(format!(
            "Total interest ({}) exceeds the amount borrowed ({})",
            calc.total_interest.round_dp(2),
            calc.principal
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fixed-rate level-payment amortization (monthly compounding)",
        input,
        warnings,
        elapsed,
        calc,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate(principal: Money, annual_rate_pct: Percent, term_months: u32) -> ConstructionFinanceResult<()> {
    if principal < Decimal::ZERO {
        return Err(ConstructionFinanceError::invalid(
            "principal",
            "Principal cannot be negative",
        ));
    }
    if annual_rate_pct < Decimal::ZERO {
        return Err(ConstructionFinanceError::invalid(
            "annual_rate_pct",
            "Interest rate cannot be negative",
        ));
    }
    if term_months == 0 {
        return Err(ConstructionFinanceError::invalid(
            "term_months",
            "Term must be at least one month",
        ));
    }
    Ok(())
}

fn summarize_by_year(schedule: &[LoanPayment]) -> Vec<LoanYearSummary> {
    schedule
        .chunks(12)
        .enumerate()
        .map(|(i, rows)| LoanYearSummary {
            year: i as u32 + 1,
            total_paid: rows.iter().map(|r| r.payment).sum(),
            principal_paid: rows.iter().map(|r| r.principal).sum(),
            interest_paid: rows.iter().map(|r| r.interest).sum(),
            closing_balance: rows.last().map(|r| r.balance).unwrap_or_default(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
