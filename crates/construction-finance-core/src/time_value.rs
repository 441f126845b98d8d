use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ConstructionFinanceError;
use crate::types::{Money, Rate};
use crate::ConstructionFinanceResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const IRR_UPPER_BOUND: Decimal = dec!(10.0);

/// Candidate lower brackets for bisection, tightest last. Long negative
/// series overflow the discount factor near -99%, so the first bound that
/// evaluates is used.
const IRR_LOWER_BOUNDS: [Decimal; 5] = [
    dec!(-0.99),
    dec!(-0.9),
    dec!(-0.75),
    dec!(-0.5),
    dec!(-0.25),
];

fn overflow(field: &str) -> ConstructionFinanceError {
    ConstructionFinanceError::InvalidInput {
        field: field.into(),
        reason: "rate/term combination overflows decimal range".into(),
    }
}

/// Net Present Value of a series of cash flows, `cash_flows[0]` at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ConstructionFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(ConstructionFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| overflow("rate"))?;
        }
        if discount.is_zero() {
            return Err(ConstructionFinanceError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| overflow("rate"))?;
    }

    Ok(result)
}

/// NPV(r) and its derivative d(NPV)/dr, or `None` when either leaves the
/// decimal range at this rate.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        value = value.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            let term = Decimal::from(-(t as i64))
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            derivative = derivative.checked_add(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((value, derivative))
}

fn evaluate(cash_flows: &[Money], rate: Rate) -> ConstructionFinanceResult<(Decimal, Decimal)> {
    npv_and_derivative(cash_flows, rate).ok_or_else(|| ConstructionFinanceError::NotApplicable {
        metric: "irr".into(),
        reason: format!("NPV overflows decimal range at rate {rate}"),
    })
}

/// Internal Rate of Return.
///
/// Newton-Raphson from `guess`; when that stalls, falls back to bisection
/// up to 1000%, from the lowest of -99%, -90%, -75%, -50% or -25% at which
/// NPV stays within decimal range, provided NPV changes sign on the interval.
pub fn irr(cash_flows: &[Money], guess: Rate) -> ConstructionFinanceResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ConstructionFinanceError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_positive || !has_negative {
        return Err(ConstructionFinanceError::NotApplicable {
            metric: "irr".into(),
            reason: "cash flows never change sign".into(),
        });
    }

    match newton_irr(cash_flows, guess) {
        Ok(rate) => Ok(rate),
        Err(e) => {
            tracing::debug!(error = %e, "newton IRR failed, trying bisection");
            bisection_irr(cash_flows)
        }
    }
}

fn newton_irr(cash_flows: &[Money], guess: Rate) -> ConstructionFinanceResult<Rate> {
    let lower_bound = IRR_LOWER_BOUNDS[0];
    let mut rate = guess;
    let mut last_value = Decimal::MAX;

    for i in 0..MAX_IRR_ITERATIONS {
        let (value, derivative) = evaluate(cash_flows, rate)?;
        last_value = value;

        if value.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if derivative.is_zero() {
            return Err(ConstructionFinanceError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: value,
            });
        }

        let step = value.checked_div(derivative).ok_or_else(|| {
            ConstructionFinanceError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: value,
            }
        })?;
        let next = rate - step;
        if (next - rate).abs() < CONVERGENCE_THRESHOLD {
            return Ok(next);
        }
        rate = next;

        // Guard against divergence
        if rate < lower_bound {
            rate = lower_bound;
        } else if rate > IRR_UPPER_BOUND {
            rate = IRR_UPPER_BOUND;
        }
    }

    Err(ConstructionFinanceError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: last_value,
    })
}

fn bisection_irr(cash_flows: &[Money]) -> ConstructionFinanceResult<Rate> {
    let (mut lo, mut f_lo) = IRR_LOWER_BOUNDS
        .iter()
        .find_map(|&lo| npv_and_derivative(cash_flows, lo).map(|(f, _)| (lo, f)))
        .ok_or_else(|| ConstructionFinanceError::NotApplicable {
            metric: "irr".into(),
            reason: "NPV overflows decimal range at every lower bracket".into(),
        })?;
    let mut hi = IRR_UPPER_BOUND;
    let (f_hi, _) = evaluate(cash_flows, hi)?;

    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        return Err(ConstructionFinanceError::NotApplicable {
            metric: "irr".into(),
            reason: format!("NPV does not change sign between {lo} and {hi}"),
        });
    }

    let mut mid = lo;
    let mut f_mid = f_lo;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        mid = (lo + hi) / dec!(2);
        f_mid = evaluate(cash_flows, mid)?.0;
        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo) < CONVERGENCE_THRESHOLD {
            return Ok(mid);
        }
        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    tracing::debug!(rate = %mid, "IRR bisection exhausted");
    Err(ConstructionFinanceError::ConvergenceFailure {
        function: "IRR (bisection)".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: f_mid,
    })
}

/// Compound growth factor (1 + rate)^periods.
pub fn compound_factor(rate: Rate, periods: u32) -> ConstructionFinanceResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| overflow("rate"))
}

/// Level payment that retires `present_value` over `nper` periods.
///
/// Returned with the sign convention of a borrower: a positive
/// `present_value` yields a positive payment.
pub fn pmt(rate: Rate, nper: u32, present_value: Money) -> ConstructionFinanceResult<Money> {
    if nper == 0 {
        return Err(ConstructionFinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(present_value / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(ConstructionFinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    present_value
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| overflow("rate"))
}
