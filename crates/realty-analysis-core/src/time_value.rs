use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::RealtyError;
use crate::types::{Money, Rate};
use crate::RealtyResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MIN_RATE: Decimal = dec!(-0.99);
const MAX_RATE: Decimal = dec!(10);

/// Net Present Value of a series of annual cash flows (t = 0 undiscounted)
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RealtyResult<Money> {
    if rate <= dec!(-1) {
        return Err(RealtyError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(RealtyError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Requires at least one sign change in the series; otherwise no rate
/// zeroes the NPV and the solver reports insufficient data up front.
pub fn irr(cash_flows: &[Money], guess: Rate) -> RealtyResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(RealtyError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_negative = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_positive = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !(has_negative && has_positive) {
        return Err(RealtyError::InsufficientData(
            "IRR requires both negative and positive cash flows".into(),
        ));
    }

    let mut rate = guess.clamp(MIN_RATE, MAX_RATE);

    for i in 0..MAX_IRR_ITERATIONS {
        let failure = |last_delta: Decimal| RealtyError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: i,
            last_delta,
        };

        let (npv_val, dnpv) = npv_and_derivative(cash_flows, rate).ok_or_else(|| failure(Decimal::MAX))?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(failure(npv_val));
        }

        let step = npv_val.checked_div(dnpv).ok_or_else(|| failure(npv_val))?;
        let next = (rate - step).clamp(MIN_RATE, MAX_RATE);

        // Pinned at a clamp bound with NPV still away from zero
        if next == rate && (next == MIN_RATE || next == MAX_RATE) {
            return Err(failure(npv_val));
        }
        if (next - rate).abs() < CONVERGENCE_THRESHOLD {
            return Ok(next);
        }
        rate = next;
    }

    Err(RealtyError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv_and_derivative(cash_flows, rate).map_or(Decimal::MAX, |(v, _)| v),
    })
}

/// NPV(r) and dNPV/dr, accumulating the discount factor instead of powers.
/// `None` when a term overflows, which happens near the -99% bound on long
/// series.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        let term = cf.checked_mul(discount)?;
        npv_val = npv_val.checked_add(term)?;
        if t > 0 {
            // d/dr CF_t (1+r)^-t = -t CF_t (1+r)^-(t+1)
            let slope = Decimal::from(t as u64).checked_mul(term)?.checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(slope)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv_val, dnpv))
}
