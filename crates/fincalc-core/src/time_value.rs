use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FinCalcError;
use crate::types::{Money, Rate, SolverOutcome};
use crate::FinCalcResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub fn growth_factor(rate: Rate, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result *= factor;
    }
    result
}

/// (1 + r)^n for a real-valued exponent.
///
/// Whole exponents take the iterative path; fractional ones go through
/// exp/ln, which needs a positive base.
pub fn growth_factor_real(rate: Rate, n: Decimal) -> FinCalcResult<Decimal> {
    if n.fract().is_zero() {
        if let Some(whole) = n.to_u32() {
            return Ok(growth_factor(rate, whole));
        }
    }
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate must be greater than -100%".into(),
        });
    }
    base.checked_powd(n).ok_or_else(|| FinCalcError::InvalidInput {
        field: "periods".into(),
        reason: format!("(1 + {rate})^{n} is out of range"),
    })
}

/// Level payment that amortizes `principal` over `n` periods at periodic rate `rate`.
///
/// Falls back to straight-line `principal / n` at a zero rate. Returns zero
/// when there are no periods left.
pub fn annuity_payment(principal: Money, rate: Rate, n: u32) -> Money {
    if n == 0 {
        return Decimal::ZERO;
    }
    if rate.is_zero() {
        return principal / Decimal::from(n);
    }
    let factor = growth_factor(rate, n);
    let denom = factor - Decimal::ONE;
    if denom.is_zero() {
        return principal / Decimal::from(n);
    }
    principal * rate * factor / denom
}

/// Outstanding balance after `k` level payments of `payment` on `principal`.
pub fn remaining_balance(principal: Money, rate: Rate, payment: Money, k: u32) -> Money {
    if rate.is_zero() {
        return (principal - payment * Decimal::from(k)).max(Decimal::ZERO);
    }
    let factor = growth_factor(rate, k);
    let balance = principal * factor - payment * (factor - Decimal::ONE) / rate;
    balance.max(Decimal::ZERO)
}

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> FinCalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(FinCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(FinCalcError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return per period using Newton-Raphson.
///
/// Never fails on non-convergence: the last iterate comes back flagged
/// `converged = false`.
pub fn irr(cash_flows: &[Money], guess: Rate) -> FinCalcResult<SolverOutcome> {
    if cash_flows.len() < 2 {
        return Err(FinCalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;
    let mut npv_val = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;
        let one_plus_r = Decimal::ONE + rate;
        let mut discount = Decimal::ONE;

        for (t, cf) in cash_flows.iter().enumerate() {
            if t > 0 {
                // Later flows are negligible once the discount factor overflows
                match discount.checked_mul(one_plus_r) {
                    Some(d) => discount = d,
                    None => break,
                }
            }
            if discount.is_zero() {
                continue;
            }
            npv_val += cf / discount;
            if t > 0 {
                dnpv -= Decimal::from(t as u64) * cf / discount / one_plus_r;
            }
        }

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            tracing::debug!(iterations = i, %rate, "IRR converged");
            return Ok(SolverOutcome::converged(rate, i, npv_val));
        }

        if dnpv.is_zero() {
            tracing::warn!(iterations = i, %rate, "IRR derivative vanished");
            return Ok(SolverOutcome::best_effort(rate, i, npv_val));
        }

        rate -= npv_val / dnpv;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    tracing::warn!(%rate, residual = %npv_val, "IRR hit iteration cap");
    let residual = npv(rate, cash_flows).unwrap_or(npv_val);
    Ok(SolverOutcome::best_effort(rate, MAX_IRR_ITERATIONS, residual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!(result.converged);
        // IRR should be ~9.7%
        assert!((result.value - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_no_sign_change_is_not_converged() {
        let cfs = vec![dec!(100), dec!(100), dec!(100)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!(!result.converged);
    }

    #[test]
    fn test_irr_requires_two_flows() {
        assert!(irr(&[dec!(-100)], dec!(0.1)).is_err());
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_annuity_payment_mortgage() {
        let pmt = annuity_payment(dec!(200000), dec!(0.05) / dec!(12), 360);
        assert!((pmt - dec!(1073.64)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        assert_eq!(annuity_payment(dec!(1200), Decimal::ZERO, 12), dec!(100));
        assert_eq!(annuity_payment(dec!(1200), dec!(0.01), 0), Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_reaches_zero() {
        let r = dec!(0.05) / dec!(12);
        let pmt = annuity_payment(dec!(200000), r, 360);
        let bal = remaining_balance(dec!(200000), r, pmt, 360);
        assert!(bal < dec!(0.000001), "got {bal}");
        let half = remaining_balance(dec!(200000), r, pmt, 180);
        assert!(half > dec!(100000) && half < dec!(200000));
    }

    #[test]
    fn test_growth_factor_real_fractional() {
        let g = growth_factor_real(dec!(0.10), dec!(0.5)).unwrap();
        // sqrt(1.1) ≈ 1.0488088
        assert!((g - dec!(1.0488088)).abs() < dec!(0.000001), "got {g}");
        assert_eq!(growth_factor_real(dec!(0.10), dec!(2)).unwrap(), dec!(1.21));
    }
}
