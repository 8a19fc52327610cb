//! Plain-vanilla bond valuation.
//!
//! Cash flows are discounted at whole coupon periods from settlement; the
//! count of remaining coupons is `ceil(years × frequency)` and their dates are
//! laid out backward from maturity so the last one falls on maturity. No
//! accrued interest is computed, so the reported price is a clean price.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::periods::{sub_months, years_between};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SolverOutcome};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const NEWTON_MAX_ITERATIONS: u32 = 100;
/// Tolerance on the price, not on the yield.
const NEWTON_PRICE_TOLERANCE: Decimal = dec!(0.00001);
/// Newton iterates are kept inside this periodic-yield band.
const YIELD_FLOOR: Rate = dec!(-0.99);
const YIELD_CAP: Rate = dec!(10);
/// Price within half a cent of face is labelled par.
const PAR_TOLERANCE: Decimal = dec!(0.005);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The market observable the bond is valued from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondQuote {
    /// Annual yield to maturity as a decimal; solve for price
    Yield(Rate),
    /// Clean market price; solve for yield to maturity
    Price(Money),
}

/// Input parameters for bond valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondInput {
    /// Par / face value (typically 1000)
    pub face_value: Money,
    /// Annual coupon rate as a decimal (e.g. 0.05 = 5%)
    pub coupon_rate: Rate,
    /// Coupons per year: 1, 2, 4 or 12
    pub coupon_frequency: u8,
    pub settlement_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub quote: BondQuote,
}

/// Whether the bond trades above, below or at face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLabel {
    Premium,
    Discount,
    Par,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashflowKind {
    Coupon,
    Principal,
    Total,
}

/// One row of the discounted cash-flow schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondCashflowRow {
    pub period: u32,
    pub date: NaiveDate,
    pub cash_flow: Money,
    pub present_value: Money,
    pub kind: CashflowKind,
}

/// Output of bond valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondOutput {
    pub price: Money,
    /// Annualized yield to maturity (periodic yield × frequency)
    pub yield_to_maturity: Rate,
    pub current_yield: Rate,
    pub coupon_amount: Money,
    pub years_to_maturity: Decimal,
    pub periods: u32,
    /// Macaulay duration in years
    pub macaulay_duration: Decimal,
    pub modified_duration: Decimal,
    pub convexity: Decimal,
    pub label: PriceLabel,
    /// Present only when the yield was solved from a price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverOutcome>,
    pub cashflows: Vec<BondCashflowRow>,
}

impl BondOutput {
    fn empty() -> Self {
        Self {
            price: Decimal::ZERO,
            yield_to_maturity: Decimal::ZERO,
            current_yield: Decimal::ZERO,
            coupon_amount: Decimal::ZERO,
            years_to_maturity: Decimal::ZERO,
            periods: 0,
            macaulay_duration: Decimal::ZERO,
            modified_duration: Decimal::ZERO,
            convexity: Decimal::ZERO,
            label: PriceLabel::Par,
            solver: None,
            cashflows: Vec::new(),
        }
    }
}

/// Discounted cash-flow measures at one periodic yield.
struct Valuation {
    price: Money,
    /// Σ k·PV_k
    weighted: Decimal,
    /// Σ k(k+1)·PV_k
    convex: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a bond from either its yield or its price.
pub fn value_bond(input: &BondInput) -> FinCalcResult<ComputationOutput<BondOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let output = if input.face_value <= Decimal::ZERO {
        warnings.push("Face value must be positive; bond not valued".into());
        BondOutput::empty()
    } else if input.maturity_date <= input.settlement_date {
        warnings.push("Maturity is on or before settlement; no cash flows remain".into());
        BondOutput::empty()
    } else {
        match input.quote {
            BondQuote::Price(price) if price <= Decimal::ZERO => {
                warnings.push("Quoted price must be positive; yield not solved".into());
                BondOutput::empty()
            }
            _ => build_output(input, &mut warnings),
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Bond valuation: PV of coupons and principal at periodic yield, Newton-Raphson YTM",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Clean price of `periods` remaining coupons at an annual yield.
///
/// `None` when the discounted value exceeds the `Decimal` range, which only
/// happens for deeply negative yields.
pub fn bond_price(
    face_value: Money,
    coupon_rate: Rate,
    frequency: u8,
    periods: u32,
    annual_yield: Rate,
) -> Option<Money> {
    let freq = Decimal::from(frequency);
    let coupon = face_value * coupon_rate / freq;
    value_at(coupon, face_value, periods, annual_yield / freq).map(|v| v.price)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &BondInput) -> FinCalcResult<()> {
    if !matches!(input.coupon_frequency, 1 | 2 | 4 | 12) {
        return Err(FinCalcError::InvalidInput {
            field: "coupon_frequency".into(),
            reason: "Coupon frequency must be 1, 2, 4, or 12".into(),
        });
    }
    if input.coupon_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "coupon_rate".into(),
            reason: "Coupon rate cannot be negative".into(),
        });
    }
    if let BondQuote::Yield(y) = input.quote {
        if y / Decimal::from(input.coupon_frequency) <= dec!(-1) {
            return Err(FinCalcError::InvalidInput {
                field: "quote".into(),
                reason: "Periodic yield must be greater than -100%".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Number of remaining coupon periods, never less than one.
fn remaining_periods(years: Decimal, frequency: u8) -> u32 {
    (years * Decimal::from(frequency))
        .ceil()
        .to_u32()
        .unwrap_or(1)
        .max(1)
}

/// `None` on `Decimal` overflow: yields near −100% blow the discount factor up
/// geometrically.
fn value_at(coupon: Money, face: Money, periods: u32, y: Rate) -> Option<Valuation> {
    let mut price = Decimal::ZERO;
    let mut weighted = Decimal::ZERO;
    let mut convex = Decimal::ZERO;
    let base = Decimal::ONE + y;
    let mut discount = Decimal::ONE;

    for k in 1..=periods {
        discount = discount.checked_div(base)?;
        let cf = if k == periods { coupon + face } else { coupon };
        let pv = cf.checked_mul(discount)?;
        let kd = Decimal::from(k);
        let kpv = kd.checked_mul(pv)?;
        price = price.checked_add(pv)?;
        weighted = weighted.checked_add(kpv)?;
        convex = convex.checked_add((kd + Decimal::ONE).checked_mul(kpv)?)?;
    }

    Some(Valuation {
        price,
        weighted,
        convex,
    })
}

/// Newton-Raphson on price(y) − target starting from the periodic coupon rate.
///
/// A step that lands where the price overflows is halved back toward the last
/// yield that could be valued. The returned yield is always one that values.
fn solve_yield(
    coupon: Money,
    face: Money,
    periods: u32,
    target: Money,
    guess: Rate,
) -> Option<SolverOutcome> {
    let mut y = guess;
    let mut last_good: Option<(Rate, Money)> = None;

    for i in 0..NEWTON_MAX_ITERATIONS {
        let Some(v) = value_at(coupon, face, periods, y) else {
            let (good_y, _) = last_good?;
            y = (y + good_y) / dec!(2);
            continue;
        };
        let residual = v.price - target;
        last_good = Some((y, residual));
        if residual.abs() < NEWTON_PRICE_TOLERANCE {
            tracing::debug!(iterations = i, periodic_yield = %y, "bond yield converged");
            return Some(SolverOutcome::converged(y, i, residual));
        }
        // dP/dy = Σ −k·CF_k/(1+y)^(k+1)
        let derivative = (-v.weighted).checked_div(Decimal::ONE + y).unwrap_or(Decimal::ZERO);
        if derivative.is_zero() {
            tracing::warn!(periodic_yield = %y, "bond yield derivative vanished or overflowed");
            return Some(SolverOutcome::best_effort(y, i + 1, residual));
        }

        // Same signs mean the step lowers the yield
        let fallback = if residual.is_sign_negative() == derivative.is_sign_negative() {
            YIELD_FLOOR
        } else {
            YIELD_CAP
        };
        y = residual
            .checked_div(derivative)
            .and_then(|step| y.checked_sub(step))
            .unwrap_or(fallback)
            .clamp(YIELD_FLOOR, YIELD_CAP);
    }

    let (y, residual) = last_good?;
    tracing::warn!(periodic_yield = %y, residual = %residual, "bond yield did not converge");
    Some(SolverOutcome::best_effort(y, NEWTON_MAX_ITERATIONS, residual))
}

fn build_output(input: &BondInput, warnings: &mut Vec<String>) -> BondOutput {
    let frequency = input.coupon_frequency;
    let freq = Decimal::from(frequency);
    let face = input.face_value;
    let coupon_amount = face * input.coupon_rate / freq;
    let years_to_maturity = years_between(input.settlement_date, input.maturity_date);
    let periods = remaining_periods(years_to_maturity, frequency);

    let (y, solver) = match input.quote {
        BondQuote::Yield(annual) => (annual / freq, None),
        BondQuote::Price(target) => {
            let guess = input.coupon_rate / freq;
            let Some(outcome) = solve_yield(coupon_amount, face, periods, target, guess) else {
                warnings.push("Bond cannot be valued at any yield near the quoted price".into());
                return BondOutput::empty();
            };
            if !outcome.converged {
                warnings.push(format!(
                    "Yield solver did not converge after {} iterations; value is a best estimate",
                    outcome.iterations
                ));
            }
            (outcome.value, Some(outcome))
        }
    };

    let Some(v) = value_at(coupon_amount, face, periods, y) else {
        warnings.push(format!(
            "Price at a periodic yield of {y} exceeds the representable range; bond not valued"
        ));
        return BondOutput::empty();
    };
    let price = v.price;
    let one_plus_y = Decimal::ONE + y;

    let (macaulay_duration, convexity) = if price > Decimal::ZERO {
        (
            v.weighted / price / freq,
            v.convex / (freq * freq) / price / (one_plus_y * one_plus_y),
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    let modified_duration = macaulay_duration / one_plus_y;

    let current_yield = if price > Decimal::ZERO {
        face * input.coupon_rate / price
    } else {
        Decimal::ZERO
    };

    let label = if (price - face).abs() < PAR_TOLERANCE {
        PriceLabel::Par
    } else if price > face {
        PriceLabel::Premium
    } else {
        PriceLabel::Discount
    };

    BondOutput {
        price,
        yield_to_maturity: y * freq,
        current_yield,
        coupon_amount,
        years_to_maturity,
        periods,
        macaulay_duration,
        modified_duration,
        convexity,
        label,
        solver,
        cashflows: cashflow_schedule(input, coupon_amount, periods, y, price),
    }
}

fn cashflow_schedule(
    input: &BondInput,
    coupon: Money,
    periods: u32,
    y: Rate,
    price: Money,
) -> Vec<BondCashflowRow> {
    let step = 12 / u32::from(input.coupon_frequency);
    let face = input.face_value;
    let base = Decimal::ONE + y;
    let mut discount = Decimal::ONE;
    let mut rows = Vec::with_capacity(periods as usize + 2);

    for k in 1..=periods {
        discount /= base;
        let date = sub_months(input.maturity_date, (periods - k) * step);
        rows.push(BondCashflowRow {
            period: k,
            date,
            cash_flow: coupon,
            present_value: coupon * discount,
            kind: CashflowKind::Coupon,
        });
    }

    rows.push(BondCashflowRow {
        period: periods,
        date: input.maturity_date,
        cash_flow: face,
        present_value: face * discount,
        kind: CashflowKind::Principal,
    });
    rows.push(BondCashflowRow {
        period: periods,
        date: input.maturity_date,
        cash_flow: coupon * Decimal::from(periods) + face,
        present_value: price,
        kind: CashflowKind::Total,
    });

    rows
}
