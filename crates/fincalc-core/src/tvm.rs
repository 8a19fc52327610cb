//! Time-value-of-money solver.
//!
//! All five unknowns share one identity (one payment per compounding
//! period, `t = 1` for payments at the beginning of the period):
//!
//! ```text
//! FV = PV·(1+r)^n + PMT·((1+r)^n − 1)/r · (1 + r·t)
//! ```
//!
//! Signs are taken as given: with positive PV and PMT the scenario is a
//! savings plan; a loan is modelled with a negative PMT paying PV down to FV.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::periods::{advance, rate_per_period, Frequency, PaymentTiming};
use crate::time_value::growth_factor_real;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SolverOutcome};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const RATE_MAX_ITERATIONS: u32 = 100;
/// Tolerance on the future value, not on the rate.
const RATE_VALUE_TOLERANCE: Decimal = dec!(0.00001);
const RATE_INITIAL_GUESS: Rate = dec!(0.01);
/// Schedules are capped to keep daily compounding over long horizons bounded.
const MAX_SCHEDULE_ROWS: u32 = 50_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which TVM variable is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveFor {
    FutureValue,
    PresentValue,
    Payment,
    Periods,
    Rate,
}

/// Input to the TVM solver. The field named by `solve_for` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmInput {
    pub solve_for: SolveFor,
    #[serde(default)]
    pub present_value: Money,
    #[serde(default)]
    pub future_value: Money,
    /// Payment per compounding period
    #[serde(default)]
    pub payment: Money,
    /// Annual nominal rate as a decimal
    #[serde(default)]
    pub annual_rate: Rate,
    /// Number of compounding periods (may be fractional)
    #[serde(default)]
    pub periods: Decimal,
    pub compounding: Frequency,
    #[serde(default)]
    pub timing: PaymentTiming,
    /// Anchor date for the schedule; rows are undated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// One period of the balance schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmScheduleRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub beginning_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub ending_balance: Money,
}

/// Fully-populated TVM scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmOutput {
    pub solve_for: SolveFor,
    pub present_value: Money,
    pub future_value: Money,
    pub payment: Money,
    pub annual_rate: Rate,
    pub periodic_rate: Rate,
    pub periods: Decimal,
    /// PV plus all periodic payments
    pub total_investment: Money,
    /// FV minus total investment
    pub total_interest: Money,
    /// Periodic rate annualized by compounding
    pub effective_annual_rate: Rate,
    /// Convergence details when solving for rate or periods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverOutcome>,
    pub schedule: Vec<TvmScheduleRow>,
}

/// The four knowns plus the value solved for, before derived metrics.
#[derive(Debug, Clone, Copy)]
struct Scenario {
    pv: Money,
    fv: Money,
    pmt: Money,
    r: Rate,
    n: Decimal,
    t: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve for whichever variable `input.solve_for` names.
pub fn solve(input: &TvmInput) -> FinCalcResult<ComputationOutput<TvmOutput>> {
    match input.solve_for {
        SolveFor::FutureValue => solve_fv(input),
        SolveFor::PresentValue => solve_pv(input),
        SolveFor::Payment => solve_pmt(input),
        SolveFor::Periods => solve_periods(input),
        SolveFor::Rate => solve_rate(input),
    }
}

/// Future value by direct evaluation.
pub fn solve_fv(input: &TvmInput) -> FinCalcResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let mut s = scenario(input);
    if s.n < Decimal::ZERO {
        warnings.push("Negative period count treated as zero".into());
        s.n = Decimal::ZERO;
    }
    s.fv = future_value(s.pv, s.pmt, s.r, s.n, s.t)?;
    finish(input, SolveFor::FutureValue, s, None, warnings, start)
}

/// Present value as the algebraic inverse of the FV identity.
pub fn solve_pv(input: &TvmInput) -> FinCalcResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let mut s = scenario(input);
    if s.n < Decimal::ZERO {
        warnings.push("Negative period count treated as zero".into());
        s.n = Decimal::ZERO;
    }
    let g = growth_factor_real(s.r, s.n)?;
    let annuity = annuity_fv_factor(s.r, s.n, g) * (Decimal::ONE + s.r * s.t);
    s.pv = (s.fv - s.pmt * annuity) / g;
    finish(input, SolveFor::PresentValue, s, None, warnings, start)
}

/// Periodic payment that carries PV to FV over n periods.
pub fn solve_pmt(input: &TvmInput) -> FinCalcResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let mut s = scenario(input);
    if s.n <= Decimal::ZERO {
        warnings.push("Payment is undefined without at least one period; reported as zero".into());
        s.n = Decimal::ZERO;
        s.pmt = Decimal::ZERO;
        return finish(input, SolveFor::Payment, s, None, warnings, start);
    }
    let g = growth_factor_real(s.r, s.n)?;
    let annuity = annuity_fv_factor(s.r, s.n, g) * (Decimal::ONE + s.r * s.t);
    s.pmt = (s.fv - s.pv * g) / annuity;
    finish(input, SolveFor::Payment, s, None, warnings, start)
}

/// Number of periods (real-valued) via logarithms, or linearly at a zero rate.
pub fn solve_periods(input: &TvmInput) -> FinCalcResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let mut s = scenario(input);

    let solved = if s.r.is_zero() {
        if s.pmt.is_zero() {
            None
        } else {
            Some((s.fv - s.pv) / s.pmt)
        }
    } else {
        // FV + k = (PV + k)(1+r)^n with k = PMT(1+rt)/r
        let k = s.pmt * (Decimal::ONE + s.r * s.t) / s.r;
        let denom = s.pv + k;
        if denom.is_zero() {
            None
        } else {
            let ratio = (s.fv + k) / denom;
            match (ratio.checked_ln(), (Decimal::ONE + s.r).checked_ln()) {
                (Some(num), Some(den)) if !den.is_zero() => Some(num / den),
                _ => None,
            }
        }
    };

    let solver = match solved {
        Some(n) if n >= Decimal::ZERO => {
            s.n = n;
            SolverOutcome::converged(n, 0, Decimal::ZERO)
        }
        _ => {
            warnings.push("Target future value is unreachable with these cash flows".into());
            tracing::warn!(pv = %s.pv, fv = %s.fv, pmt = %s.pmt, "TVM period solve has no solution");
            s.n = Decimal::ZERO;
            SolverOutcome::best_effort(Decimal::ZERO, 0, s.fv - s.pv)
        }
    };
    if solver.converged && !s.n.fract().is_zero() {
        warnings.push(format!(
            "Period count {} is fractional; the schedule runs {} whole periods",
            s.n.round_dp(4),
            s.n.ceil()
        ));
    }

    finish(input, SolveFor::Periods, s, Some(solver), warnings, start)
}

/// Periodic rate by Newton-Raphson on FV(r) − target.
///
/// Returns the best estimate with `converged = false` when the target cannot
/// be reached within the iteration cap.
pub fn solve_rate(input: &TvmInput) -> FinCalcResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let mut s = scenario(input);
    if s.n <= Decimal::ZERO {
        warnings.push("Rate is undefined without at least one period; reported as zero".into());
        s.n = Decimal::ZERO;
        s.r = Decimal::ZERO;
        let solver = SolverOutcome::best_effort(Decimal::ZERO, 0, s.fv - s.pv);
        return finish(input, SolveFor::Rate, s, Some(solver), warnings, start);
    }

    let solver = newton_rate(s.pv, s.pmt, s.fv, s.n, s.t);
    if !solver.converged {
        warnings.push(format!(
            "Rate solver did not converge after {} iterations (residual {}); value is a best estimate",
            solver.iterations,
            solver.residual.round_dp(6)
        ));
    }
    s.r = solver.value;
    finish(input, SolveFor::Rate, s, Some(solver), warnings, start)
}

// ---------------------------------------------------------------------------
// Formula family
// ---------------------------------------------------------------------------

fn scenario(input: &TvmInput) -> Scenario {
    Scenario {
        pv: input.present_value,
        fv: input.future_value,
        pmt: input.payment,
        r: rate_per_period(input.annual_rate, input.compounding),
        n: input.periods,
        t: input.timing.flag(),
    }
}

/// ((1+r)^n − 1)/r, or n at a zero rate. `g` is (1+r)^n.
fn annuity_fv_factor(r: Rate, n: Decimal, g: Decimal) -> Decimal {
    if r.is_zero() {
        n
    } else {
        (g - Decimal::ONE) / r
    }
}

fn future_value(pv: Money, pmt: Money, r: Rate, n: Decimal, t: Decimal) -> FinCalcResult<Money> {
    let g = growth_factor_real(r, n)?;
    Ok(pv * g + pmt * annuity_fv_factor(r, n, g) * (Decimal::ONE + r * t))
}

/// FV(r) and dFV/dr, both evaluated with real-valued n.
fn fv_and_derivative(pv: Money, pmt: Money, r: Rate, n: Decimal, t: Decimal) -> Option<(Money, Decimal)> {
    if r.is_zero() {
        // Limits as r -> 0
        let fv = pv + pmt * n;
        let dfv = pv * n + pmt * (n * (n - Decimal::ONE) / dec!(2) + n * t);
        return Some((fv, dfv));
    }
    let base = Decimal::ONE + r;
    if base <= Decimal::ZERO {
        return None;
    }
    let g = base.checked_powd(n)?;
    let dg = n * g / base;
    let a = (g - Decimal::ONE) / r;
    let da = (dg * r - (g - Decimal::ONE)) / (r * r);
    let timing = Decimal::ONE + r * t;
    let fv = pv * g + pmt * a * timing;
    let dfv = pv * dg + pmt * (da * timing + a * t);
    Some((fv, dfv))
}

fn newton_rate(pv: Money, pmt: Money, target: Money, n: Decimal, t: Decimal) -> SolverOutcome {
    let mut r = RATE_INITIAL_GUESS;
    let mut best = SolverOutcome::best_effort(r, 0, Decimal::MAX);
    let mut iterations = 0;

    for i in 0..RATE_MAX_ITERATIONS {
        iterations = i + 1;
        let Some((fv, dfv)) = fv_and_derivative(pv, pmt, r, n, t) else {
            break;
        };
        let residual = fv - target;
        if residual.abs() < best.residual {
            best = SolverOutcome::best_effort(r, i, residual);
        }
        if residual.abs() < RATE_VALUE_TOLERANCE {
            tracing::debug!(iterations = i, rate = %r, "TVM rate converged");
            return SolverOutcome::converged(r, i, residual);
        }
        if dfv.is_zero() {
            break;
        }
        r -= residual / dfv;

        // Guard against divergence
        if r <= dec!(-0.99) {
            r = dec!(-0.99);
        } else if r > dec!(10) {
            r = dec!(10);
        }
    }

    tracing::warn!(rate = %best.value, residual = %best.residual, "TVM rate did not converge");
    best.iterations = iterations;
    best
}

// ---------------------------------------------------------------------------
// Derived metrics and schedule
// ---------------------------------------------------------------------------

fn finish(
    input: &TvmInput,
    solve_for: SolveFor,
    s: Scenario,
    solver: Option<SolverOutcome>,
    warnings: Vec<String>,
    start: Instant,
) -> FinCalcResult<ComputationOutput<TvmOutput>> {
    let ppy = input.compounding.periods_per_year();
    let total_investment = s.pv + s.pmt * s.n;
    // Zero when the periodic rate is out of range for annualization
    let effective_annual_rate = if s.r > dec!(-1) {
        (Decimal::ONE + s.r)
            .checked_powi(i64::from(ppy))
            .map_or(Decimal::ZERO, |g| g - Decimal::ONE)
    } else {
        Decimal::ZERO
    };

    let output = TvmOutput {
        solve_for,
        present_value: s.pv,
        future_value: s.fv,
        payment: s.pmt,
        annual_rate: s.r * Decimal::from(ppy),
        periodic_rate: s.r,
        periods: s.n,
        total_investment,
        total_interest: s.fv - total_investment,
        effective_annual_rate,
        solver,
        schedule: build_schedule(input, &s),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Time value of money: FV = PV(1+r)^n + PMT((1+r)^n - 1)/r (1 + rt)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Balance roll-forward over ceil(n) whole periods.
fn build_schedule(input: &TvmInput, s: &Scenario) -> Vec<TvmScheduleRow> {
    let rows = s.n.ceil().to_u32().unwrap_or(0).min(MAX_SCHEDULE_ROWS);
    let begin = input.timing == PaymentTiming::Begin;
    let mut balance = s.pv;
    let mut schedule = Vec::with_capacity(rows as usize);

    for period in 1..=rows {
        let beginning_balance = balance;
        let interest = if begin {
            (balance + s.pmt) * s.r
        } else {
            balance * s.r
        };
        balance += s.pmt + interest;
        schedule.push(TvmScheduleRow {
            period,
            date: input
                .start_date
                .map(|d| advance(d, period, input.compounding)),
            beginning_balance,
            payment: s.pmt,
            interest,
            ending_balance: balance,
        });
    }

    schedule
}
