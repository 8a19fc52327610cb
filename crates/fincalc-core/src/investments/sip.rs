//! Systematic investment plan: a fixed monthly contribution, optionally
//! stepped up at every anniversary.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{yearly_rows, Adjustments, GrowthOutput, InvestmentResult};
use crate::time_value::{growth_factor, irr};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SolverOutcome};
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipInput {
    pub monthly_investment: Money,
    /// Expected annual return, compounded monthly at rate / 12
    pub annual_rate: Rate,
    pub years: u32,
    /// Fractional increase of the contribution at each anniversary
    #[serde(default)]
    pub step_up_rate: Rate,
    #[serde(flatten)]
    pub adjustments: Adjustments,
}

/// Future value of monthly end-of-month contributions.
///
/// A plan without step-up is evaluated in closed form at every year end; a
/// stepped-up plan is simulated month by month. CAGR is the money-weighted
/// return of the monthly flows, annualized.
pub fn calculate_sip(input: &SipInput) -> FinCalcResult<ComputationOutput<GrowthOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let months = input.years * 12;
    let i = input.annual_rate / dec!(12);

    let (checkpoints, contributions) =
        if input.monthly_investment <= Decimal::ZERO || months == 0 {
            warnings.push("Monthly investment and duration must be positive".into());
            (vec![(Decimal::ZERO, Decimal::ZERO)], Vec::new())
        } else if input.step_up_rate.is_zero() {
            level_plan(input.monthly_investment, i, input.years)
        } else {
            stepped_plan(input.monthly_investment, i, input.years, input.step_up_rate)
        };

    let (future_value, total_investment) = checkpoints
        .last()
        .copied()
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));

    let (cagr, solver) = money_weighted_cagr(&contributions, future_value, i)?;
    if solver.is_some_and(|s| !s.converged) {
        warnings.push("Return solver did not converge; CAGR is a best estimate".into());
    }

    let output = GrowthOutput {
        summary: InvestmentResult::new(
            total_investment,
            future_value,
            cagr,
            input.years,
            input.adjustments,
        ),
        yearly: yearly_rows(&checkpoints),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "SIP: ordinary annuity FV = P((1+i)^n - 1)/i, i = r/12; step-up simulated monthly",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Closed-form ordinary-annuity value after `months` contributions.
pub(crate) fn annuity_value(payment: Money, i: Rate, months: u32) -> Money {
    if i.is_zero() {
        payment * Decimal::from(months)
    } else {
        payment * (growth_factor(i, months) - Decimal::ONE) / i
    }
}

type Plan = (Vec<(Money, Money)>, Vec<Money>);

fn level_plan(payment: Money, i: Rate, years: u32) -> Plan {
    let checkpoints = (0..=years)
        .map(|y| {
            let months = y * 12;
            (annuity_value(payment, i, months), payment * Decimal::from(months))
        })
        .collect();
    let contributions = vec![payment; (years * 12) as usize];
    (checkpoints, contributions)
}

fn stepped_plan(first_payment: Money, i: Rate, years: u32, step_up: Rate) -> Plan {
    let mut checkpoints = vec![(Decimal::ZERO, Decimal::ZERO)];
    let mut contributions = Vec::with_capacity((years * 12) as usize);
    let mut balance = Decimal::ZERO;
    let mut invested = Decimal::ZERO;
    let mut payment = first_payment;

    for year in 1..=years {
        if year > 1 {
            payment *= Decimal::ONE + step_up;
        }
        for _ in 0..12 {
            balance = balance * (Decimal::ONE + i) + payment;
            invested += payment;
            contributions.push(payment);
        }
        checkpoints.push((balance, invested));
    }

    (checkpoints, contributions)
}

/// Annualized IRR of contributions paid at months 0..n−1 against the final value.
fn money_weighted_cagr(
    contributions: &[Money],
    future_value: Money,
    guess: Rate,
) -> FinCalcResult<(Rate, Option<SolverOutcome>)> {
    if contributions.len() < 2 {
        return Ok((Decimal::ZERO, None));
    }
    let mut flows: Vec<Money> = contributions.iter().map(|c| -*c).collect();
    if let Some(last) = flows.last_mut() {
        *last += future_value;
    }
    let outcome = irr(&flows, guess)?;
    Ok((growth_factor(outcome.value, 12) - Decimal::ONE, Some(outcome)))
}
