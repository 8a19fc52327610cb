use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::sip::annuity_value;
use super::{yearly_rows, Adjustments, InvestmentResult, YearlyGrowthRow};
use crate::time_value::{growth_factor, irr};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalInput {
    /// Target amount in today's money when `inflation_rate` is set
    pub target_amount: Money,
    #[serde(default)]
    pub current_savings: Money,
    pub annual_rate: Rate,
    pub years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalOutput {
    /// Target grown by inflation to the goal date
    pub future_target: Money,
    /// Current savings compounded annually to the goal date
    pub savings_future_value: Money,
    /// Amount the monthly plan still has to build
    pub shortfall: Money,
    pub required_monthly_investment: Money,
    #[serde(flatten)]
    pub summary: InvestmentResult,
    pub yearly: Vec<YearlyGrowthRow>,
}

/// Monthly contribution needed to reach a target, given current savings.
///
/// Savings grow as a lump sum at the annual rate; the gap is closed by an
/// ordinary annuity at rate / 12. The annuity is linear in the payment, so
/// the inverse is exact.
pub fn plan_goal(input: &GoalInput) -> FinCalcResult<ComputationOutput<GoalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = input.years;
    let months = years * 12;
    let i = input.annual_rate / dec!(12);
    let savings = input.current_savings.max(Decimal::ZERO);

    let future_target = match input.inflation_rate {
        Some(inflation) => input.target_amount * growth_factor(inflation, years),
        None => input.target_amount,
    };
    let savings_future_value = savings * growth_factor(input.annual_rate, years);
    let shortfall = (future_target - savings_future_value).max(Decimal::ZERO);

    let required_monthly_investment = if shortfall.is_zero() {
        warnings.push("Current savings already reach the target".into());
        Decimal::ZERO
    } else if months == 0 {
        warnings.push("No time left to invest; shortfall cannot be covered".into());
        Decimal::ZERO
    } else {
        let factor = annuity_value(Decimal::ONE, i, months);
        shortfall / factor
    };

    let pmt = required_monthly_investment;
    let checkpoints: Vec<(Money, Money)> = (0..=years)
        .map(|y| {
            let m = y * 12;
            let balance = savings * growth_factor(input.annual_rate, y) + annuity_value(pmt, i, m);
            (balance, savings + pmt * Decimal::from(m))
        })
        .collect();
    let future_value = checkpoints
        .last()
        .map(|(balance, _)| *balance)
        .unwrap_or(savings);
    let total_investment = savings + pmt * Decimal::from(months);

    let cagr = if months > 0 && total_investment > Decimal::ZERO {
        // Savings at month 0, contributions at months 1..n, value at n
        let mut flows = Vec::with_capacity(months as usize + 1);
        flows.push(-savings);
        flows.extend(std::iter::repeat_n(-pmt, months as usize));
        if let Some(last) = flows.last_mut() {
            *last += future_value;
        }
        let outcome = irr(&flows, i)?;
        if !outcome.converged {
            warnings.push("Return solver did not converge; CAGR is a best estimate".into());
        }
        growth_factor(outcome.value, 12) - Decimal::ONE
    } else {
        Decimal::ZERO
    };

    let output = GoalOutput {
        future_target,
        savings_future_value,
        shortfall,
        required_monthly_investment,
        summary: InvestmentResult::new(
            total_investment,
            future_value,
            cagr,
            years,
            Adjustments {
                inflation_rate: input.inflation_rate,
                tax_rate: None,
            },
        ),
        yearly: yearly_rows(&checkpoints),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Goal planner: PMT = (target - S(1+r)^t) x i / ((1+i)^n - 1)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
