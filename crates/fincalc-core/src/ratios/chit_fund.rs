//! Chit fund: a rotating savings and credit scheme.
//!
//! Every month each member pays `chit_value / members`. The pot is auctioned
//! and the winning bidder forgoes a discount; the foreman keeps a commission
//! out of that discount and the rest is shared by all members as a dividend
//! that reduces their next installment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value::{growth_factor, irr};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SolverOutcome};
use crate::FinCalcResult;

fn default_commission() -> Rate {
    dec!(0.05)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitFundInput {
    pub chit_value: Money,
    /// Number of members, which is also the number of months
    pub members: u32,
    /// Foreman commission as a share of the chit value
    #[serde(default = "default_commission")]
    pub commission_rate: Rate,
    /// Winning auction discount for each month; missing months bid zero
    pub monthly_discounts: Vec<Money>,
    /// Month (1-based) in which this member takes the pot
    pub winning_month: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitMonthRow {
    pub month: u32,
    pub discount: Money,
    pub commission: Money,
    pub dividend_per_member: Money,
    pub net_installment: Money,
    /// Paid out to that month's winner
    pub prize_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitFundOutput {
    pub monthly_installment: Money,
    pub total_paid: Money,
    pub total_dividends: Money,
    pub total_commission: Money,
    pub prize_received: Money,
    /// Prize received minus installments paid
    pub net_gain: Money,
    /// Annualized IRR of this member's flows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualized_return: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverOutcome>,
    pub schedule: Vec<ChitMonthRow>,
}

pub fn calculate_chit_fund(input: &ChitFundInput) -> FinCalcResult<ComputationOutput<ChitFundOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.chit_value <= Decimal::ZERO || input.members == 0 {
        warnings.push("Chit value and member count must be positive".into());
    }
    if input.monthly_discounts.len() > input.members as usize {
        warnings.push("More discounts than months; extra entries ignored".into());
    }

    let members = Decimal::from(input.members.max(1));
    let monthly_installment = input.chit_value.max(Decimal::ZERO) / members;
    let commission = input.chit_value.max(Decimal::ZERO) * input.commission_rate;

    let mut schedule = Vec::with_capacity(input.members as usize);
    for month in 1..=input.members {
        let discount = input
            .monthly_discounts
            .get(month as usize - 1)
            .copied()
            .unwrap_or(Decimal::ZERO);
        if discount < commission {
            warnings.push(format!("Month {month}: discount below commission; no dividend"));
        }
        let dividend_per_member = ((discount - commission) / members).max(Decimal::ZERO);
        schedule.push(ChitMonthRow {
            month,
            discount,
            commission,
            dividend_per_member,
            net_installment: monthly_installment - dividend_per_member,
            prize_amount: input.chit_value - discount,
        });
    }

    let total_paid: Money = schedule.iter().map(|r| r.net_installment).sum();
    let total_dividends: Money = schedule.iter().map(|r| r.dividend_per_member).sum();
    let total_commission = commission * Decimal::from(input.members);

    let winner = schedule
        .iter()
        .find(|r| r.month == input.winning_month)
        .map(|r| r.prize_amount);
    if winner.is_none() {
        warnings.push(format!(
            "Winning month {} is outside the {}-month term",
            input.winning_month, input.members
        ));
    }
    let prize_received = winner.unwrap_or(Decimal::ZERO);

    let (annualized_return, solver) = match winner {
        Some(prize) if schedule.len() >= 2 => {
            let flows: Vec<Money> = schedule
                .iter()
                .map(|r| {
                    let received = if r.month == input.winning_month { prize } else { Decimal::ZERO };
                    received - r.net_installment
                })
                .collect();
            let outcome = irr(&flows, dec!(0.01))?;
            if !outcome.converged {
                warnings.push("Return solver did not converge; value is a best estimate".into());
            }
            (Some(growth_factor(outcome.value, 12) - Decimal::ONE), Some(outcome))
        }
        _ => (None, None),
    };

    let output = ChitFundOutput {
        monthly_installment,
        total_paid,
        total_dividends,
        total_commission,
        prize_received,
        net_gain: prize_received - total_paid,
        annualized_return,
        solver,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Chit fund: dividend = (auction discount - commission) / members, member IRR",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fund(winning_month: u32) -> ChitFundInput {
        ChitFundInput {
            chit_value: dec!(100000),
            members: 10,
            commission_rate: dec!(0.05),
            monthly_discounts: vec![
                dec!(5000),
                dec!(20000),
                dec!(18000),
                dec!(16000),
                dec!(14000),
                dec!(12000),
                dec!(10000),
                dec!(8000),
                dec!(6000),
                dec!(5000),
            ],
            winning_month,
        }
    }

    #[test]
    fn test_dividend_and_net_installment() {
        let out = calculate_chit_fund(&fund(10)).unwrap().result;
        assert_eq!(out.monthly_installment, dec!(10000));
        assert_eq!(out.schedule[0].dividend_per_member, Decimal::ZERO);
        assert_eq!(out.schedule[1].dividend_per_member, dec!(1500));
        assert_eq!(out.schedule[1].net_installment, dec!(8500));
        assert_eq!(out.schedule[1].prize_amount, dec!(80000));
    }

    #[test]
    fn test_totals() {
        let out = calculate_chit_fund(&fund(10)).unwrap().result;
        assert_eq!(out.total_dividends, dec!(6400));
        assert_eq!(out.total_paid, dec!(93600));
        assert_eq!(out.total_commission, dec!(50000));
        assert_eq!(out.net_gain, dec!(1400));
        assert!(out.annualized_return.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_early_winner_pays_for_credit() {
        let out = calculate_chit_fund(&fund(2)).unwrap().result;
        assert_eq!(out.prize_received, dec!(80000));
        assert!(out.net_gain < Decimal::ZERO);
        assert!(out.solver.unwrap().converged);
    }

    #[test]
    fn test_winning_month_out_of_range() {
        let out = calculate_chit_fund(&fund(11)).unwrap();
        assert!(out.result.annualized_return.is_none());
        assert_eq!(out.result.prize_received, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }
}
