//! Refinance comparison: current loan versus a replacement loan.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::monthly_payment;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub current_balance: Money,
    pub current_rate: Rate,
    pub remaining_months: u32,
    pub new_rate: Rate,
    pub new_term_months: u32,
    pub closing_costs: Money,
    /// Add closing costs to the new loan instead of paying them upfront
    #[serde(default)]
    pub finance_closing_costs: bool,
    /// Additional equity taken out with the new loan
    #[serde(default)]
    pub cash_out: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub current_payment: Money,
    pub new_loan_amount: Money,
    pub new_payment: Money,
    /// Current payment minus new payment
    pub monthly_savings: Money,
    /// Months until savings repay closing costs; absent when never recovered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_months: Option<u32>,
    pub current_total_interest: Money,
    pub new_total_interest: Money,
    /// Remaining payments on the current loan
    pub current_total_cost: Money,
    /// New loan payments plus upfront closing costs
    pub new_total_cost: Money,
    /// Current total cost minus new total cost
    pub lifetime_savings: Money,
    pub worth_it: bool,
}

/// Months for monthly savings to recover closing costs, rounded up.
///
/// `None` when savings are zero or negative: the costs are never recovered.
pub fn break_even_months(closing_costs: Money, monthly_savings: Money) -> Option<u32> {
    if monthly_savings <= Decimal::ZERO {
        return None;
    }
    if closing_costs <= Decimal::ZERO {
        return Some(0);
    }
    (closing_costs / monthly_savings).ceil().to_u32()
}

/// Compare keeping the current loan with refinancing it.
pub fn compare_refinance(input: &RefinanceInput) -> FinCalcResult<ComputationOutput<RefinanceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.current_balance <= Decimal::ZERO
        || input.remaining_months == 0
        || input.new_term_months == 0
    {
        warnings.push("Balance and terms must be positive; comparison not applicable".into());
    }

    let current_payment =
        monthly_payment(input.current_balance, input.current_rate, input.remaining_months);
    let new_loan_amount = input.current_balance.max(Decimal::ZERO)
        + input.cash_out
        + if input.finance_closing_costs {
            input.closing_costs
        } else {
            Decimal::ZERO
        };
    let new_payment = monthly_payment(new_loan_amount, input.new_rate, input.new_term_months);
    let monthly_savings = current_payment - new_payment;

    let upfront_costs = if input.finance_closing_costs {
        Decimal::ZERO
    } else {
        input.closing_costs
    };
    let break_even = break_even_months(input.closing_costs, monthly_savings);
    if break_even.is_none() && current_payment > Decimal::ZERO {
        warnings.push("New payment is not lower; closing costs are not recoverable".into());
    }

    let current_total_cost = current_payment * Decimal::from(input.remaining_months);
    let new_payments = new_payment * Decimal::from(input.new_term_months);
    let new_total_cost = new_payments + upfront_costs;
    let lifetime_savings = current_total_cost + input.cash_out - new_total_cost;

    if input.new_term_months > input.remaining_months && monthly_savings > Decimal::ZERO {
        warnings.push(format!(
            "New term extends payments by {} months",
            input.new_term_months - input.remaining_months
        ));
    }

    let output = RefinanceOutput {
        current_payment,
        new_loan_amount,
        new_payment,
        monthly_savings,
        break_even_months: break_even,
        current_total_interest: current_total_cost - input.current_balance.max(Decimal::ZERO),
        new_total_interest: new_payments - new_loan_amount,
        current_total_cost,
        new_total_cost,
        lifetime_savings,
        worth_it: break_even.is_some_and(|m| m <= input.remaining_months)
            && lifetime_savings > Decimal::ZERO,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Refinance: payment comparison, break-even = ceil(closing costs / monthly savings)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
