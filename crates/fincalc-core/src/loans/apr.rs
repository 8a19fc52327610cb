//! Annual percentage rate of an installment loan with upfront fees.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value::{annuity_payment, growth_factor, irr};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SolverOutcome};
use crate::FinCalcResult;

/// Input parameters for an APR calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprInput {
    pub loan_amount: Money,
    /// Note rate as a decimal
    pub annual_rate: Rate,
    pub term_months: u32,
    /// Origination fees, points and other prepaid finance charges
    pub upfront_fees: Money,
    /// Fees rolled into the loan balance instead of paid at closing
    #[serde(default)]
    pub fees_financed: bool,
}

/// Output of the APR calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprOutput {
    /// Nominal APR (12 x monthly IRR)
    pub apr: Rate,
    /// Effective annual cost, (1 + monthly IRR)^12 - 1
    pub effective_annual_rate: Rate,
    pub monthly_payment: Money,
    /// Amount the borrower actually receives
    pub net_proceeds: Money,
    /// Total payments minus net proceeds
    pub finance_charge: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverOutcome>,
}

/// Compute the APR implied by a loan's payments and upfront fees.
pub fn calculate_apr(input: &AprInput) -> FinCalcResult<ComputationOutput<AprOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = if input.loan_amount <= Decimal::ZERO || input.term_months == 0 {
        warnings.push("Loan amount and term must be positive; APR not applicable".into());
        AprOutput {
            apr: Decimal::ZERO,
            effective_annual_rate: Decimal::ZERO,
            monthly_payment: Decimal::ZERO,
            net_proceeds: Decimal::ZERO,
            finance_charge: Decimal::ZERO,
            solver: None,
        }
    } else {
        let fees = input.upfront_fees.max(Decimal::ZERO);
        let (borrowed, net_proceeds) = if input.fees_financed {
            (input.loan_amount + fees, input.loan_amount)
        } else {
            (input.loan_amount, input.loan_amount - fees)
        };
        if net_proceeds <= Decimal::ZERO {
            warnings.push("Fees exceed the loan amount; APR is not meaningful".into());
        }

        let monthly_rate = input.annual_rate / dec!(12);
        let payment = annuity_payment(borrowed, monthly_rate, input.term_months);

        let mut flows = Vec::with_capacity(input.term_months as usize + 1);
        flows.push(net_proceeds);
        flows.extend(std::iter::repeat_n(-payment, input.term_months as usize));

        let solver = irr(&flows, monthly_rate)?;
        if !solver.converged {
            warnings.push("APR solver did not converge; value is a best estimate".into());
        }

        AprOutput {
            apr: solver.value * dec!(12),
            effective_annual_rate: growth_factor(solver.value, 12) - Decimal::ONE,
            monthly_payment: payment,
            net_proceeds,
            finance_charge: payment * Decimal::from(input.term_months) - net_proceeds,
            solver: Some(solver),
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "APR as annualized IRR of net proceeds against scheduled payments",
        input,
        warnings,
        elapsed,
        output,
    ))
}
