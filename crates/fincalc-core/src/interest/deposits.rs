//! Certificates of deposit and recurring deposits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::compound::{grow, split_term, CompoundInterestInput, CompoundYearRow};
use crate::periods::{effective_annual_rate, Frequency, PaymentTiming};
use crate::time_value::growth_factor_real;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdInput {
    pub deposit: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub compounding: Frequency,
    /// Tax rate applied to interest earned
    #[serde(default)]
    pub tax_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdOutput {
    pub apy: Rate,
    pub maturity_value: Money,
    pub total_interest: Money,
    pub tax_on_interest: Money,
    pub after_tax_value: Money,
    /// Maturity value in today's money
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_value: Option<Money>,
    pub yearly: Vec<CompoundYearRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringDepositInput {
    pub monthly_installment: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
}

/// Growth of one monthly installment to maturity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringInstallmentRow {
    pub month: u32,
    pub installment: Money,
    pub months_invested: u32,
    pub maturity_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringDepositOutput {
    pub maturity_value: Money,
    pub total_deposited: Money,
    pub total_interest: Money,
    pub installments: Vec<RecurringInstallmentRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Annual percentage yield: (1 + r/n)^n − 1.
pub fn apy(annual_rate: Rate, compounding: Frequency) -> Rate {
    effective_annual_rate(annual_rate, compounding)
}

/// Certificate of deposit with tax on interest and optional inflation adjustment.
pub fn calculate_cd(input: &CdInput) -> FinCalcResult<ComputationOutput<CdOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = Decimal::from(input.term_months) / dec!(12);
    let compound_input = CompoundInterestInput {
        principal: input.deposit.max(Decimal::ZERO),
        annual_rate: input.annual_rate,
        years,
        compounding: input.compounding,
        contribution: Decimal::ZERO,
        contribution_timing: PaymentTiming::End,
    };
    if input.deposit <= Decimal::ZERO {
        warnings.push("Deposit must be positive".into());
    }
    let term = split_term(years, input.compounding, &mut warnings);
    let grown = grow(&compound_input, term)?;

    let total_interest = grown.total_interest;
    let tax_on_interest = (total_interest * input.tax_rate).max(Decimal::ZERO);
    let real_value = match input.inflation_rate {
        Some(inflation) => Some(grown.future_value / growth_factor_real(inflation, years)?),
        None => None,
    };

    let output = CdOutput {
        apy: apy(input.annual_rate, input.compounding),
        maturity_value: grown.future_value,
        total_interest,
        tax_on_interest,
        after_tax_value: grown.future_value - tax_on_interest,
        real_value,
        yearly: grown.yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Certificate of deposit: compound growth, tax on interest, FV / (1 + inflation)^t",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Recurring deposit: monthly installments compounded quarterly to maturity.
///
/// The installment paid in month `k` of `n` earns `(1 + r/4)^((n − k + 1)/3)`.
pub fn calculate_recurring_deposit(
    input: &RecurringDepositInput,
) -> FinCalcResult<ComputationOutput<RecurringDepositOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let quarterly = input.annual_rate / dec!(4);
    let mut installments = Vec::with_capacity(input.term_months as usize);
    let mut maturity_value = Decimal::ZERO;

    if input.monthly_installment <= Decimal::ZERO || input.term_months == 0 {
        warnings.push("Installment and term must be positive".into());
    } else {
        for month in 1..=input.term_months {
            let months_invested = input.term_months - month + 1;
            let factor = growth_factor_real(quarterly, Decimal::from(months_invested) / dec!(3))?;
            let value = input.monthly_installment * factor;
            maturity_value += value;
            installments.push(RecurringInstallmentRow {
                month,
                installment: input.monthly_installment,
                months_invested,
                maturity_value: value,
            });
        }
    }

    let total_deposited =
        input.monthly_installment.max(Decimal::ZERO) * Decimal::from(installments.len() as u32);

    let output = RecurringDepositOutput {
        maturity_value,
        total_deposited,
        total_interest: maturity_value - total_deposited,
        installments,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Recurring deposit: each installment compounded quarterly for its remaining months",
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

    fn cd() -> CdInput {
        CdInput {
            deposit: dec!(10000),
            annual_rate: dec!(0.05),
            term_months: 60,
            compounding: Frequency::Monthly,
            tax_rate: Decimal::ZERO,
            inflation_rate: None,
        }
    }

    #[test]
    fn test_apy_monthly_five_percent() {
        let value = apy(dec!(0.05), Frequency::Monthly);
        assert!((value - dec!(0.0511619)).abs() < dec!(0.0000001), "got {value}");
    }

    #[test]
    fn test_apy_annual_equals_nominal() {
        assert_eq!(apy(dec!(0.05), Frequency::Annual), dec!(0.05));
    }

    #[test]
    fn test_cd_maturity_value() {
        let out = calculate_cd(&cd()).unwrap().result;
        // 10000 x (1 + 0.05/12)^60 ≈ 12833.59
        assert!((out.maturity_value - dec!(12833.59)).abs() < dec!(0.01), "got {}", out.maturity_value);
        assert_eq!(out.yearly.len(), 5);
        assert!(out.real_value.is_none());
    }

    #[test]
    fn test_eighteen_month_cd_with_annual_compounding() {
        let mut input = cd();
        input.term_months = 18;
        input.compounding = Frequency::Annual;
        let out = calculate_cd(&input).unwrap();
        // 10000 x 1.05^1.5, not two full years
        let value = out.result.maturity_value;
        assert!((value - dec!(10759.30)).abs() < dec!(0.01), "got {value}");
        assert_eq!(out.result.yearly.len(), 2);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_seven_month_cd_counts_whole_months() {
        let mut input = cd();
        input.term_months = 7;
        let out = calculate_cd(&input).unwrap().result;
        let expected = dec!(10000) * crate::time_value::growth_factor(dec!(0.05) / dec!(12), 7);
        assert!((out.maturity_value - expected).abs() < dec!(0.0000001), "got {}", out.maturity_value);
        assert_eq!(out.yearly.len(), 1);
    }

    #[test]
    fn test_cd_tax_and_inflation() {
        let mut input = cd();
        input.tax_rate = dec!(0.25);
        input.inflation_rate = Some(dec!(0.03));
        let out = calculate_cd(&input).unwrap().result;
        assert_eq!(out.tax_on_interest, out.total_interest * dec!(0.25));
        assert_eq!(out.after_tax_value, out.maturity_value - out.tax_on_interest);
        let real = out.real_value.unwrap();
        let expected = out.maturity_value / crate::time_value::growth_factor(dec!(0.03), 5);
        assert!((real - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_recurring_deposit_one_year() {
        let input = RecurringDepositInput {
            monthly_installment: dec!(1000),
            annual_rate: dec!(0.07),
            term_months: 12,
        };
        let out = calculate_recurring_deposit(&input).unwrap().result;
        assert_eq!(out.total_deposited, dec!(12000));
        assert!(
            out.maturity_value > dec!(12455) && out.maturity_value < dec!(12470),
            "got {}",
            out.maturity_value
        );
        assert_eq!(out.installments[0].months_invested, 12);
        assert_eq!(out.installments[11].months_invested, 1);
    }

    #[test]
    fn test_recurring_deposit_zero_term() {
        let input = RecurringDepositInput {
            monthly_installment: dec!(1000),
            annual_rate: dec!(0.07),
            term_months: 0,
        };
        let out = calculate_recurring_deposit(&input).unwrap();
        assert_eq!(out.result.maturity_value, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }
}
