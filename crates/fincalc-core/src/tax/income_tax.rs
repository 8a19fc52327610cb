use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Marginal rate applied to income up to `up_to`; the last bracket is open-ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_to: Option<Money>,
    pub rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    pub gross_income: Money,
    /// Itemized deductions and exemptions
    #[serde(default)]
    pub deductions: Money,
    #[serde(default)]
    pub standard_deduction: Money,
    /// Credits subtracted from the computed tax
    #[serde(default)]
    pub tax_credits: Money,
    pub brackets: Vec<TaxBracket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketTax {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate: Rate,
    pub taxable_amount: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxOutput {
    pub taxable_income: Money,
    pub tax_before_credits: Money,
    pub total_tax: Money,
    /// Total tax / gross income
    pub effective_rate: Rate,
    /// Rate of the bracket the last unit of taxable income falls in
    pub marginal_rate: Rate,
    pub after_tax_income: Money,
    pub breakdown: Vec<BracketTax>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Progressive income tax over ascending brackets.
pub fn calculate_income_tax(
    input: &IncomeTaxInput,
) -> FinCalcResult<ComputationOutput<IncomeTaxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_brackets(&input.brackets)?;
    if input.brackets.is_empty() {
        warnings.push("No tax brackets supplied; tax is zero".into());
    }

    let deduction = input.deductions.max(input.standard_deduction).max(Decimal::ZERO);
    let taxable_income = (input.gross_income - deduction).max(Decimal::ZERO);

    let mut breakdown = Vec::with_capacity(input.brackets.len());
    let mut lower = Decimal::ZERO;
    let mut marginal_rate = Decimal::ZERO;
    for bracket in &input.brackets {
        if taxable_income <= lower && !breakdown.is_empty() {
            break;
        }
        let ceiling = bracket.up_to.map_or(taxable_income, |u| u.min(taxable_income));
        let taxable_amount = (ceiling - lower).max(Decimal::ZERO);
        if taxable_amount > Decimal::ZERO || breakdown.is_empty() {
            marginal_rate = bracket.rate;
        }
        breakdown.push(BracketTax {
            lower,
            upper: bracket.up_to,
            rate: bracket.rate,
            taxable_amount,
            tax: taxable_amount * bracket.rate,
        });
        match bracket.up_to {
            Some(upper) => lower = upper,
            None => break,
        }
    }

    if input.brackets.last().is_some_and(|b| b.up_to.is_some_and(|u| taxable_income > u)) {
        warnings.push("Income exceeds the top bracket; the excess is untaxed".into());
    }

    let tax_before_credits: Money = breakdown.iter().map(|b| b.tax).sum();
    let total_tax = (tax_before_credits - input.tax_credits.max(Decimal::ZERO)).max(Decimal::ZERO);
    let effective_rate = if input.gross_income > Decimal::ZERO {
        total_tax / input.gross_income
    } else {
        Decimal::ZERO
    };

    let output = IncomeTaxOutput {
        taxable_income,
        tax_before_credits,
        total_tax,
        effective_rate,
        marginal_rate,
        after_tax_income: input.gross_income - total_tax,
        breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Progressive income tax: marginal rates applied per bracket after deductions",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_brackets(brackets: &[TaxBracket]) -> FinCalcResult<()> {
    let mut previous = Decimal::ZERO;
    for (i, bracket) in brackets.iter().enumerate() {
        match bracket.up_to {
            Some(upper) if upper <= previous => {
                return Err(FinCalcError::InvalidInput {
                    field: format!("brackets[{i}].up_to"),
                    reason: "Bracket thresholds must be positive and strictly ascending".into(),
                });
            }
            Some(upper) => previous = upper,
            None if i + 1 != brackets.len() => {
                return Err(FinCalcError::InvalidInput {
                    field: format!("brackets[{i}].up_to"),
                    reason: "Only the last bracket may be open-ended".into(),
                });
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn brackets() -> Vec<TaxBracket> {
        vec![
            TaxBracket {
                up_to: Some(dec!(10000)),
                rate: dec!(0.10),
            },
            TaxBracket {
                up_to: Some(dec!(40000)),
                rate: dec!(0.20),
            },
            TaxBracket {
                up_to: None,
                rate: dec!(0.30),
            },
        ]
    }

    fn input(gross: Money) -> IncomeTaxInput {
        IncomeTaxInput {
            gross_income: gross,
            deductions: Decimal::ZERO,
            standard_deduction: dec!(5000),
            tax_credits: Decimal::ZERO,
            brackets: brackets(),
        }
    }

    #[test]
    fn test_progressive_tax() {
        let out = calculate_income_tax(&input(dec!(65000))).unwrap().result;
        // Taxable 60000: 1000 + 6000 + 6000
        assert_eq!(out.taxable_income, dec!(60000));
        assert_eq!(out.total_tax, dec!(13000));
        assert_eq!(out.marginal_rate, dec!(0.30));
        assert_eq!(out.effective_rate, dec!(13000) / dec!(65000));
        assert_eq!(out.breakdown.len(), 3);
    }

    #[test]
    fn test_income_in_first_bracket() {
        let out = calculate_income_tax(&input(dec!(12000))).unwrap().result;
        assert_eq!(out.total_tax, dec!(700));
        assert_eq!(out.marginal_rate, dec!(0.10));
        assert_eq!(out.breakdown.len(), 1);
    }

    #[test]
    fn test_credits_floor_at_zero() {
        let mut i = input(dec!(12000));
        i.tax_credits = dec!(1000);
        let out = calculate_income_tax(&i).unwrap().result;
        assert_eq!(out.tax_before_credits, dec!(700));
        assert_eq!(out.total_tax, Decimal::ZERO);
    }

    #[test]
    fn test_itemized_deduction_used_when_larger() {
        let mut i = input(dec!(65000));
        i.deductions = dec!(15000);
        let out = calculate_income_tax(&i).unwrap().result;
        assert_eq!(out.taxable_income, dec!(50000));
    }

    #[test]
    fn test_unordered_brackets_rejected() {
        let mut i = input(dec!(65000));
        i.brackets.swap(0, 1);
        assert!(calculate_income_tax(&i).is_err());
    }
}
