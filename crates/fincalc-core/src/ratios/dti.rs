//! Debt-to-income ratios with the conventional 28/36 underwriting limits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

const FRONT_END_LIMIT: Rate = dec!(0.28);
const BACK_END_LIMIT: Rate = dec!(0.36);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtiInput {
    pub gross_monthly_income: Money,
    /// Mortgage or rent plus housing costs
    pub monthly_housing_payment: Money,
    /// Car, student, card and other recurring debt payments
    #[serde(default)]
    pub other_monthly_debts: Money,
}

/// Qualitative reading of the back-end ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtiBand {
    /// ≤ 20%
    Excellent,
    /// ≤ 36%
    Good,
    /// ≤ 43%
    Manageable,
    /// ≤ 50%
    High,
    Critical,
}

impl DtiBand {
    pub fn from_ratio(back_end: Rate) -> Self {
        if back_end <= dec!(0.20) {
            DtiBand::Excellent
        } else if back_end <= BACK_END_LIMIT {
            DtiBand::Good
        } else if back_end <= dec!(0.43) {
            DtiBand::Manageable
        } else if back_end <= dec!(0.50) {
            DtiBand::High
        } else {
            DtiBand::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtiOutput {
    /// Housing / income
    pub front_end_ratio: Rate,
    /// (Housing + other debts) / income
    pub back_end_ratio: Rate,
    pub front_end_limit: Rate,
    pub back_end_limit: Rate,
    pub max_housing_payment: Money,
    pub max_total_debt: Money,
    /// Room left under the back-end limit (negative when over)
    pub remaining_capacity: Money,
    pub within_limits: bool,
    pub band: DtiBand,
}

pub fn calculate_dti(input: &DtiInput) -> FinCalcResult<ComputationOutput<DtiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let income = input.gross_monthly_income;
    let total_debt = input.monthly_housing_payment + input.other_monthly_debts;

    let (front_end_ratio, back_end_ratio) = if income > Decimal::ZERO {
        (input.monthly_housing_payment / income, total_debt / income)
    } else {
        warnings.push("Income must be positive; ratios reported as zero".into());
        (Decimal::ZERO, Decimal::ZERO)
    };

    let max_housing_payment = income.max(Decimal::ZERO) * FRONT_END_LIMIT;
    let max_total_debt = income.max(Decimal::ZERO) * BACK_END_LIMIT;
    let within_limits =
        income > Decimal::ZERO && front_end_ratio <= FRONT_END_LIMIT && back_end_ratio <= BACK_END_LIMIT;

    if income > Decimal::ZERO && front_end_ratio > FRONT_END_LIMIT {
        warnings.push(format!(
            "Housing ratio {:.1}% exceeds the {}% guideline",
            front_end_ratio * dec!(100),
            FRONT_END_LIMIT * dec!(100)
        ));
    }

    let output = DtiOutput {
        front_end_ratio,
        back_end_ratio,
        front_end_limit: FRONT_END_LIMIT,
        back_end_limit: BACK_END_LIMIT,
        max_housing_payment,
        max_total_debt,
        remaining_capacity: max_total_debt - total_debt,
        within_limits,
        band: if income > Decimal::ZERO {
            DtiBand::from_ratio(back_end_ratio)
        } else {
            DtiBand::Critical
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Debt-to-income: front-end = housing / income, back-end = all debt / income",
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

    #[test]
    fn test_reference_ratios() {
        let input = DtiInput {
            gross_monthly_income: dec!(5000),
            monthly_housing_payment: dec!(1500),
            other_monthly_debts: dec!(600),
        };
        let out = calculate_dti(&input).unwrap();
        assert_eq!(out.result.front_end_ratio, dec!(0.30));
        assert_eq!(out.result.back_end_ratio, dec!(0.42));
        assert!(!out.result.within_limits);
        assert_eq!(out.result.band, DtiBand::Manageable);
        assert_eq!(out.result.remaining_capacity, dec!(-300));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_within_limits() {
        let input = DtiInput {
            gross_monthly_income: dec!(10000),
            monthly_housing_payment: dec!(2000),
            other_monthly_debts: dec!(500),
        };
        let out = calculate_dti(&input).unwrap().result;
        assert!(out.within_limits);
        assert_eq!(out.band, DtiBand::Good);
        assert_eq!(out.max_housing_payment, dec!(2800));
    }

    #[test]
    fn test_zero_income_is_degenerate() {
        let input = DtiInput {
            gross_monthly_income: Decimal::ZERO,
            monthly_housing_payment: dec!(1000),
            other_monthly_debts: Decimal::ZERO,
        };
        let out = calculate_dti(&input).unwrap();
        assert_eq!(out.result.back_end_ratio, Decimal::ZERO);
        assert!(!out.result.within_limits);
        assert!(!out.warnings.is_empty());
    }
}
