//! Compound interest with optional periodic contributions.
//!
//! The balance is rolled forward one compounding period at a time and the
//! period rows are folded into calendar-year rows for reporting. A term that
//! ends mid-period accrues the stub at `(1 + r)^fraction` with no contribution,
//! so the total matches `P(1 + r/n)^(nt)` for any real `t`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::periods::{effective_annual_rate, rate_per_period, Frequency, PaymentTiming};
use crate::time_value::growth_factor_real;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundInterestInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
    pub compounding: Frequency,
    /// Amount added every compounding period
    #[serde(default)]
    pub contribution: Money,
    #[serde(default)]
    pub contribution_timing: PaymentTiming,
}

/// Balance movement over one year (or the final partial year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundYearRow {
    pub year: u32,
    pub opening_balance: Money,
    pub contributions: Money,
    pub interest: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundInterestOutput {
    pub future_value: Money,
    pub total_contributions: Money,
    pub total_interest: Money,
    pub effective_annual_rate: Rate,
    /// Whole compounding periods
    pub periods: u32,
    /// Fraction of a period accrued after the whole ones
    pub stub_period: Decimal,
    pub yearly: Vec<CompoundYearRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Grow a principal (plus contributions) at a compounded rate.
pub fn calculate_compound_interest(
    input: &CompoundInterestInput,
) -> FinCalcResult<ComputationOutput<CompoundInterestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let term = split_term(input.years, input.compounding, &mut warnings);
    if input.principal < Decimal::ZERO {
        warnings.push("Negative principal treated as a liability balance".into());
    }

    let output = grow(input, term)?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Compound interest: P(1 + r/n)^(nt) with per-period contributions",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A term expressed in compounding periods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Term {
    pub whole: u32,
    /// In `[0, 1)`
    pub stub: Decimal,
}

/// Split `years × periods_per_year` into whole periods and a fractional stub.
pub(crate) fn split_term(years: Years, compounding: Frequency, warnings: &mut Vec<String>) -> Term {
    if years <= Decimal::ZERO {
        warnings.push("Term must be positive; nothing to compound".into());
        return Term {
            whole: 0,
            stub: Decimal::ZERO,
        };
    }
    // Month counts divided by 12 leave a 1e-28 residue; drop it before flooring
    let exact = (years * Decimal::from(compounding.periods_per_year())).round_dp(12);
    let whole = exact.floor();
    Term {
        whole: whole.to_u32().unwrap_or(0),
        stub: exact - whole,
    }
}

/// Period-by-period roll-forward folded into yearly rows.
pub(crate) fn grow(input: &CompoundInterestInput, term: Term) -> FinCalcResult<CompoundInterestOutput> {
    let periods = term.whole;
    let ppy = input.compounding.periods_per_year();
    let r = rate_per_period(input.annual_rate, input.compounding);
    let begin = input.contribution_timing == PaymentTiming::Begin;

    let mut balance = input.principal;
    let mut total_contributions = input.principal;
    let mut yearly: Vec<CompoundYearRow> = Vec::new();
    let mut row: Option<CompoundYearRow> = None;

    for period in 1..=periods {
        let year = (period - 1) / ppy + 1;
        let current = row.get_or_insert(CompoundYearRow {
            year,
            opening_balance: balance,
            contributions: Decimal::ZERO,
            interest: Decimal::ZERO,
            closing_balance: balance,
        });

        let interest = if begin {
            (balance + input.contribution) * r
        } else {
            balance * r
        };
        balance += interest + input.contribution;
        total_contributions += input.contribution;

        current.contributions += input.contribution;
        current.interest += interest;
        current.closing_balance = balance;

        if period % ppy == 0 || period == periods {
            if let Some(done) = row.take() {
                yearly.push(done);
            }
        }
    }

    if term.stub > Decimal::ZERO {
        let interest = balance * (growth_factor_real(r, term.stub)? - Decimal::ONE);
        // A stub finishing a part-filled year joins that year's row
        let opens_new_year = periods % ppy == 0;
        match yearly.last_mut() {
            Some(last) if !opens_new_year => {
                last.interest += interest;
                last.closing_balance += interest;
            }
            _ => yearly.push(CompoundYearRow {
                year: periods / ppy + 1,
                opening_balance: balance,
                contributions: Decimal::ZERO,
                interest,
                closing_balance: balance + interest,
            }),
        }
        balance += interest;
    }

    Ok(CompoundInterestOutput {
        future_value: balance,
        total_contributions,
        total_interest: balance - total_contributions,
        effective_annual_rate: effective_annual_rate(input.annual_rate, input.compounding),
        periods,
        stub_period: term.stub,
        yearly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::MathematicalOps;
    use rust_decimal_macros::dec;

    fn input(compounding: Frequency) -> CompoundInterestInput {
        CompoundInterestInput {
            principal: dec!(10000),
            annual_rate: dec!(0.05),
            years: dec!(5),
            compounding,
            contribution: Decimal::ZERO,
            contribution_timing: PaymentTiming::End,
        }
    }

    #[test]
    fn test_yearly_compounding_reference() {
        let out = calculate_compound_interest(&input(Frequency::Annual))
            .unwrap()
            .result;
        assert_eq!(out.future_value, dec!(12762.815625));
        assert_eq!(out.yearly.len(), 5);
        assert_eq!(out.total_interest, dec!(2762.815625));
    }

    #[test]
    fn test_monthly_rows_fold_into_years() {
        let out = calculate_compound_interest(&input(Frequency::Monthly))
            .unwrap()
            .result;
        assert_eq!(out.periods, 60);
        assert_eq!(out.yearly.len(), 5);
        for pair in out.yearly.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
        let interest: Decimal = out.yearly.iter().map(|y| y.interest).sum();
        assert!((interest - out.total_interest).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_contributions_tracked() {
        let mut i = input(Frequency::Monthly);
        i.contribution = dec!(100);
        let out = calculate_compound_interest(&i).unwrap().result;
        assert_eq!(out.total_contributions, dec!(16000));
        assert_eq!(out.yearly[0].contributions, dec!(1200));
    }

    #[test]
    fn test_partial_final_year() {
        let mut i = input(Frequency::Quarterly);
        i.years = dec!(2.5);
        let out = calculate_compound_interest(&i).unwrap().result;
        assert_eq!(out.periods, 10);
        assert_eq!(out.yearly.len(), 3);
        assert_eq!(out.yearly[2].year, 3);
    }

    #[test]
    fn test_half_year_annual_uses_fractional_power() {
        let mut i = input(Frequency::Annual);
        i.years = dec!(0.5);
        let out = calculate_compound_interest(&i).unwrap();
        let r = out.result;
        // 10000 × 1.05^0.5
        assert!((r.future_value - dec!(10246.95)).abs() < dec!(0.01), "got {}", r.future_value);
        assert_eq!(r.periods, 0);
        assert_eq!(r.stub_period, dec!(0.5));
        assert_eq!(r.yearly.len(), 1);
        assert_eq!(r.yearly[0].closing_balance, r.future_value);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_stub_joins_partial_year_row() {
        let mut i = input(Frequency::Annual);
        i.compounding = Frequency::SemiAnnual;
        i.years = dec!(1.75);
        let out = calculate_compound_interest(&i).unwrap().result;
        // 3 whole half-years then half a period
        assert_eq!(out.periods, 3);
        assert_eq!(out.yearly.len(), 2);
        assert_eq!(out.yearly[1].closing_balance, out.future_value);
        let closed_form = dec!(10000) * dec!(1.025).powd(dec!(3.5));
        assert!((out.future_value - closed_form).abs() < dec!(0.01), "got {}", out.future_value);
    }

    #[test]
    fn test_zero_term_returns_principal() {
        let mut i = input(Frequency::Annual);
        i.years = Decimal::ZERO;
        let out = calculate_compound_interest(&i).unwrap();
        assert_eq!(out.result.future_value, dec!(10000));
        assert!(out.result.yearly.is_empty());
        assert!(!out.warnings.is_empty());
    }
}
