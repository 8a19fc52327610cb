#![cfg(feature = "interest")]

use chrono::NaiveDate;
use fincalc_core::interest::compound::{calculate_compound_interest, CompoundInterestInput};
use fincalc_core::interest::deposits::{apy, calculate_cd, CdInput};
use fincalc_core::interest::simple::{
    simple_interest_schedule, Prepayment, RateReset, SimpleScheduleInput,
};
use fincalc_core::periods::{Frequency, PaymentTiming};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ===========================================================================
// Compound interest
// ===========================================================================

#[test]
fn test_five_years_annual_compounding() {
    let input = CompoundInterestInput {
        principal: dec!(10000),
        annual_rate: dec!(0.05),
        years: dec!(5),
        compounding: Frequency::Annual,
        contribution: Decimal::ZERO,
        contribution_timing: PaymentTiming::End,
    };
    let out = calculate_compound_interest(&input).unwrap().result;
    // 10000 x 1.05^5
    assert!((out.future_value - dec!(12762.82)).abs() < dec!(0.01), "got {}", out.future_value);
    assert_eq!(out.yearly.len(), 5);
    assert_eq!(out.yearly[4].closing_balance, out.future_value);
}

#[test]
fn test_more_frequent_compounding_grows_faster() {
    let mut values = Vec::new();
    for compounding in [
        Frequency::Annual,
        Frequency::SemiAnnual,
        Frequency::Quarterly,
        Frequency::Monthly,
        Frequency::Daily,
    ] {
        let input = CompoundInterestInput {
            principal: dec!(10000),
            annual_rate: dec!(0.05),
            years: dec!(5),
            compounding,
            contribution: Decimal::ZERO,
            contribution_timing: PaymentTiming::End,
        };
        values.push(calculate_compound_interest(&input).unwrap().result.future_value);
    }
    assert!(values.windows(2).all(|w| w[0] < w[1]), "{values:?}");
}

// ===========================================================================
// Deposits
// ===========================================================================

#[test]
fn test_monthly_apy_reference() {
    let value = apy(dec!(0.05), Frequency::Monthly);
    assert!((value - dec!(0.05116)).abs() < dec!(0.00001), "got {value}");
}

#[test]
fn test_cd_reports_apy_and_growth() {
    let input = CdInput {
        deposit: dec!(10000),
        annual_rate: dec!(0.05),
        term_months: 60,
        compounding: Frequency::Monthly,
        tax_rate: Decimal::ZERO,
        inflation_rate: None,
    };
    let out = calculate_cd(&input).unwrap().result;
    assert_eq!(out.apy, apy(dec!(0.05), Frequency::Monthly));
    assert_eq!(out.total_interest, out.maturity_value - dec!(10000));
    assert_eq!(out.after_tax_value, out.maturity_value);
}

// ===========================================================================
// Simple interest with events
// ===========================================================================

#[test]
fn test_prepayment_splits_accrual() {
    let input = SimpleScheduleInput {
        principal: dec!(10000),
        annual_rate: dec!(0.10),
        start_date: date(2025, 1, 1),
        end_date: date(2026, 1, 1),
        prepayments: vec![Prepayment {
            date: date(2025, 7, 2),
            amount: dec!(5000),
        }],
        rate_resets: vec![],
    };
    let out = simple_interest_schedule(&input).unwrap().result;
    assert_eq!(out.segments.len(), 2);
    assert_eq!(out.segments[0].days + out.segments[1].days, 365);
    let expected = dec!(10000) * dec!(0.10) * dec!(182) / dec!(365)
        + dec!(5000) * dec!(0.10) * dec!(183) / dec!(365);
    assert!((out.total_interest - expected).abs() < dec!(0.000001));
    assert_eq!(out.ending_balance, dec!(5000));
    assert_eq!(out.total_prepaid, dec!(5000));
}

#[test]
fn test_rate_reset_applies_from_its_date() {
    let input = SimpleScheduleInput {
        principal: dec!(10000),
        annual_rate: dec!(0.10),
        start_date: date(2025, 1, 1),
        end_date: date(2026, 1, 1),
        prepayments: vec![],
        rate_resets: vec![RateReset {
            date: date(2025, 7, 2),
            annual_rate: dec!(0.20),
        }],
    };
    let out = simple_interest_schedule(&input).unwrap().result;
    assert_eq!(out.segments[1].annual_rate, dec!(0.20));
    assert!(out.total_interest > dec!(1000));
}

#[test]
fn test_oversized_prepayment_is_capped() {
    let input = SimpleScheduleInput {
        principal: dec!(1000),
        annual_rate: dec!(0.10),
        start_date: date(2025, 1, 1),
        end_date: date(2026, 1, 1),
        prepayments: vec![Prepayment {
            date: date(2025, 3, 1),
            amount: dec!(5000),
        }],
        rate_resets: vec![],
    };
    let out = simple_interest_schedule(&input).unwrap();
    assert_eq!(out.result.total_prepaid, dec!(1000));
    assert_eq!(out.result.ending_balance, Decimal::ZERO);
    assert!(!out.warnings.is_empty());
}
