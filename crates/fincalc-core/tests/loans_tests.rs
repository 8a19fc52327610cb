#![cfg(feature = "loans")]

use chrono::NaiveDate;
use fincalc_core::loans::amortization::{
    amortize_loan, ExtraPayment, ExtraPaymentKind, LoanInput, RateChange,
};
use fincalc_core::loans::apr::{calculate_apr, AprInput};
use fincalc_core::loans::mortgage::{calculate_mortgage, MortgageInput};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loan(principal: Decimal, annual_rate: Decimal, term_months: u32) -> LoanInput {
    LoanInput {
        principal,
        annual_rate,
        term_months,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        extra_payments: vec![],
        rate_changes: vec![],
    }
}

// ===========================================================================
// Reference scenario
// ===========================================================================

#[test]
fn test_thirty_year_five_percent_reference() {
    let out = amortize_loan(&loan(dec!(200000), dec!(0.05), 360)).unwrap().result;

    let first = &out.schedule[0];
    // 200000 x 0.05 / 12 = 833.33
    assert!(
        (first.interest - dec!(833.33)).abs() < dec!(0.01),
        "first interest {}",
        first.interest
    );
    assert!(
        (out.monthly_payment - dec!(1073.64)).abs() < dec!(0.01),
        "payment {}",
        out.monthly_payment
    );
    assert_eq!(out.schedule.len(), 360);
    assert_eq!(out.schedule.last().unwrap().ending_balance, Decimal::ZERO);
}

// ===========================================================================
// Schedule invariants
// ===========================================================================

fn messy_loan() -> LoanInput {
    let mut input = loan(dec!(250000), dec!(0.065), 360);
    input.extra_payments = vec![
        ExtraPayment {
            kind: ExtraPaymentKind::RecurringMonthly,
            amount: dec!(200),
            start_month: 13,
            end_month: None,
        },
        ExtraPayment {
            kind: ExtraPaymentKind::OneTime,
            amount: dec!(15000),
            start_month: 60,
            end_month: None,
        },
    ];
    input.rate_changes = vec![
        RateChange {
            effective_month: 61,
            annual_rate: dec!(0.0725),
        },
        RateChange {
            effective_month: 121,
            annual_rate: dec!(0.055),
        },
    ];
    input
}

#[test]
fn test_principal_sums_to_loan_amount() {
    for input in [loan(dec!(200000), dec!(0.05), 360), messy_loan()] {
        let out = amortize_loan(&input).unwrap().result;
        let repaid: Decimal = out.schedule.iter().map(|r| r.principal).sum();
        assert!(
            (repaid - input.principal).abs() < dec!(0.000001),
            "repaid {} of {}",
            repaid,
            input.principal
        );
    }
}

#[test]
fn test_balance_never_increases_and_ends_at_zero() {
    let out = amortize_loan(&messy_loan()).unwrap().result;
    for pair in out.schedule.windows(2) {
        assert!(pair[1].ending_balance <= pair[0].ending_balance);
        assert_eq!(pair[1].beginning_balance, pair[0].ending_balance);
    }
    assert_eq!(out.schedule.last().unwrap().ending_balance, Decimal::ZERO);
    assert!(out.payoff_months < 360);
    assert_eq!(out.months_saved, 360 - out.payoff_months);
}

#[test]
fn test_payment_splits_into_principal_and_interest() {
    let out = amortize_loan(&messy_loan()).unwrap().result;
    for row in &out.schedule {
        assert_eq!(row.payment, row.principal + row.interest);
    }
}

#[test]
fn test_same_rate_change_is_idempotent() {
    let base = loan(dec!(180000), dec!(0.045), 240);
    let mut with_change = base.clone();
    with_change.rate_changes.push(RateChange {
        effective_month: 48,
        annual_rate: dec!(0.045),
    });

    let plain = amortize_loan(&base).unwrap().result;
    let changed = amortize_loan(&with_change).unwrap().result;
    assert_eq!(plain.schedule, changed.schedule);
}

#[test]
fn test_zero_rate_boundary() {
    let out = amortize_loan(&loan(dec!(12000), Decimal::ZERO, 360)).unwrap().result;
    assert_eq!(out.monthly_payment, dec!(12000) / dec!(360));
    assert_eq!(out.total_interest, Decimal::ZERO);
    assert_eq!(out.schedule.last().unwrap().ending_balance, Decimal::ZERO);
}

#[test]
fn test_first_installment_clamps_to_month_end() {
    let out = amortize_loan(&loan(dec!(10000), dec!(0.06), 12)).unwrap().result;
    assert_eq!(out.schedule[0].date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    assert_eq!(out.schedule[1].date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
}

// ===========================================================================
// Degenerate input
// ===========================================================================

#[test]
fn test_zero_principal_returns_empty_schedule() {
    let out = amortize_loan(&loan(Decimal::ZERO, dec!(0.05), 360)).unwrap();
    assert!(out.result.schedule.is_empty());
    assert_eq!(out.result.total_payment, Decimal::ZERO);
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_events_beyond_payoff_are_ignored() {
    let mut input = loan(dec!(5000), dec!(0.05), 12);
    input.rate_changes.push(RateChange {
        effective_month: 40,
        annual_rate: dec!(0.09),
    });
    let out = amortize_loan(&input).unwrap();
    assert_eq!(out.result.schedule.len(), 12);
    assert!(out.result.schedule.iter().all(|r| r.annual_rate == dec!(0.05)));
}

// ===========================================================================
// Built on the engine
// ===========================================================================

#[test]
fn test_mortgage_uses_amortization_payment() {
    let input = MortgageInput {
        home_price: dec!(250000),
        down_payment: dec!(50000),
        annual_rate: dec!(0.05),
        term_years: 30,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        property_tax_rate: Decimal::ZERO,
        annual_insurance: Decimal::ZERO,
        monthly_hoa: Decimal::ZERO,
        pmi_rate: Decimal::ZERO,
        extra_payments: vec![],
        rate_changes: vec![],
    };
    let mortgage = calculate_mortgage(&input).unwrap().result;
    let direct = amortize_loan(&loan(dec!(200000), dec!(0.05), 360)).unwrap().result;
    assert_eq!(mortgage.monthly_principal_interest, direct.monthly_payment);
    assert_eq!(mortgage.total_monthly_payment, direct.monthly_payment);
}

#[test]
fn test_apr_from_json_input() {
    let json = r#"{
        "loan_amount": "200000",
        "annual_rate": "0.06",
        "term_months": 360,
        "upfront_fees": "4000"
    }"#;
    let input: AprInput = serde_json::from_str(json).unwrap();
    assert!(!input.fees_financed);
    let out = calculate_apr(&input).unwrap().result;
    assert!(out.apr > dec!(0.06) && out.apr < dec!(0.0625));
}
