#![cfg(feature = "tvm")]

use fincalc_core::periods::{Frequency, PaymentTiming};
use fincalc_core::tvm::{solve, SolveFor, TvmInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn base(solve_for: SolveFor) -> TvmInput {
    TvmInput {
        solve_for,
        present_value: dec!(10000),
        future_value: Decimal::ZERO,
        payment: dec!(100),
        annual_rate: dec!(0.06),
        periods: dec!(120),
        compounding: Frequency::Monthly,
        timing: PaymentTiming::End,
        start_date: None,
    }
}

fn assert_relative(actual: Decimal, expected: Decimal, tol: Decimal, what: &str) {
    let scale = expected.abs().max(Decimal::ONE);
    assert!(
        (actual - expected).abs() / scale < tol,
        "{what}: expected {expected}, got {actual}"
    );
}

/// Solve FV, feed it back and solve PV: the original PV must come back.
fn round_trip(mut input: TvmInput) {
    input.solve_for = SolveFor::FutureValue;
    let fv = solve(&input).unwrap().result.future_value;

    let original_pv = input.present_value;
    input.solve_for = SolveFor::PresentValue;
    input.future_value = fv;
    input.present_value = Decimal::ZERO;
    let pv = solve(&input).unwrap().result.present_value;

    assert_relative(pv, original_pv, dec!(0.000001), "round-trip PV");
}

// ===========================================================================
// Round trips
// ===========================================================================

#[test]
fn test_round_trip_monthly_savings() {
    round_trip(base(SolveFor::FutureValue));
}

#[test]
fn test_round_trip_begin_timing() {
    let mut input = base(SolveFor::FutureValue);
    input.timing = PaymentTiming::Begin;
    round_trip(input);
}

#[test]
fn test_round_trip_zero_rate() {
    let mut input = base(SolveFor::FutureValue);
    input.annual_rate = Decimal::ZERO;
    round_trip(input);
}

#[test]
fn test_round_trip_quarterly_fractional_periods() {
    let mut input = base(SolveFor::FutureValue);
    input.compounding = Frequency::Quarterly;
    input.periods = dec!(30.5);
    input.annual_rate = dec!(0.085);
    round_trip(input);
}

#[test]
fn test_round_trip_loan_signs() {
    let mut input = base(SolveFor::FutureValue);
    input.present_value = dec!(25000);
    input.payment = dec!(-400);
    input.periods = dec!(60);
    round_trip(input);
}

// ===========================================================================
// Cross-checks between solvers
// ===========================================================================

#[test]
fn test_pmt_then_rate_recovers_rate() {
    let mut input = base(SolveFor::Payment);
    input.present_value = dec!(200000);
    input.future_value = Decimal::ZERO;
    input.annual_rate = dec!(0.05);
    input.periods = dec!(360);
    let pmt = solve(&input).unwrap().result.payment;
    assert_relative(pmt, dec!(-1073.64), dec!(0.00001), "payment");

    input.solve_for = SolveFor::Rate;
    input.payment = pmt;
    input.annual_rate = Decimal::ZERO;
    let out = solve(&input).unwrap().result;
    assert!(out.solver.unwrap().converged);
    assert!((out.annual_rate - dec!(0.05)).abs() < dec!(0.00001), "rate {}", out.annual_rate);
}

#[test]
fn test_fv_then_periods_recovers_count() {
    let input = base(SolveFor::FutureValue);
    let fv = solve(&input).unwrap().result.future_value;

    let mut periods = base(SolveFor::Periods);
    periods.future_value = fv;
    periods.periods = Decimal::ZERO;
    let out = solve(&periods).unwrap().result;
    assert!((out.periods - dec!(120)).abs() < dec!(0.0001), "periods {}", out.periods);
}

#[test]
fn test_output_serializes_with_snake_case_tags() {
    let out = solve(&base(SolveFor::FutureValue)).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["result"]["solve_for"], "future_value");
    assert_eq!(json["assumptions"]["compounding"], "monthly");
}
