#![cfg(feature = "ratios")]

use fincalc_core::ratios::dti::{calculate_dti, DtiBand, DtiInput};
use fincalc_core::ratios::real_estate::{analyze_rental_property, RentalPropertyInput};
use fincalc_core::ratios::refinance::{break_even_months, compare_refinance, RefinanceInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Debt-to-income
// ===========================================================================

#[test]
fn test_dti_reference_ratios() {
    let input = DtiInput {
        gross_monthly_income: dec!(5000),
        monthly_housing_payment: dec!(1500),
        other_monthly_debts: dec!(600),
    };
    let out = calculate_dti(&input).unwrap().result;
    assert_eq!(out.front_end_ratio, dec!(0.30));
    assert_eq!(out.back_end_ratio, dec!(0.42));
    assert_eq!(out.band, DtiBand::Manageable);
    assert!(!out.within_limits);
}

#[test]
fn test_dti_zero_income_is_degenerate() {
    let json = r#"{ "gross_monthly_income": "0", "monthly_housing_payment": "1200" }"#;
    let input: DtiInput = serde_json::from_str(json).unwrap();
    let out = calculate_dti(&input).unwrap();
    assert_eq!(out.result.front_end_ratio, Decimal::ZERO);
    assert!(!out.warnings.is_empty());
}

// ===========================================================================
// Refinance
// ===========================================================================

#[test]
fn test_refinance_break_even_reference() {
    assert_eq!(break_even_months(dec!(5000), dec!(150)), Some(34));
}

#[test]
fn test_refinance_from_json() {
    let json = r#"{
        "current_balance": "250000",
        "current_rate": "0.0725",
        "remaining_months": 330,
        "new_rate": "0.06",
        "new_term_months": 330,
        "closing_costs": "5000"
    }"#;
    let input: RefinanceInput = serde_json::from_str(json).unwrap();
    let out = compare_refinance(&input).unwrap().result;
    assert!(out.monthly_savings > Decimal::ZERO);
    assert_eq!(
        out.break_even_months,
        break_even_months(dec!(5000), out.monthly_savings)
    );
    assert!(out.worth_it);
}

// ===========================================================================
// Rental property
// ===========================================================================

fn rental() -> RentalPropertyInput {
    RentalPropertyInput {
        purchase_price: dec!(300000),
        down_payment: dec!(60000),
        closing_costs: dec!(6000),
        rehab_costs: Decimal::ZERO,
        loan_rate: dec!(0.065),
        loan_term_years: 30,
        monthly_rent: dec!(2500),
        other_monthly_income: Decimal::ZERO,
        vacancy_rate: dec!(0.05),
        annual_operating_expenses: dec!(9000),
        annual_rent_growth: dec!(0.03),
        annual_expense_growth: dec!(0.02),
        annual_appreciation: dec!(0.03),
        holding_period_years: 5,
        selling_cost_rate: dec!(0.06),
    }
}

#[test]
fn test_rental_year_one_metrics() {
    let out = analyze_rental_property(&rental()).unwrap().result;
    // 30000 x 0.95 - 9000
    assert_eq!(out.noi, dec!(19500));
    assert_eq!(out.cap_rate, dec!(0.065));
    assert_eq!(out.gross_rent_multiplier, dec!(10));
    assert_eq!(out.total_cash_invested, dec!(66000));
    assert_eq!(out.annual_cash_flow, out.noi - out.annual_debt_service);
    let dscr = out.dscr.unwrap();
    assert_eq!(dscr, out.noi / out.annual_debt_service);
    assert_eq!(out.projection.len(), 5);
}

#[test]
fn test_cash_purchase_has_no_dscr() {
    let mut input = rental();
    input.down_payment = input.purchase_price;
    let out = analyze_rental_property(&input).unwrap().result;
    assert!(out.dscr.is_none());
    assert_eq!(out.annual_debt_service, Decimal::ZERO);
    assert_eq!(out.annual_cash_flow, out.noi);
}
