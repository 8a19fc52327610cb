use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;

use fincalc_core::{ComputationOutput, FinCalcResult};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run the calculator and serialize its envelope.
fn run_json<I, O>(
    input_json: &str,
    calculate: impl FnOnce(&I) -> FinCalcResult<ComputationOutput<O>>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| napi::Error::from_reason(format!("Invalid {field} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize_loan(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::amortization::amortize_loan)
}

/// Level monthly payment; decimal strings in and out.
#[napi]
pub fn monthly_payment(principal: String, annual_rate: String, term_months: u32) -> NapiResult<String> {
    let principal = parse_decimal("principal", &principal)?;
    let annual_rate = parse_decimal("annual_rate", &annual_rate)?;
    Ok(fincalc_core::loans::amortization::monthly_payment(principal, annual_rate, term_months).to_string())
}

#[napi]
pub fn calculate_mortgage(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::mortgage::calculate_mortgage)
}

#[napi]
pub fn calculate_apr(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::apr::calculate_apr)
}

#[napi]
pub fn calculate_lease(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::lease::calculate_lease)
}

// ---------------------------------------------------------------------------
// Time value of money
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_tvm(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::tvm::solve)
}

// ---------------------------------------------------------------------------
// Fixed income
// ---------------------------------------------------------------------------

#[napi]
pub fn value_bond(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::fixed_income::bonds::value_bond)
}

// ---------------------------------------------------------------------------
// Interest and deposits
// ---------------------------------------------------------------------------

#[napi]
pub fn simple_interest(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::interest::simple::calculate_simple_interest)
}

#[napi]
pub fn simple_interest_schedule(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::interest::simple::simple_interest_schedule)
}

#[napi]
pub fn compound_interest(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::interest::compound::calculate_compound_interest)
}

#[napi]
pub fn calculate_cd(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::interest::deposits::calculate_cd)
}

#[napi]
pub fn recurring_deposit(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::interest::deposits::calculate_recurring_deposit)
}

// ---------------------------------------------------------------------------
// Investments
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_lumpsum(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::investments::lumpsum::calculate_lumpsum)
}

#[napi]
pub fn calculate_sip(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::investments::sip::calculate_sip)
}

#[napi]
pub fn plan_goal(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::investments::goal::plan_goal)
}

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_dti(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::ratios::dti::calculate_dti)
}

#[napi]
pub fn analyze_rental_property(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::ratios::real_estate::analyze_rental_property)
}

#[napi]
pub fn compare_refinance(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::ratios::refinance::compare_refinance)
}

/// Months to recover closing costs, or null when they are never recovered.
#[napi]
pub fn refinance_break_even(closing_costs: String, monthly_savings: String) -> NapiResult<Option<u32>> {
    let closing_costs = parse_decimal("closing_costs", &closing_costs)?;
    let monthly_savings = parse_decimal("monthly_savings", &monthly_savings)?;
    Ok(fincalc_core::ratios::refinance::break_even_months(closing_costs, monthly_savings))
}

#[napi]
pub fn calculate_chit_fund(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::ratios::chit_fund::calculate_chit_fund)
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_income_tax(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::tax::income_tax::calculate_income_tax)
}
