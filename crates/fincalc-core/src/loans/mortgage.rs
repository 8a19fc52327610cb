//! Home mortgage: principal & interest from the amortization engine plus
//! property tax, homeowners insurance, HOA dues and private mortgage
//! insurance (PMI).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::amortization::{amortize_loan, AmortizationOutput, ExtraPayment, LoanInput, RateChange};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// PMI is charged while the loan balance exceeds this share of the home price.
const PMI_LTV_THRESHOLD: Decimal = dec!(0.80);

/// Input parameters for a mortgage quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub home_price: Money,
    pub down_payment: Money,
    pub annual_rate: Rate,
    pub term_years: u32,
    pub start_date: NaiveDate,
    /// Annual property tax as a fraction of the home price
    #[serde(default)]
    pub property_tax_rate: Rate,
    #[serde(default)]
    pub annual_insurance: Money,
    #[serde(default)]
    pub monthly_hoa: Money,
    /// Annual PMI premium as a fraction of the original loan amount
    #[serde(default)]
    pub pmi_rate: Rate,
    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
    #[serde(default)]
    pub rate_changes: Vec<RateChange>,
}

/// Output of the mortgage calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub loan_amount: Money,
    pub loan_to_value: Rate,
    pub monthly_principal_interest: Money,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
    pub monthly_hoa: Money,
    /// PMI charged in the first month (zero if LTV is already at or below 80%)
    pub monthly_pmi: Money,
    /// Principal, interest, tax, insurance, HOA and PMI for the first month
    pub total_monthly_payment: Money,
    pub pmi_months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmi_end_date: Option<NaiveDate>,
    pub total_pmi: Money,
    pub total_interest: Money,
    /// Down payment plus every payment made until payoff
    pub total_cost: Money,
    pub amortization: AmortizationOutput,
}

/// Quote a mortgage including escrowed costs and PMI.
pub fn calculate_mortgage(input: &MortgageInput) -> FinCalcResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let loan_amount = (input.home_price - input.down_payment).max(Decimal::ZERO);
    if input.down_payment > input.home_price {
        warnings.push("Down payment exceeds home price; no loan required".into());
    }

    let loan = LoanInput {
        principal: loan_amount,
        annual_rate: input.annual_rate,
        term_months: input.term_years * 12,
        start_date: input.start_date,
        extra_payments: input.extra_payments.clone(),
        rate_changes: input.rate_changes.clone(),
    };
    let amortized = amortize_loan(&loan)?;
    warnings.extend(amortized.warnings);
    let amortization = amortized.result;

    let loan_to_value = if input.home_price > Decimal::ZERO {
        loan_amount / input.home_price
    } else {
        Decimal::ZERO
    };

    let monthly_property_tax = input.home_price * input.property_tax_rate / dec!(12);
    let monthly_insurance = input.annual_insurance / dec!(12);
    let pmi_premium = loan_amount * input.pmi_rate / dec!(12);
    let pmi_balance_limit = input.home_price * PMI_LTV_THRESHOLD;

    // PMI is due for every month that starts above the LTV threshold
    let pmi_rows: Vec<_> = amortization
        .schedule
        .iter()
        .take_while(|row| row.beginning_balance > pmi_balance_limit)
        .collect();
    let pmi_months = if pmi_premium > Decimal::ZERO {
        pmi_rows.len() as u32
    } else {
        0
    };
    let pmi_end_date = if pmi_months > 0 {
        pmi_rows.last().map(|row| row.date)
    } else {
        None
    };
    let monthly_pmi = if pmi_months > 0 { pmi_premium } else { Decimal::ZERO };
    let total_pmi = pmi_premium * Decimal::from(pmi_months);

    let monthly_principal_interest = amortization.monthly_payment;
    let total_monthly_payment = monthly_principal_interest
        + monthly_property_tax
        + monthly_insurance
        + input.monthly_hoa
        + monthly_pmi;

    let escrow_months = Decimal::from(amortization.payoff_months);
    let total_cost = input.down_payment.min(input.home_price)
        + amortization.total_payment
        + (monthly_property_tax + monthly_insurance + input.monthly_hoa) * escrow_months
        + total_pmi;

    let output = MortgageOutput {
        loan_amount,
        loan_to_value,
        monthly_principal_interest,
        monthly_property_tax,
        monthly_insurance,
        monthly_hoa: input.monthly_hoa,
        monthly_pmi,
        total_monthly_payment,
        pmi_months,
        pmi_end_date,
        total_pmi,
        total_interest: amortization.total_interest,
        total_cost,
        amortization,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Mortgage PITI with PMI until loan balance reaches 80% of purchase price",
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

    fn sample() -> MortgageInput {
        MortgageInput {
            home_price: dec!(400000),
            down_payment: dec!(40000),
            annual_rate: dec!(0.065),
            term_years: 30,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            property_tax_rate: dec!(0.012),
            annual_insurance: dec!(1800),
            monthly_hoa: dec!(50),
            pmi_rate: dec!(0.005),
            extra_payments: vec![],
            rate_changes: vec![],
        }
    }

    #[test]
    fn test_piti_components() {
        let out = calculate_mortgage(&sample()).unwrap().result;
        assert_eq!(out.loan_amount, dec!(360000));
        assert_eq!(out.loan_to_value, dec!(0.9));
        assert_eq!(out.monthly_property_tax, dec!(400));
        assert_eq!(out.monthly_insurance, dec!(150));
        assert_eq!(out.monthly_pmi, dec!(150));
        // P&I on 360k at 6.5% for 30 years ≈ 2275.44
        assert!((out.monthly_principal_interest - dec!(2275.44)).abs() < dec!(0.01));
        assert_eq!(
            out.total_monthly_payment,
            out.monthly_principal_interest + dec!(400) + dec!(150) + dec!(50) + dec!(150)
        );
    }

    #[test]
    fn test_pmi_stops_at_eighty_percent_ltv() {
        let out = calculate_mortgage(&sample()).unwrap().result;
        assert!(out.pmi_months > 0 && out.pmi_months < 360);
        let next = &out.amortization.schedule[out.pmi_months as usize];
        assert!(next.beginning_balance <= dec!(320000));
        assert_eq!(out.total_pmi, dec!(150) * Decimal::from(out.pmi_months));
    }

    #[test]
    fn test_twenty_percent_down_has_no_pmi() {
        let mut input = sample();
        input.down_payment = dec!(80000);
        let out = calculate_mortgage(&input).unwrap().result;
        assert_eq!(out.pmi_months, 0);
        assert_eq!(out.monthly_pmi, Decimal::ZERO);
        assert!(out.pmi_end_date.is_none());
    }

    #[test]
    fn test_cash_purchase_has_empty_schedule() {
        let mut input = sample();
        input.down_payment = dec!(400000);
        let out = calculate_mortgage(&input).unwrap();
        assert_eq!(out.result.loan_amount, Decimal::ZERO);
        assert!(out.result.amortization.schedule.is_empty());
        assert!(!out.warnings.is_empty());
    }
}
