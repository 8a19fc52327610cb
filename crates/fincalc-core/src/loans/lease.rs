//! Closed-end (auto) lease payment using the money-factor convention.
//!
//! The monthly charge is a straight-line depreciation fee from the adjusted
//! capitalized cost down to the residual, plus a rent charge of
//! `(cap cost + residual) x money factor`, plus sales tax on both.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for a lease quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseInput {
    /// Negotiated vehicle price (gross capitalized cost before fees)
    pub vehicle_price: Money,
    /// Fees rolled into the capitalized cost (acquisition fee etc.)
    #[serde(default)]
    pub capitalized_fees: Money,
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub trade_in_value: Money,
    /// Value of the vehicle at lease end
    pub residual_value: Money,
    /// Money factor; takes precedence over `annual_rate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money_factor: Option<Decimal>,
    /// Equivalent annual rate, converted with money factor = rate / 24
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Rate>,
    pub term_months: u32,
    #[serde(default)]
    pub sales_tax_rate: Rate,
}

/// One month of the lease balance run-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseScheduleRow {
    pub month: u32,
    pub beginning_balance: Money,
    pub depreciation: Money,
    pub rent_charge: Money,
    pub tax: Money,
    pub payment: Money,
    pub ending_balance: Money,
}

/// Output of the lease calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseOutput {
    pub adjusted_cap_cost: Money,
    pub money_factor: Decimal,
    /// Money factor expressed as an annual rate (x 24)
    pub equivalent_annual_rate: Rate,
    pub monthly_depreciation: Money,
    pub monthly_rent_charge: Money,
    pub base_payment: Money,
    pub monthly_tax: Money,
    pub monthly_payment: Money,
    /// Payments plus amounts due at signing
    pub total_lease_cost: Money,
    pub total_rent_charges: Money,
    pub schedule: Vec<LeaseScheduleRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Quote a lease payment and its monthly run-off schedule.
pub fn calculate_lease(input: &LeaseInput) -> FinCalcResult<ComputationOutput<LeaseOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let money_factor = match (input.money_factor, input.annual_rate) {
        (Some(mf), _) => mf,
        (None, Some(rate)) => rate / dec!(24),
        (None, None) => {
            warnings.push("No money factor or rate supplied; assuming zero rent charge".into());
            Decimal::ZERO
        }
    };

    let adjusted_cap_cost =
        input.vehicle_price + input.capitalized_fees - input.down_payment - input.trade_in_value;

    let output = if input.term_months == 0 || adjusted_cap_cost <= Decimal::ZERO {
        warnings.push("Term and adjusted capitalized cost must be positive; lease not applicable".into());
        LeaseOutput {
            adjusted_cap_cost: adjusted_cap_cost.max(Decimal::ZERO),
            money_factor,
            equivalent_annual_rate: money_factor * dec!(24),
            monthly_depreciation: Decimal::ZERO,
            monthly_rent_charge: Decimal::ZERO,
            base_payment: Decimal::ZERO,
            monthly_tax: Decimal::ZERO,
            monthly_payment: Decimal::ZERO,
            total_lease_cost: Decimal::ZERO,
            total_rent_charges: Decimal::ZERO,
            schedule: Vec::new(),
        }
    } else {
        if input.residual_value > adjusted_cap_cost {
            warnings.push(
                "Residual exceeds adjusted cap cost; depreciation fee is negative".into(),
            );
        }
        build_lease(input, adjusted_cap_cost, money_factor)
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Closed-end lease: depreciation fee + rent charge (money factor) + sales tax",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn build_lease(input: &LeaseInput, adjusted_cap_cost: Money, money_factor: Decimal) -> LeaseOutput {
    let term = Decimal::from(input.term_months);
    let monthly_depreciation = (adjusted_cap_cost - input.residual_value) / term;
    let monthly_rent_charge = (adjusted_cap_cost + input.residual_value) * money_factor;
    let base_payment = monthly_depreciation + monthly_rent_charge;
    let monthly_tax = base_payment * input.sales_tax_rate;
    let monthly_payment = base_payment + monthly_tax;

    let mut schedule = Vec::with_capacity(input.term_months as usize);
    let mut balance = adjusted_cap_cost;
    for month in 1..=input.term_months {
        let beginning_balance = balance;
        balance = if month == input.term_months {
            input.residual_value
        } else {
            balance - monthly_depreciation
        };
        schedule.push(LeaseScheduleRow {
            month,
            beginning_balance,
            depreciation: monthly_depreciation,
            rent_charge: monthly_rent_charge,
            tax: monthly_tax,
            payment: monthly_payment,
            ending_balance: balance,
        });
    }

    LeaseOutput {
        adjusted_cap_cost,
        money_factor,
        equivalent_annual_rate: money_factor * dec!(24),
        monthly_depreciation,
        monthly_rent_charge,
        base_payment,
        monthly_tax,
        monthly_payment,
        total_lease_cost: monthly_payment * term + input.down_payment + input.trade_in_value,
        total_rent_charges: monthly_rent_charge * term,
        schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> LeaseInput {
        LeaseInput {
            vehicle_price: dec!(30000),
            capitalized_fees: dec!(0),
            down_payment: dec!(2000),
            trade_in_value: dec!(0),
            residual_value: dec!(16000),
            money_factor: Some(dec!(0.0025)),
            annual_rate: None,
            term_months: 36,
            sales_tax_rate: dec!(0),
        }
    }

    #[test]
    fn test_textbook_lease_payment() {
        let out = calculate_lease(&sample()).unwrap().result;
        // Depreciation: (28000 - 16000) / 36 = 333.33; rent: 44000 * 0.0025 = 110
        assert!((out.monthly_depreciation - dec!(333.3333)).abs() < dec!(0.001));
        assert_eq!(out.monthly_rent_charge, dec!(110));
        assert!((out.monthly_payment - dec!(443.3333)).abs() < dec!(0.001));
        assert_eq!(out.equivalent_annual_rate, dec!(0.06));
    }

    #[test]
    fn test_rate_converts_to_money_factor() {
        let mut input = sample();
        input.money_factor = None;
        input.annual_rate = Some(dec!(0.06));
        let out = calculate_lease(&input).unwrap().result;
        assert_eq!(out.money_factor, dec!(0.0025));
    }

    #[test]
    fn test_sales_tax_applied_to_base_payment() {
        let mut input = sample();
        input.sales_tax_rate = dec!(0.08);
        let out = calculate_lease(&input).unwrap().result;
        assert_eq!(out.monthly_tax, out.base_payment * dec!(0.08));
    }

    #[test]
    fn test_schedule_runs_off_to_residual() {
        let out = calculate_lease(&sample()).unwrap().result;
        assert_eq!(out.schedule.len(), 36);
        assert_eq!(out.schedule.last().unwrap().ending_balance, dec!(16000));
    }

    #[test]
    fn test_down_payment_covering_price_is_not_applicable() {
        let mut input = sample();
        input.down_payment = dec!(30000);
        let out = calculate_lease(&input).unwrap();
        assert!(out.result.schedule.is_empty());
        assert!(!out.warnings.is_empty());
    }
}
