//! Rental property analysis: income ratios, leverage metrics and a
//! holding-period projection ending in a sale.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::monthly_payment;
use crate::time_value::{growth_factor, irr, remaining_balance};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SolverOutcome};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalPropertyInput {
    pub purchase_price: Money,
    pub down_payment: Money,
    #[serde(default)]
    pub closing_costs: Money,
    #[serde(default)]
    pub rehab_costs: Money,
    pub loan_rate: Rate,
    pub loan_term_years: u32,
    pub monthly_rent: Money,
    #[serde(default)]
    pub other_monthly_income: Money,
    /// Share of gross income lost to vacancy and collections
    #[serde(default)]
    pub vacancy_rate: Rate,
    /// Taxes, insurance, maintenance, management and other operating costs
    pub annual_operating_expenses: Money,
    #[serde(default)]
    pub annual_rent_growth: Rate,
    #[serde(default)]
    pub annual_expense_growth: Rate,
    #[serde(default)]
    pub annual_appreciation: Rate,
    pub holding_period_years: u32,
    /// Selling costs as a share of the sale price
    #[serde(default)]
    pub selling_cost_rate: Rate,
}

/// One year of the holding-period projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalYearRow {
    pub year: u32,
    pub gross_income: Money,
    pub effective_income: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    pub debt_service: Money,
    pub cash_flow: Money,
    pub property_value: Money,
    pub loan_balance: Money,
    pub equity: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalPropertyOutput {
    pub loan_amount: Money,
    pub monthly_mortgage_payment: Money,
    pub annual_debt_service: Money,
    pub gross_scheduled_income: Money,
    pub effective_gross_income: Money,
    /// Year-one net operating income
    pub noi: Money,
    /// NOI / purchase price
    pub cap_rate: Rate,
    /// Year-one NOI less debt service
    pub annual_cash_flow: Money,
    /// Down payment, closing and rehab costs
    pub total_cash_invested: Money,
    pub cash_on_cash_return: Rate,
    /// NOI / annual debt service; absent without debt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr: Option<Decimal>,
    /// Purchase price / annual gross rent
    pub gross_rent_multiplier: Decimal,
    pub operating_expense_ratio: Rate,
    /// Occupancy needed to cover expenses and debt service
    pub break_even_occupancy: Rate,
    pub net_sale_proceeds: Money,
    /// Annual IRR on invested cash including the sale
    pub irr: Rate,
    pub equity_multiple: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverOutcome>,
    pub projection: Vec<RentalYearRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyze a leveraged rental purchase.
pub fn analyze_rental_property(
    input: &RentalPropertyInput,
) -> FinCalcResult<ComputationOutput<RentalPropertyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let loan_amount = (input.purchase_price - input.down_payment).max(Decimal::ZERO);
    let term_months = input.loan_term_years * 12;
    let payment = monthly_payment(loan_amount, input.loan_rate, term_months);
    let annual_debt_service = payment * dec!(12);

    let gross_scheduled_income = (input.monthly_rent + input.other_monthly_income) * dec!(12);
    let effective_gross_income = gross_scheduled_income * (Decimal::ONE - input.vacancy_rate);
    let noi = effective_gross_income - input.annual_operating_expenses;
    let annual_cash_flow = noi - annual_debt_service;
    let total_cash_invested = input.down_payment + input.closing_costs + input.rehab_costs;

    let cap_rate = ratio(noi, input.purchase_price);
    let cash_on_cash_return = ratio(annual_cash_flow, total_cash_invested);
    let dscr = (annual_debt_service > Decimal::ZERO).then(|| noi / annual_debt_service);
    let gross_rent_multiplier = ratio(input.purchase_price, input.monthly_rent * dec!(12));
    let operating_expense_ratio = ratio(input.annual_operating_expenses, effective_gross_income);
    let break_even_occupancy = ratio(
        input.annual_operating_expenses + annual_debt_service,
        gross_scheduled_income,
    );

    if input.purchase_price <= Decimal::ZERO {
        warnings.push("Purchase price must be positive".into());
    }
    if total_cash_invested <= Decimal::ZERO {
        warnings.push("No cash invested; cash-on-cash return and IRR are not meaningful".into());
    }
    if dscr.is_some_and(|d| d < Decimal::ONE) {
        warnings.push("DSCR below 1.0: NOI does not cover debt service".into());
    }

    let projection = project(input, loan_amount, payment);
    let (net_sale_proceeds, irr_value, equity_multiple, solver) =
        exit_returns(input, &projection, total_cash_invested, &mut warnings)?;

    let output = RentalPropertyOutput {
        loan_amount,
        monthly_mortgage_payment: payment,
        annual_debt_service,
        gross_scheduled_income,
        effective_gross_income,
        noi,
        cap_rate,
        annual_cash_flow,
        total_cash_invested,
        cash_on_cash_return,
        dscr,
        gross_rent_multiplier,
        operating_expense_ratio,
        break_even_occupancy,
        net_sale_proceeds,
        irr: irr_value,
        equity_multiple,
        solver,
        projection,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Rental property: cap rate, cash-on-cash, DSCR, GRM and holding-period IRR",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

fn project(input: &RentalPropertyInput, loan_amount: Money, payment: Money) -> Vec<RentalYearRow> {
    let monthly_rate = input.loan_rate / dec!(12);
    let term_months = input.loan_term_years * 12;

    (1..=input.holding_period_years)
        .map(|year| {
            let grown = year - 1;
            let gross_income = (input.monthly_rent + input.other_monthly_income)
                * dec!(12)
                * growth_factor(input.annual_rent_growth, grown);
            let effective_income = gross_income * (Decimal::ONE - input.vacancy_rate);
            let operating_expenses =
                input.annual_operating_expenses * growth_factor(input.annual_expense_growth, grown);
            let noi = effective_income - operating_expenses;

            let months_paid = (year * 12).min(term_months);
            let debt_service = payment * Decimal::from(months_paid - (grown * 12).min(term_months));
            let loan_balance = if months_paid >= term_months {
                Decimal::ZERO
            } else {
                remaining_balance(loan_amount, monthly_rate, payment, months_paid)
            };
            let property_value =
                input.purchase_price * growth_factor(input.annual_appreciation, year);

            RentalYearRow {
                year,
                gross_income,
                effective_income,
                operating_expenses,
                noi,
                debt_service,
                cash_flow: noi - debt_service,
                property_value,
                loan_balance,
                equity: property_value - loan_balance,
            }
        })
        .collect()
}

type ExitReturns = (Money, Rate, Decimal, Option<SolverOutcome>);

fn exit_returns(
    input: &RentalPropertyInput,
    projection: &[RentalYearRow],
    invested: Money,
    warnings: &mut Vec<String>,
) -> FinCalcResult<ExitReturns> {
    let Some(last) = projection.last() else {
        warnings.push("Holding period is zero; no sale modelled".into());
        return Ok((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, None));
    };

    let net_sale_proceeds =
        last.property_value * (Decimal::ONE - input.selling_cost_rate) - last.loan_balance;

    let mut flows = Vec::with_capacity(projection.len() + 1);
    flows.push(-invested);
    flows.extend(projection.iter().map(|row| row.cash_flow));
    if let Some(final_flow) = flows.last_mut() {
        *final_flow += net_sale_proceeds;
    }

    let distributions: Money = flows.iter().skip(1).copied().sum();
    let equity_multiple = ratio(distributions, invested);

    if invested <= Decimal::ZERO {
        return Ok((net_sale_proceeds, Decimal::ZERO, equity_multiple, None));
    }

    let outcome = irr(&flows, dec!(0.10))?;
    if !outcome.converged {
        warnings.push("IRR did not converge; value is a best estimate".into());
    }
    Ok((net_sale_proceeds, outcome.value, equity_multiple, Some(outcome)))
}
