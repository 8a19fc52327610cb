use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::ratios::chit_fund::{self, ChitFundInput};
use fincalc_core::ratios::dti::{self, DtiInput};
use fincalc_core::ratios::real_estate::{self, RentalPropertyInput};
use fincalc_core::ratios::refinance::{self, RefinanceInput};

use crate::input;

/// Arguments for debt-to-income ratios
#[derive(Args)]
pub struct DtiArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross monthly income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Monthly housing payment
    #[arg(long)]
    pub housing: Option<Decimal>,

    /// Other monthly debt payments
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub other_debts: Decimal,
}

pub fn run_dti(args: DtiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dti_input: DtiInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => DtiInput {
            gross_monthly_income: args.income.ok_or("--income is required (or provide --input)")?,
            monthly_housing_payment: args
                .housing
                .ok_or("--housing is required (or provide --input)")?,
            other_monthly_debts: args.other_debts,
        },
    };
    let result = dti::calculate_dti(&dti_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for rental property analysis
#[derive(Args)]
pub struct RentalArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_rental_property(args: RentalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rental_input: RentalPropertyInput =
        input::require(args.input.as_deref(), "rental property analysis")?;
    let result = real_estate::analyze_rental_property(&rental_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for refinance comparison
#[derive(Args)]
pub struct RefinanceArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Current annual rate as a decimal
    #[arg(long)]
    pub current_rate: Option<Decimal>,

    #[arg(long)]
    pub remaining_months: Option<u32>,

    /// New annual rate as a decimal
    #[arg(long)]
    pub new_rate: Option<Decimal>,

    #[arg(long)]
    pub new_term_months: Option<u32>,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub closing_costs: Decimal,

    /// Roll closing costs into the new loan
    #[arg(long)]
    pub finance_costs: bool,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub cash_out: Decimal,
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let refi_input: RefinanceInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => refinance_from_flags(&args)?,
    };
    let result = refinance::compare_refinance(&refi_input)?;
    Ok(serde_json::to_value(result)?)
}

/// The new term defaults to the months left on the current loan.
fn refinance_from_flags(args: &RefinanceArgs) -> Result<RefinanceInput, Box<dyn std::error::Error>> {
    let remaining_months = args
        .remaining_months
        .ok_or("--remaining-months is required (or provide --input)")?;
    Ok(RefinanceInput {
        current_balance: args
            .balance
            .ok_or("--balance is required (or provide --input)")?,
        current_rate: args
            .current_rate
            .ok_or("--current-rate is required (or provide --input)")?,
        remaining_months,
        new_rate: args.new_rate.ok_or("--new-rate is required (or provide --input)")?,
        new_term_months: args.new_term_months.unwrap_or(remaining_months),
        closing_costs: args.closing_costs,
        finance_closing_costs: args.finance_costs,
        cash_out: args.cash_out,
    })
}

/// Arguments for chit fund analysis
#[derive(Args)]
pub struct ChitFundArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_chit_fund(args: ChitFundArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let chit_input: ChitFundInput = input::require(args.input.as_deref(), "chit fund analysis")?;
    let result = chit_fund::calculate_chit_fund(&chit_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags() -> RefinanceArgs {
        RefinanceArgs {
            input: None,
            balance: Some(dec!(250000)),
            current_rate: Some(dec!(0.0725)),
            remaining_months: Some(330),
            new_rate: Some(dec!(0.06)),
            new_term_months: None,
            closing_costs: dec!(5000),
            finance_costs: false,
            cash_out: Decimal::ZERO,
        }
    }

    #[test]
    fn test_new_term_defaults_to_remaining() {
        let built = refinance_from_flags(&flags()).unwrap();
        assert_eq!(built.new_term_months, 330);
        assert_eq!(built.closing_costs, dec!(5000));
    }

    #[test]
    fn test_missing_rate_is_reported() {
        let mut args = flags();
        args.new_rate = None;
        let err = refinance_from_flags(&args).unwrap_err();
        assert!(err.to_string().contains("--new-rate"));
    }
}
