use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::loans::amortization::{self, LoanInput};
use fincalc_core::loans::apr::{self, AprInput};
use fincalc_core::loans::lease::{self, LeaseInput};
use fincalc_core::loans::mortgage::{self, MortgageInput};

use crate::input;

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON/YAML input file (overrides individual flags; needed for
    /// extra payments and rate changes)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal (0.05 = 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Loan start date (YYYY-MM-DD); first installment is one month later
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => LoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            start_date: args.start_date.unwrap_or_else(|| Local::now().date_naive()),
            extra_payments: Vec::new(),
            rate_changes: Vec::new(),
        },
    };
    let result = amortization::amortize_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a mortgage quote
#[derive(Args)]
pub struct MortgageArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub home_price: Option<Decimal>,

    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long, default_value_t = 30)]
    pub term_years: u32,

    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Annual property tax as a share of the home price
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub property_tax_rate: Decimal,

    /// Annual homeowner's insurance premium
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub insurance: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub hoa: Decimal,

    /// Annual PMI premium as a share of the loan amount
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub pmi_rate: Decimal,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input: MortgageInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => MortgageInput {
            home_price: args
                .home_price
                .ok_or("--home-price is required (or provide --input)")?,
            down_payment: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.term_years,
            start_date: args.start_date.unwrap_or_else(|| Local::now().date_naive()),
            property_tax_rate: args.property_tax_rate,
            annual_insurance: args.insurance,
            monthly_hoa: args.hoa,
            pmi_rate: args.pmi_rate,
            extra_payments: Vec::new(),
            rate_changes: Vec::new(),
        },
    };
    let result = mortgage::calculate_mortgage(&mortgage_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for APR
#[derive(Args)]
pub struct AprArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Note rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub term_months: Option<u32>,

    /// Points, origination and other upfront fees
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub fees: Decimal,

    /// Add the fees to the balance instead of paying them upfront
    #[arg(long)]
    pub fees_financed: bool,
}

pub fn run_apr(args: AprArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let apr_input: AprInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => AprInput {
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            upfront_fees: args.fees,
            fees_financed: args.fees_financed,
        },
    };
    let result = apr::calculate_apr(&apr_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for an auto lease
#[derive(Args)]
pub struct LeaseArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_lease(args: LeaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lease_input: LeaseInput = input::require(args.input.as_deref(), "lease")?;
    let result = lease::calculate_lease(&lease_input)?;
    Ok(serde_json::to_value(result)?)
}
