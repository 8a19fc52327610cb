use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::interest::compound::{self, CompoundInterestInput};
use fincalc_core::interest::deposits::{self, CdInput, RecurringDepositInput};
use fincalc_core::interest::simple::{self, SimpleInterestInput, SimpleScheduleInput};
use fincalc_core::periods::PaymentTiming;

use super::tvm::FrequencyArg;
use crate::input;

/// Arguments for simple interest
#[derive(Args)]
pub struct SimpleInterestArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Time in years (may be fractional)
    #[arg(long)]
    pub years: Option<Decimal>,
}

pub fn run_simple_interest(args: SimpleInterestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let simple_input: SimpleInterestInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SimpleInterestInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
        },
    };
    let result = simple::calculate_simple_interest(&simple_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for dated simple interest with prepayments and rate resets
#[derive(Args)]
pub struct InterestScheduleArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_interest_schedule(args: InterestScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: SimpleScheduleInput =
        input::require(args.input.as_deref(), "the interest schedule")?;
    let result = simple::simple_interest_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for compound interest
#[derive(Args)]
pub struct CompoundInterestArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub years: Option<Decimal>,

    #[arg(long, value_enum, default_value_t = FrequencyArg::Annual)]
    pub compounding: FrequencyArg,

    /// Amount added every compounding period
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub contribution: Decimal,

    /// Contributions at the beginning of each period
    #[arg(long)]
    pub begin: bool,
}

pub fn run_compound_interest(args: CompoundInterestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let compound_input: CompoundInterestInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => CompoundInterestInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            compounding: args.compounding.into(),
            contribution: args.contribution,
            contribution_timing: if args.begin {
                PaymentTiming::Begin
            } else {
                PaymentTiming::End
            },
        },
    };
    let result = compound::calculate_compound_interest(&compound_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a certificate of deposit
#[derive(Args)]
pub struct CdArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub deposit: Option<Decimal>,

    /// Annual rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub term_months: Option<u32>,

    #[arg(long, value_enum, default_value_t = FrequencyArg::Monthly)]
    pub compounding: FrequencyArg,

    /// Tax rate on interest earned
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub tax_rate: Decimal,

    /// Annual inflation used to report the real maturity value
    #[arg(long)]
    pub inflation_rate: Option<Decimal>,
}

pub fn run_cd(args: CdArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cd_input: CdInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => CdInput {
            deposit: args.deposit.ok_or("--deposit is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            compounding: args.compounding.into(),
            tax_rate: args.tax_rate,
            inflation_rate: args.inflation_rate,
        },
    };
    let result = deposits::calculate_cd(&cd_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a recurring deposit
#[derive(Args)]
pub struct RecurringDepositArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub installment: Option<Decimal>,

    /// Annual rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub term_months: Option<u32>,
}

pub fn run_recurring_deposit(args: RecurringDepositArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rd_input: RecurringDepositInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => RecurringDepositInput {
            monthly_installment: args
                .installment
                .ok_or("--installment is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
        },
    };
    let result = deposits::calculate_recurring_deposit(&rd_input)?;
    Ok(serde_json::to_value(result)?)
}
