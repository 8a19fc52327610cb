use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::periods::{Frequency, PaymentTiming};
use fincalc_core::tvm::{self, SolveFor, TvmInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SolveForArg {
    Fv,
    Pv,
    Pmt,
    Periods,
    Rate,
}

impl From<SolveForArg> for SolveFor {
    fn from(arg: SolveForArg) -> Self {
        match arg {
            SolveForArg::Fv => SolveFor::FutureValue,
            SolveForArg::Pv => SolveFor::PresentValue,
            SolveForArg::Pmt => SolveFor::Payment,
            SolveForArg::Periods => SolveFor::Periods,
            SolveForArg::Rate => SolveFor::Rate,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl From<FrequencyArg> for Frequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Monthly => Frequency::Monthly,
            FrequencyArg::Quarterly => Frequency::Quarterly,
            FrequencyArg::SemiAnnual => Frequency::SemiAnnual,
            FrequencyArg::Annual => Frequency::Annual,
        }
    }
}

/// Arguments for the TVM solver
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TvmArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Variable to solve for
    #[arg(long)]
    pub solve_for: Option<SolveForArg>,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub pv: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub fv: Decimal,

    /// Payment per compounding period (negative for loan payments)
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub pmt: Decimal,

    /// Annual nominal rate as a decimal
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub rate: Decimal,

    /// Number of compounding periods
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub periods: Decimal,

    #[arg(long, value_enum, default_value_t = FrequencyArg::Monthly)]
    pub compounding: FrequencyArg,

    /// Payments at the beginning of each period (annuity due)
    #[arg(long)]
    pub begin: bool,

    /// Anchor date used to date the schedule rows
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_tvm(args: TvmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tvm_input: TvmInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => TvmInput {
            solve_for: args
                .solve_for
                .ok_or("--solve-for is required (or provide --input)")?
                .into(),
            present_value: args.pv,
            future_value: args.fv,
            payment: args.pmt,
            annual_rate: args.rate,
            periods: args.periods,
            compounding: args.compounding.into(),
            timing: if args.begin {
                PaymentTiming::Begin
            } else {
                PaymentTiming::End
            },
            start_date: args.start_date,
        },
    };
    let result = tvm::solve(&tvm_input)?;
    Ok(serde_json::to_value(result)?)
}
