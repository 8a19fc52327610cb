use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::investments::goal::{self, GoalInput};
use fincalc_core::investments::lumpsum::{self, LumpsumInput};
use fincalc_core::investments::sip::{self, SipInput};
use fincalc_core::investments::Adjustments;

use crate::input;

/// Inflation and tax flags shared by the growth calculators
#[derive(Args)]
pub struct AdjustmentArgs {
    /// Annual inflation used to report the real value
    #[arg(long)]
    pub inflation_rate: Option<Decimal>,

    /// Tax rate applied to gains
    #[arg(long)]
    pub tax_rate: Option<Decimal>,
}

impl From<&AdjustmentArgs> for Adjustments {
    fn from(args: &AdjustmentArgs) -> Self {
        Adjustments {
            inflation_rate: args.inflation_rate,
            tax_rate: args.tax_rate,
        }
    }
}

/// Arguments for a lump-sum investment
#[derive(Args)]
pub struct LumpsumArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Expected annual return as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub years: Option<u32>,

    #[command(flatten)]
    pub adjustments: AdjustmentArgs,
}

pub fn run_lumpsum(args: LumpsumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lumpsum_input: LumpsumInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => LumpsumInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            adjustments: (&args.adjustments).into(),
        },
    };
    let result = lumpsum::calculate_lumpsum(&lumpsum_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a systematic investment plan
#[derive(Args)]
pub struct SipArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub monthly: Option<Decimal>,

    /// Expected annual return as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub years: Option<u32>,

    /// Yearly increase of the monthly amount as a decimal
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub step_up: Decimal,

    #[command(flatten)]
    pub adjustments: AdjustmentArgs,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input: SipInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SipInput {
            monthly_investment: args
                .monthly
                .ok_or("--monthly is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            step_up_rate: args.step_up,
            adjustments: (&args.adjustments).into(),
        },
    };
    let result = sip::calculate_sip(&sip_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for goal planning
#[derive(Args)]
pub struct GoalArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub target: Option<Decimal>,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub current_savings: Decimal,

    /// Expected annual return as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub years: Option<u32>,

    /// Grow the target by inflation to the goal date
    #[arg(long)]
    pub inflation_rate: Option<Decimal>,
}

pub fn run_goal(args: GoalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let goal_input: GoalInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => GoalInput {
            target_amount: args.target.ok_or("--target is required (or provide --input)")?,
            current_savings: args.current_savings,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            inflation_rate: args.inflation_rate,
        },
    };
    let result = goal::plan_goal(&goal_input)?;
    Ok(serde_json::to_value(result)?)
}
