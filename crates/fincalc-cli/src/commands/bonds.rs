use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::fixed_income::bonds::{self, BondInput, BondQuote};

use crate::input;

/// Arguments for bond valuation. Give exactly one of --yield or --price.
#[derive(Args)]
pub struct BondArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, default_value_t = Decimal::ONE_THOUSAND)]
    pub face_value: Decimal,

    /// Annual coupon rate as a decimal
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    /// Coupons per year: 1, 2, 4 or 12
    #[arg(long, default_value_t = 2)]
    pub frequency: u8,

    #[arg(long)]
    pub settlement_date: Option<NaiveDate>,

    #[arg(long)]
    pub maturity_date: Option<NaiveDate>,

    /// Annual yield to maturity; solves for price
    #[arg(long = "yield", conflicts_with = "price")]
    pub yield_to_maturity: Option<Decimal>,

    /// Market price; solves for yield
    #[arg(long)]
    pub price: Option<Decimal>,
}

pub fn run_bond(args: BondArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bond_input: BondInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let quote = match (args.yield_to_maturity, args.price) {
                (Some(y), _) => BondQuote::Yield(y),
                (None, Some(p)) => BondQuote::Price(p),
                (None, None) => return Err("--yield or --price is required (or provide --input)".into()),
            };
            BondInput {
                face_value: args.face_value,
                coupon_rate: args
                    .coupon_rate
                    .ok_or("--coupon-rate is required (or provide --input)")?,
                coupon_frequency: args.frequency,
                settlement_date: args
                    .settlement_date
                    .ok_or("--settlement-date is required (or provide --input)")?,
                maturity_date: args
                    .maturity_date
                    .ok_or("--maturity-date is required (or provide --input)")?,
                quote,
            }
        }
    };
    let result = bonds::value_bond(&bond_input)?;
    Ok(serde_json::to_value(result)?)
}
