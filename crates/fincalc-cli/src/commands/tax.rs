use clap::Args;
use serde_json::Value;

use fincalc_core::tax::income_tax::{self, IncomeTaxInput};

use crate::input;

/// Arguments for progressive income tax
#[derive(Args)]
pub struct IncomeTaxArgs {
    /// Path to JSON/YAML input file with income, deductions and brackets
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_income_tax(args: IncomeTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: IncomeTaxInput = input::require(args.input.as_deref(), "income tax")?;
    let result = income_tax::calculate_income_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}
