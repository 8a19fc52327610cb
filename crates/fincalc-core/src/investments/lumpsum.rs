use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{yearly_rows, Adjustments, GrowthOutput, InvestmentResult};
use crate::time_value::growth_factor;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumpsumInput {
    pub principal: Money,
    /// Expected annual return, compounded annually
    pub annual_rate: Rate,
    pub years: u32,
    #[serde(flatten)]
    pub adjustments: Adjustments,
}

/// One-time investment: FV = P(1 + r)^t.
pub fn calculate_lumpsum(input: &LumpsumInput) -> FinCalcResult<ComputationOutput<GrowthOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let principal = if input.principal < Decimal::ZERO {
        warnings.push("Negative principal treated as zero".into());
        Decimal::ZERO
    } else {
        input.principal
    };
    if input.years == 0 {
        warnings.push("Zero-year horizon; value equals the principal".into());
    }

    let checkpoints: Vec<(Money, Money)> = (0..=input.years)
        .map(|y| (principal * growth_factor(input.annual_rate, y), principal))
        .collect();
    let future_value = checkpoints
        .last()
        .map(|(balance, _)| *balance)
        .unwrap_or(principal);

    let cagr = if input.years > 0 && principal > Decimal::ZERO {
        input.annual_rate
    } else {
        Decimal::ZERO
    };

    let output = GrowthOutput {
        summary: InvestmentResult::new(principal, future_value, cagr, input.years, input.adjustments),
        yearly: yearly_rows(&checkpoints),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Lump sum: P(1 + r)^t, annual compounding",
        input,
        warnings,
        elapsed,
        output,
    ))
}
