//! Investment growth: lump sums, systematic investment plans and goal planning.
//!
//! Every engine reports the same [`InvestmentResult`] summary plus a yearly
//! breakdown. Closed-form engines evaluate each year-end balance directly
//! from the formula; the step-up plan is simulated month by month.

pub mod goal;
pub mod lumpsum;
pub mod sip;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_value::growth_factor;
use crate::types::{Money, Rate};

/// Summary shared by every growth engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub total_investment: Money,
    pub total_returns: Money,
    pub future_value: Money,
    /// Annualized growth rate of the invested money
    pub cagr: Rate,
    /// Future value in today's money, when an inflation rate is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_value: Option<Money>,
    /// Future value after tax on gains, when a tax rate is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_tax_value: Option<Money>,
}

/// One year of a growth projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyGrowthRow {
    pub year: u32,
    pub opening_balance: Money,
    pub invested: Money,
    pub cumulative_invested: Money,
    pub returns: Money,
    pub closing_balance: Money,
}

/// Summary plus yearly breakdown returned by the lump-sum and SIP engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthOutput {
    #[serde(flatten)]
    pub summary: InvestmentResult,
    pub yearly: Vec<YearlyGrowthRow>,
}

/// Optional adjustments applied to the final value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Adjustments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<Rate>,
    /// Tax rate on gains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
}

impl InvestmentResult {
    pub(crate) fn new(
        total_investment: Money,
        future_value: Money,
        cagr: Rate,
        years: u32,
        adjustments: Adjustments,
    ) -> Self {
        let total_returns = future_value - total_investment;
        let real_value = adjustments.inflation_rate.and_then(|inflation| {
            let deflator = growth_factor(inflation, years);
            (!deflator.is_zero()).then(|| future_value / deflator)
        });
        let after_tax_value = adjustments
            .tax_rate
            .map(|tax| future_value - total_returns.max(Decimal::ZERO) * tax);
        Self {
            total_investment,
            total_returns,
            future_value,
            cagr,
            real_value,
            after_tax_value,
        }
    }
}

/// Build yearly rows from cumulative balances and contributions at each year end.
///
/// `checkpoints[y]` is `(balance, cumulative_invested)` at the end of year `y`,
/// with index 0 holding the starting position.
pub(crate) fn yearly_rows(checkpoints: &[(Money, Money)]) -> Vec<YearlyGrowthRow> {
    checkpoints
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (opening_balance, invested_before) = pair[0];
            let (closing_balance, cumulative_invested) = pair[1];
            let invested = cumulative_invested - invested_before;
            YearlyGrowthRow {
                year: i as u32 + 1,
                opening_balance,
                invested,
                cumulative_invested,
                returns: closing_balance - opening_balance - invested,
                closing_balance,
            }
        })
        .collect()
}
