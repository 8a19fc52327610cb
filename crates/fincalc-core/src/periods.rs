//! Periodic rate and calendar helpers shared by every calculator.
//!
//! Month-based frequencies advance with calendar arithmetic that clamps to
//! the last valid day of the target month (Jan 31 + 1 month = Feb 28/29).
//! Offsets are always taken from the anchor date, so a schedule anchored on
//! the 31st returns to the 31st whenever the month allows it.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::time_value::growth_factor;
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compounding / payment frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl Frequency {
    /// Number of periods in one year.
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Daily => 365,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::SemiAnnual => 2,
            Frequency::Annual => 1,
        }
    }

    /// Calendar months covered by one period, `None` for day-based frequencies.
    pub fn months_per_period(self) -> Option<u32> {
        match self {
            Frequency::Daily => None,
            Frequency::Monthly => Some(1),
            Frequency::Quarterly => Some(3),
            Frequency::SemiAnnual => Some(6),
            Frequency::Annual => Some(12),
        }
    }

    /// Map a coupon count per year (1, 2, 4, 12) to a frequency.
    pub fn from_periods_per_year(n: u32) -> Option<Self> {
        match n {
            1 => Some(Frequency::Annual),
            2 => Some(Frequency::SemiAnnual),
            4 => Some(Frequency::Quarterly),
            12 => Some(Frequency::Monthly),
            365 => Some(Frequency::Daily),
            _ => None,
        }
    }
}

/// Whether periodic payments fall at the beginning or the end of each period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    Begin,
    #[default]
    End,
}

impl PaymentTiming {
    /// 1 for annuity-due, 0 for ordinary annuity.
    pub fn flag(self) -> Decimal {
        match self {
            PaymentTiming::Begin => Decimal::ONE,
            PaymentTiming::End => Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Periodic rate for an annual nominal rate compounded at `frequency`.
pub fn rate_per_period(annual_rate: Rate, frequency: Frequency) -> Rate {
    annual_rate / Decimal::from(frequency.periods_per_year())
}

/// Effective annual rate: (1 + r/n)^n - 1.
pub fn effective_annual_rate(annual_rate: Rate, frequency: Frequency) -> Rate {
    let n = frequency.periods_per_year();
    growth_factor(rate_per_period(annual_rate, frequency), n) - Decimal::ONE
}

/// Round a money amount to `dp` places, half away from zero.
pub fn round_money(value: Money, dp: u32) -> Money {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Advance `date` by `periods_elapsed` periods of `frequency`.
///
/// Falls back to the anchor date only if chrono's representable range is
/// exceeded.
pub fn advance(date: NaiveDate, periods_elapsed: u32, frequency: Frequency) -> NaiveDate {
    match frequency.months_per_period() {
        Some(step) => add_months(date, periods_elapsed * step),
        None => date
            .checked_add_days(Days::new(u64::from(periods_elapsed)))
            .unwrap_or(date),
    }
}

/// Add calendar months, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Subtract calendar months, clamping the day to the target month's length.
pub fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

/// Actual calendar days between two dates divided by 365.25.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> Decimal {
    Decimal::from((end - start).num_days()) / Decimal::new(36525, 2)
}
