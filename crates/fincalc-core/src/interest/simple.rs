//! Simple (non-compounding) interest.
//!
//! The dated variant accrues interest on an evolving balance: every
//! prepayment or rate reset closes the current accrual segment and opens a
//! new one. Accrual is actual days / 365 and interest is never capitalized.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FinCalcResult;

const DAYS_PER_YEAR: Decimal = dec!(365);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleInterestInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleInterestOutput {
    pub interest: Money,
    pub total_amount: Money,
}

/// A partial repayment of principal on a given date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prepayment {
    pub date: NaiveDate,
    pub amount: Money,
}

/// A new annual rate that applies from `date` onward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateReset {
    pub date: NaiveDate,
    pub annual_rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleScheduleInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub prepayments: Vec<Prepayment>,
    #[serde(default)]
    pub rate_resets: Vec<RateReset>,
}

/// One accrual segment between consecutive events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleInterestSegment {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: i64,
    pub balance: Money,
    pub annual_rate: Rate,
    pub interest: Money,
    /// Principal repaid on `to`
    pub prepayment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleScheduleOutput {
    pub total_interest: Money,
    pub total_prepaid: Money,
    /// Principal still outstanding at the end date
    pub ending_balance: Money,
    /// Principal plus all interest
    pub total_amount: Money,
    pub segments: Vec<SimpleInterestSegment>,
}

/// Chronological event, resets ordered before prepayments on the same day.
enum Event {
    Reset(Rate),
    Prepay(Money),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `interest = P × r × t`.
pub fn calculate_simple_interest(
    input: &SimpleInterestInput,
) -> FinCalcResult<ComputationOutput<SimpleInterestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = if input.principal <= Decimal::ZERO || input.years <= Decimal::ZERO {
        warnings.push("Principal and time must be positive".into());
        SimpleInterestOutput {
            interest: Decimal::ZERO,
            total_amount: input.principal.max(Decimal::ZERO),
        }
    } else {
        let interest = input.principal * input.annual_rate * input.years;
        SimpleInterestOutput {
            interest,
            total_amount: input.principal + interest,
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Simple interest: P x r x t",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Accrue simple interest over dated segments split at prepayments and rate resets.
pub fn simple_interest_schedule(
    input: &SimpleScheduleInput,
) -> FinCalcResult<ComputationOutput<SimpleScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = if input.principal <= Decimal::ZERO || input.end_date <= input.start_date {
        warnings.push("Principal must be positive and the end date after the start date".into());
        SimpleScheduleOutput {
            total_interest: Decimal::ZERO,
            total_prepaid: Decimal::ZERO,
            ending_balance: input.principal.max(Decimal::ZERO),
            total_amount: input.principal.max(Decimal::ZERO),
            segments: Vec::new(),
        }
    } else {
        build_segments(input, &mut warnings)
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Simple interest on an evolving balance, actual/365, segmented at prepayments and rate resets",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sorted_events(input: &SimpleScheduleInput, warnings: &mut Vec<String>) -> Vec<(NaiveDate, Event)> {
    let in_range = |d: NaiveDate| d > input.start_date && d < input.end_date;
    let mut events: Vec<(NaiveDate, Event)> = Vec::new();

    for reset in &input.rate_resets {
        if in_range(reset.date) {
            events.push((reset.date, Event::Reset(reset.annual_rate)));
        } else {
            warnings.push(format!("Rate reset on {} is outside the term and was ignored", reset.date));
        }
    }
    for prepay in &input.prepayments {
        if in_range(prepay.date) && prepay.amount > Decimal::ZERO {
            events.push((prepay.date, Event::Prepay(prepay.amount)));
        } else {
            warnings.push(format!("Prepayment on {} was ignored", prepay.date));
        }
    }

    // Stable: same-day resets keep their listed order and precede prepayments
    events.sort_by_key(|(date, event)| (*date, matches!(event, Event::Prepay(_))));
    events
}

fn build_segments(input: &SimpleScheduleInput, warnings: &mut Vec<String>) -> SimpleScheduleOutput {
    let events = sorted_events(input, warnings);

    let mut balance = input.principal;
    let mut rate = input.annual_rate;
    let mut from = input.start_date;
    let mut total_interest = Decimal::ZERO;
    let mut total_prepaid = Decimal::ZERO;
    let mut segments: Vec<SimpleInterestSegment> = Vec::new();

    let close = |from: NaiveDate, to: NaiveDate, balance: Money, rate: Rate| {
        let days = (to - from).num_days();
        let interest = balance * rate * Decimal::from(days) / DAYS_PER_YEAR;
        (days, interest)
    };

    for (date, event) in events {
        if date > from {
            let (days, interest) = close(from, date, balance, rate);
            total_interest += interest;
            segments.push(SimpleInterestSegment {
                from,
                to: date,
                days,
                balance,
                annual_rate: rate,
                interest,
                prepayment: Decimal::ZERO,
            });
            from = date;
        }
        match event {
            Event::Reset(new_rate) => rate = new_rate,
            Event::Prepay(amount) => {
                let applied = amount.min(balance);
                if applied < amount {
                    warnings.push(format!(
                        "Prepayment on {date} capped at the outstanding balance {balance}"
                    ));
                }
                balance -= applied;
                total_prepaid += applied;
                if let Some(last) = segments.last_mut().filter(|s| s.to == date) {
                    last.prepayment += applied;
                }
            }
        }
    }

    let (days, interest) = close(from, input.end_date, balance, rate);
    total_interest += interest;
    segments.push(SimpleInterestSegment {
        from,
        to: input.end_date,
        days,
        balance,
        annual_rate: rate,
        interest,
        prepayment: Decimal::ZERO,
    });

    SimpleScheduleOutput {
        total_interest,
        total_prepaid,
        ending_balance: balance,
        total_amount: input.principal + total_interest,
        segments,
    }
}
