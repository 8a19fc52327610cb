//! Monthly amortization for fixed- and variable-rate installment loans.
//!
//! Rate resets and prepayments are immutable event lists consumed by a
//! single forward pass over the payment periods. A rate reset re-amortizes
//! the outstanding balance over the remaining nominal term; prepayments
//! shorten the loan instead of lowering the installment.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::periods::{advance, Frequency};
use crate::time_value::annuity_payment;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Balances at or below this are treated as fully repaid.
const BALANCE_EPSILON: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPaymentKind {
    /// Paid every month from `start_month` (until `end_month`, if set)
    RecurringMonthly,
    /// Paid once, in `start_month`
    OneTime,
}

/// A prepayment applied on top of the scheduled installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraPayment {
    pub kind: ExtraPaymentKind,
    pub amount: Money,
    /// 1-based period in which the prepayment starts
    pub start_month: u32,
    /// Last period of a recurring prepayment (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_month: Option<u32>,
}

impl ExtraPayment {
    fn amount_for(&self, period: u32) -> Money {
        let applies = match self.kind {
            ExtraPaymentKind::OneTime => period == self.start_month,
            ExtraPaymentKind::RecurringMonthly => {
                period >= self.start_month && self.end_month.is_none_or(|end| period <= end)
            }
        };
        if applies && self.amount > Decimal::ZERO {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

/// A change of the annual interest rate effective from a given period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateChange {
    /// 1-based period from which the new rate accrues
    pub effective_month: u32,
    pub annual_rate: Rate,
}

/// Input parameters for an amortizing loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Annual nominal rate as a decimal (0.05 = 5%)
    pub annual_rate: Rate,
    pub term_months: u32,
    /// Disbursement date; the first installment falls one month later
    pub start_date: NaiveDate,
    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
    #[serde(default)]
    pub rate_changes: Vec<RateChange>,
}

/// A single month of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based period
    pub period: u32,
    pub date: NaiveDate,
    pub beginning_balance: Money,
    /// Total paid this period (= principal + interest)
    pub payment: Money,
    /// Principal repaid this period, including any prepayment
    pub principal: Money,
    pub interest: Money,
    /// Portion of `principal` that came from prepayments
    pub extra_principal: Money,
    pub ending_balance: Money,
    /// Annual rate in force for this period
    pub annual_rate: Rate,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// Calendar-year-of-loan aggregation of the monthly schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationYear {
    /// 1-based loan year (periods 1-12 are year 1)
    pub year: u32,
    pub principal: Money,
    pub interest: Money,
    pub extra_principal: Money,
    pub ending_balance: Money,
}

/// Output of the amortization engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Scheduled installment at origination
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Number of installments actually paid
    pub payoff_months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    /// Nominal term minus actual payoff months
    pub months_saved: u32,
    /// Interest avoided compared with the same loan without prepayments
    pub interest_saved: Money,
    pub schedule: Vec<AmortizationRow>,
    pub yearly_summary: Vec<AmortizationYear>,
}

impl AmortizationOutput {
    fn empty() -> Self {
        AmortizationOutput {
            monthly_payment: Decimal::ZERO,
            total_payment: Decimal::ZERO,
            total_interest: Decimal::ZERO,
            total_principal: Decimal::ZERO,
            payoff_months: 0,
            payoff_date: None,
            months_saved: 0,
            interest_saved: Decimal::ZERO,
            schedule: Vec::new(),
            yearly_summary: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the month-by-month amortization schedule for a loan.
///
/// Zero principal or term yields an empty schedule and a warning rather than
/// an error, so callers can render a neutral "not applicable" state.
pub fn amortize_loan(input: &LoanInput) -> FinCalcResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = if input.principal <= Decimal::ZERO || input.term_months == 0 {
        warnings.push("Principal and term must be positive; schedule is empty".into());
        AmortizationOutput::empty()
    } else {
        collect_event_warnings(input, &mut warnings);

        let schedule = build_schedule(input, true);
        let baseline_interest = if input.extra_payments.is_empty() {
            None
        } else {
            let baseline = build_schedule(input, false);
            Some(baseline.iter().map(|r| r.interest).sum::<Money>())
        };
        summarize(input, schedule, baseline_interest)
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Level-payment amortization with prepayments and rate resets",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Scheduled installment at origination (annuity formula, `P / n` at 0%).
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_months: u32) -> Money {
    annuity_payment(principal, annual_rate / dec!(12), term_months)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

fn sorted_rate_changes(input: &LoanInput) -> Vec<&RateChange> {
    // Months are 1-based; month 0 is outside the term
    let mut changes: Vec<&RateChange> = input
        .rate_changes
        .iter()
        .filter(|c| c.effective_month >= 1)
        .collect();
    // Stable sort keeps input order within a month, so the last listed wins
    changes.sort_by_key(|c| c.effective_month);
    changes
}

fn build_schedule(input: &LoanInput, with_extras: bool) -> Vec<AmortizationRow> {
    let n = input.term_months;
    let changes = sorted_rate_changes(input);
    let mut next_change = 0usize;

    let mut annual_rate = input.annual_rate;
    let mut r = annual_rate / dec!(12);
    let mut payment = annuity_payment(input.principal, r, n);

    let mut balance = input.principal;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_principal = Decimal::ZERO;
    let mut schedule = Vec::with_capacity(n as usize);

    for period in 1..=n {
        // --- Rate resets effective this period ---
        let mut new_rate = annual_rate;
        while next_change < changes.len() && changes[next_change].effective_month <= period {
            new_rate = changes[next_change].annual_rate;
            next_change += 1;
        }
        if new_rate != annual_rate {
            annual_rate = new_rate;
            r = annual_rate / dec!(12);
            payment = annuity_payment(balance, r, n - period + 1);
        }

        let beginning_balance = balance;
        let interest = balance * r;
        let scheduled_principal = (payment - interest).max(Decimal::ZERO);

        let extra: Money = if with_extras {
            input
                .extra_payments
                .iter()
                .map(|e| e.amount_for(period))
                .sum()
        } else {
            Decimal::ZERO
        };

        // Never repay more than is outstanding; the last nominal period clears it
        let scheduled_principal = scheduled_principal.min(balance);
        let extra_principal = extra.min(balance - scheduled_principal);
        let principal = if period == n {
            balance
        } else {
            scheduled_principal + extra_principal
        };

        balance -= principal;
        if balance <= BALANCE_EPSILON {
            balance = Decimal::ZERO;
        }

        cumulative_interest += interest;
        cumulative_principal += principal;

        schedule.push(AmortizationRow {
            period,
            date: advance(input.start_date, period, Frequency::Monthly),
            beginning_balance,
            payment: principal + interest,
            principal,
            interest,
            extra_principal,
            ending_balance: balance,
            annual_rate,
            cumulative_interest,
            cumulative_principal,
        });

        if balance.is_zero() {
            break;
        }
    }

    schedule
}

fn summarize(
    input: &LoanInput,
    schedule: Vec<AmortizationRow>,
    baseline_interest: Option<Money>,
) -> AmortizationOutput {
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();
    let total_principal: Money = schedule.iter().map(|r| r.principal).sum();
    let payoff_months = schedule.len() as u32;

    AmortizationOutput {
        monthly_payment: monthly_payment(input.principal, input.annual_rate, input.term_months),
        total_payment: total_interest + total_principal,
        total_interest,
        total_principal,
        payoff_months,
        payoff_date: schedule.last().map(|r| r.date),
        months_saved: input.term_months.saturating_sub(payoff_months),
        interest_saved: baseline_interest
            .map(|b| (b - total_interest).max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO),
        yearly_summary: yearly_summary(&schedule),
        schedule,
    }
}

/// Aggregate monthly rows into 12-period loan years.
pub fn yearly_summary(schedule: &[AmortizationRow]) -> Vec<AmortizationYear> {
    schedule
        .chunks(12)
        .enumerate()
        .map(|(i, rows)| AmortizationYear {
            year: i as u32 + 1,
            principal: rows.iter().map(|r| r.principal).sum(),
            interest: rows.iter().map(|r| r.interest).sum(),
            extra_principal: rows.iter().map(|r| r.extra_principal).sum(),
            ending_balance: rows.last().map(|r| r.ending_balance).unwrap_or_default(),
        })
        .collect()
}

fn collect_event_warnings(input: &LoanInput, warnings: &mut Vec<String>) {
    for change in &input.rate_changes {
        if change.effective_month == 0 || change.effective_month > input.term_months {
            warnings.push(format!(
                "Rate change at month {} falls outside the {}-month term and is ignored",
                change.effective_month, input.term_months
            ));
        }
        if change.annual_rate < Decimal::ZERO {
            warnings.push(format!(
                "Rate change at month {} has a negative rate",
                change.effective_month
            ));
        }
    }
    for extra in &input.extra_payments {
        if extra.start_month > input.term_months {
            warnings.push(format!(
                "Extra payment starting at month {} falls outside the term and is ignored",
                extra.start_month
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_loan() -> LoanInput {
        LoanInput {
            principal: dec!(200000),
            annual_rate: dec!(0.05),
            term_months: 360,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            extra_payments: vec![],
            rate_changes: vec![],
        }
    }

    #[test]
    fn test_thirty_year_mortgage_reference() {
        let out = amortize_loan(&base_loan()).unwrap().result;
        let first = &out.schedule[0];
        assert!((first.interest - dec!(833.33)).abs() < dec!(0.01));
        assert!((out.monthly_payment - dec!(1073.64)).abs() < dec!(0.01));
        assert_eq!(out.schedule.len(), 360);
        assert_eq!(out.schedule.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_rows_balance_and_sum_to_payment() {
        let out = amortize_loan(&base_loan()).unwrap().result;
        for row in &out.schedule {
            assert_eq!(row.principal + row.interest, row.payment);
            assert_eq!(row.beginning_balance - row.principal, row.ending_balance);
        }
    }

    #[test]
    fn test_first_installment_one_month_after_start() {
        let out = amortize_loan(&base_loan()).unwrap().result;
        assert_eq!(out.schedule[0].date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(out.payoff_date, NaiveDate::from_ymd_opt(2054, 1, 15));
    }

    #[test]
    fn test_lump_sum_applies_exactly_once() {
        let mut input = base_loan();
        input.extra_payments.push(ExtraPayment {
            kind: ExtraPaymentKind::OneTime,
            amount: dec!(10000),
            start_month: 12,
            end_month: None,
        });
        let out = amortize_loan(&input).unwrap().result;
        let extras: Vec<_> = out
            .schedule
            .iter()
            .filter(|r| r.extra_principal > Decimal::ZERO)
            .map(|r| r.period)
            .collect();
        assert_eq!(extras, vec![12]);
        assert!(out.payoff_months < 360);
        assert!(out.interest_saved > Decimal::ZERO);
    }

    #[test]
    fn test_recurring_extra_respects_end_month() {
        let mut input = base_loan();
        input.extra_payments.push(ExtraPayment {
            kind: ExtraPaymentKind::RecurringMonthly,
            amount: dec!(100),
            start_month: 3,
            end_month: Some(5),
        });
        let out = amortize_loan(&input).unwrap().result;
        let total_extra: Money = out.schedule.iter().map(|r| r.extra_principal).sum();
        assert_eq!(total_extra, dec!(300));
        assert!(out.schedule[1].extra_principal.is_zero());
        assert!(out.schedule[5].extra_principal.is_zero());
    }

    #[test]
    fn test_same_month_rate_changes_last_wins() {
        let mut a = base_loan();
        a.rate_changes = vec![
            RateChange { effective_month: 61, annual_rate: dec!(0.07) },
            RateChange { effective_month: 61, annual_rate: dec!(0.06) },
        ];
        let mut b = base_loan();
        b.rate_changes = vec![RateChange { effective_month: 61, annual_rate: dec!(0.06) }];
        let out_a = amortize_loan(&a).unwrap().result;
        let out_b = amortize_loan(&b).unwrap().result;
        assert_eq!(out_a.schedule, out_b.schedule);
        assert_eq!(out_a.schedule[60].annual_rate, dec!(0.06));
    }

    #[test]
    fn test_unsorted_rate_changes_applied_in_month_order() {
        let mut input = base_loan();
        input.rate_changes = vec![
            RateChange { effective_month: 120, annual_rate: dec!(0.04) },
            RateChange { effective_month: 60, annual_rate: dec!(0.06) },
        ];
        let out = amortize_loan(&input).unwrap().result;
        assert_eq!(out.schedule[58].annual_rate, dec!(0.05));
        assert_eq!(out.schedule[59].annual_rate, dec!(0.06));
        assert_eq!(out.schedule[119].annual_rate, dec!(0.04));
        assert_eq!(out.schedule.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_rate_increase_reamortizes_payment_upwards() {
        let mut input = base_loan();
        input.rate_changes = vec![RateChange { effective_month: 61, annual_rate: dec!(0.07) }];
        let out = amortize_loan(&input).unwrap().result;
        assert!(out.schedule[60].payment > out.schedule[59].payment);
        assert_eq!(out.schedule.len(), 360);
    }

    #[test]
    fn test_degenerate_inputs_return_empty_schedule() {
        let mut input = base_loan();
        input.term_months = 0;
        let out = amortize_loan(&input).unwrap();
        assert!(out.result.schedule.is_empty());
        assert_eq!(out.result.total_interest, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);

        let mut input = base_loan();
        input.principal = dec!(-5);
        assert!(amortize_loan(&input).unwrap().result.schedule.is_empty());
    }

    #[test]
    fn test_month_zero_rate_change_is_ignored() {
        let mut input = base_loan();
        input.rate_changes.push(RateChange {
            effective_month: 0,
            annual_rate: dec!(0.09),
        });
        let out = amortize_loan(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("month 0")));
        let first = &out.result.schedule[0];
        assert_eq!(first.annual_rate, dec!(0.05));
        assert!((first.interest - dec!(833.33)).abs() < dec!(0.01), "got {}", first.interest);

        let plain = amortize_loan(&base_loan()).unwrap().result;
        assert_eq!(out.result.total_interest, plain.total_interest);
    }

    #[test]
    fn test_yearly_summary_chunks_twelve_months() {
        let out = amortize_loan(&base_loan()).unwrap().result;
        assert_eq!(out.yearly_summary.len(), 30);
        let y1 = &out.yearly_summary[0];
        let direct: Money = out.schedule[..12].iter().map(|r| r.interest).sum();
        assert_eq!(y1.interest, direct);
        assert_eq!(y1.ending_balance, out.schedule[11].ending_balance);
    }
}
