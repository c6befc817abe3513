use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use tracing::debug;

use super::months::{YearMonth, month_range};
use super::types::{
    Cents, CompoundingConfig, CompoundingExpense, CompoundingResult, MonthlyDataPoint,
};

/// Growth of money left invested instead of being reimbursed, assuming a 10%
/// annual return compounded monthly. `as_of` defaults to today.
pub fn simulate(expenses: &[CompoundingExpense], as_of: Option<NaiveDate>) -> CompoundingResult {
    simulate_with_config(expenses, as_of, CompoundingConfig::default())
}

pub fn simulate_with_config(
    expenses: &[CompoundingExpense],
    as_of: Option<NaiveDate>,
    config: CompoundingConfig,
) -> CompoundingResult {
    if expenses.is_empty() {
        return CompoundingResult::default();
    }

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let as_of_month = YearMonth::from_date(as_of);
    let contributions = monthly_net_contributions(expenses);

    let Some(&start_month) = contributions.keys().next() else {
        return CompoundingResult::default();
    };
    if start_month > as_of_month {
        return CompoundingResult::default();
    }

    let months = month_range(start_month, as_of_month);
    let growth = 1.0 + monthly_rate(config.annual_return);
    debug!(
        expenses = expenses.len(),
        months = months.len(),
        start = %start_month,
        "simulating compounding balance"
    );

    let mut balance = 0.0_f64;
    let mut total_contributions: Cents = 0;
    let mut data_points = Vec::with_capacity(months.len());
    for month in months {
        let net = contributions.get(&month).copied().unwrap_or(0);
        balance += net as f64;
        total_contributions = total_contributions.saturating_add(net);
        balance *= growth;
        // Rounded per point from the unrounded balance; no carried rounding.
        data_points.push(MonthlyDataPoint {
            month,
            cumulative_gain_cents: round_cents(balance - total_contributions as f64),
        });
    }

    let total_gain_cents = data_points
        .last()
        .map(|point| point.cumulative_gain_cents)
        .unwrap_or(0);

    CompoundingResult {
        data_points,
        total_gain_cents,
        total_invested_cents: total_contributions,
    }
}

/// Re-bases a full-range result so gains start from zero at the beginning of `year`.
///
/// The baseline is the prior December's gain when the series has one. Invested
/// principal is carried over unchanged.
pub fn filter_to_ytd(result: &CompoundingResult, year: i32) -> CompoundingResult {
    let prior_december = YearMonth::december_of(year - 1);
    let baseline = result
        .data_points
        .iter()
        .find(|point| point.month == prior_december)
        .map(|point| point.cumulative_gain_cents)
        .unwrap_or(0);

    let data_points = result
        .data_points
        .iter()
        .filter(|point| point.month.is_in_year(year))
        .map(|point| MonthlyDataPoint {
            month: point.month,
            cumulative_gain_cents: point.cumulative_gain_cents - baseline,
        })
        .collect::<Vec<_>>();

    CompoundingResult {
        total_gain_cents: data_points
            .last()
            .map(|point| point.cumulative_gain_cents)
            .unwrap_or(0),
        data_points,
        total_invested_cents: result.total_invested_cents,
    }
}

/// Per-month rate equivalent to `annual_return` compounded twelve times a year.
pub fn monthly_rate(annual_return: f64) -> f64 {
    (1.0 + annual_return).powf(1.0 / 12.0) - 1.0
}

/// Net principal per month: expenses add, reimbursements subtract in the month they land.
fn monthly_net_contributions(expenses: &[CompoundingExpense]) -> BTreeMap<YearMonth, Cents> {
    let mut buckets: BTreeMap<YearMonth, Cents> = BTreeMap::new();
    for expense in expenses {
        if expense.amount_cents != 0 {
            let bucket = buckets
                .entry(YearMonth::from_date(expense.date_paid))
                .or_insert(0);
            *bucket = bucket.saturating_add(expense.amount_cents);
        }
        for reimbursement in &expense.reimbursements {
            if reimbursement.amount_cents != 0 {
                let bucket = buckets
                    .entry(YearMonth::from_date(reimbursement.date))
                    .or_insert(0);
                *bucket = bucket.saturating_sub(reimbursement.amount_cents);
            }
        }
    }
    buckets
}

fn round_cents(value: f64) -> Cents {
    value.round() as Cents
}
