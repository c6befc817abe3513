use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{Cents, CompoundingExpense, OutstandingItem, Reimbursement};

/// An expense as the record store hands it over, with its reimbursement history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub date_paid: NaiveDate,
    pub amount_cents: Cents,
    #[serde(default)]
    pub reimbursements: Vec<Reimbursement>,
}

/// $1 billion. Larger single amounts are treated as input errors.
pub const MAX_RECORD_CENTS: Cents = 100_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("expense {id}: amount must be between 1 and {max} cents, got {amount_cents}")]
    ExpenseAmount {
        id: String,
        amount_cents: Cents,
        max: Cents,
    },
    #[error("expense {id}: reimbursement must be between 1 and {max} cents, got {amount_cents}")]
    ReimbursementAmount {
        id: String,
        amount_cents: Cents,
        max: Cents,
    },
}

impl ExpenseRecord {
    pub fn reimbursed_cents(&self) -> Cents {
        self.reimbursements
            .iter()
            .fold(0, |acc: Cents, r| acc.saturating_add(r.amount_cents))
    }

    pub fn remaining_cents(&self) -> Cents {
        self.amount_cents.saturating_sub(self.reimbursed_cents())
    }
}

/// Rejects records whose amounts fall outside `1..=MAX_RECORD_CENTS`.
pub fn validate_records(records: &[ExpenseRecord]) -> Result<(), RecordError> {
    let in_range = |amount: Cents| (1..=MAX_RECORD_CENTS).contains(&amount);
    for record in records {
        if !in_range(record.amount_cents) {
            return Err(RecordError::ExpenseAmount {
                id: record.id.clone(),
                amount_cents: record.amount_cents,
                max: MAX_RECORD_CENTS,
            });
        }
        if let Some(bad) = record
            .reimbursements
            .iter()
            .find(|r| !in_range(r.amount_cents))
        {
            return Err(RecordError::ReimbursementAmount {
                id: record.id.clone(),
                amount_cents: bad.amount_cents,
                max: MAX_RECORD_CENTS,
            });
        }
    }
    Ok(())
}

impl From<&ExpenseRecord> for CompoundingExpense {
    fn from(record: &ExpenseRecord) -> Self {
        CompoundingExpense {
            date_paid: record.date_paid,
            amount_cents: record.amount_cents,
            reimbursements: record.reimbursements.clone(),
        }
    }
}

/// Expenses that still carry a balance, oldest payment first.
///
/// Records paid on the same day keep their relative order.
pub fn outstanding_items(records: &[ExpenseRecord]) -> Vec<OutstandingItem> {
    let mut open = records
        .iter()
        .filter(|record| record.remaining_cents() > 0)
        .collect::<Vec<_>>();
    open.sort_by_key(|record| record.date_paid);
    open.into_iter()
        .map(|record| OutstandingItem {
            id: record.id.clone(),
            remaining_cents: record.remaining_cents(),
        })
        .collect()
}

pub fn compounding_inputs(records: &[ExpenseRecord]) -> Vec<CompoundingExpense> {
    records.iter().map(CompoundingExpense::from).collect()
}
