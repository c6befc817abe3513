use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::months::YearMonth;

/// Integer cents. Every monetary amount crossing the engine boundary uses this unit.
pub type Cents = i64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingItem {
    pub id: String,
    pub remaining_cents: Cents,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    NonPositiveTarget,
    NoOutstandingItems,
    TargetExceedsAvailable,
    InvalidItem,
    NoCombination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerResult {
    pub success: bool,
    pub exact_match: bool,
    pub selected_item_ids: Vec<String>,
    pub total_cents: Cents,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

impl OptimizerResult {
    pub(crate) fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            success: false,
            exact_match: false,
            selected_item_ids: Vec::new(),
            total_cents: 0,
            message: message.into(),
            failure_reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reimbursement {
    pub date: NaiveDate,
    pub amount_cents: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundingExpense {
    pub date_paid: NaiveDate,
    pub amount_cents: Cents,
    #[serde(default)]
    pub reimbursements: Vec<Reimbursement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDataPoint {
    pub month: YearMonth,
    pub cumulative_gain_cents: Cents,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundingResult {
    pub data_points: Vec<MonthlyDataPoint>,
    pub total_gain_cents: Cents,
    pub total_invested_cents: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundingConfig {
    /// Nominal annual return as a fraction, e.g. 0.10 for 10%.
    pub annual_return: f64,
}

impl Default for CompoundingConfig {
    fn default() -> Self {
        Self {
            annual_return: 0.10,
        }
    }
}
