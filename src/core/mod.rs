mod compounding;
mod months;
mod optimizer;
mod records;
mod types;

pub use compounding::{filter_to_ytd, monthly_rate, simulate, simulate_with_config};
pub use months::{ParseYearMonthError, YearMonth, month_range};
pub use optimizer::optimize;
pub use records::{
    ExpenseRecord, MAX_RECORD_CENTS, RecordError, compounding_inputs, outstanding_items,
    validate_records,
};
pub use types::{
    Cents, CompoundingConfig, CompoundingExpense, CompoundingResult, FailureReason,
    MonthlyDataPoint, OptimizerResult, OutstandingItem, Reimbursement,
};
