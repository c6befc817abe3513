use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::api::run_http_server;
use crate::config::{
    AppConfig, DEFAULT_MAX_ITEMS, DEFAULT_MAX_TARGET_CENTS, DEFAULT_PORT, Limits,
};
use crate::core::{
    Cents, CompoundingResult, ExpenseRecord, OptimizerResult, compounding_inputs, filter_to_ytd,
    optimize, outstanding_items, simulate, validate_records,
};
use crate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "hsa-ledger",
    about = "Reimbursement optimizer and HSA compounding simulator for medical expenses"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the JSON HTTP API.
    Serve {
        #[arg(long, env = "HSA_LEDGER_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Pick the fewest outstanding expenses that add up to a payout.
    Optimize {
        #[arg(long, help = "JSON file holding an array of expense records")]
        records: PathBuf,
        #[arg(long, allow_negative_numbers = true, help = "Payout to match, in cents")]
        target_cents: Cents,
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Show the growth earned by leaving expenses unreimbursed.
    Simulate {
        #[arg(long, help = "JSON file holding an array of expense records")]
        records: PathBuf,
        #[arg(long, help = "Last day of the simulation (YYYY-MM-DD); defaults to today")]
        as_of: Option<NaiveDate>,
        #[arg(long, help = "Re-base the series to gains earned within this calendar year")]
        ytd_year: Option<i32>,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct LimitArgs {
    #[arg(
        long,
        env = "HSA_LEDGER_MAX_TARGET_CENTS",
        default_value_t = DEFAULT_MAX_TARGET_CENTS,
        help = "Largest optimizer target accepted, in cents"
    )]
    pub max_target_cents: Cents,
    #[arg(
        long,
        env = "HSA_LEDGER_MAX_ITEMS",
        default_value_t = DEFAULT_MAX_ITEMS,
        help = "Largest number of outstanding expenses searched at once"
    )]
    pub max_items: usize,
}

impl LimitArgs {
    fn build(self) -> Result<Limits, AppError> {
        Ok(Limits::new(self.max_target_cents, self.max_items)?)
    }
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve { port, limits } => {
            let config = AppConfig {
                port,
                limits: limits.build()?,
            };
            run_http_server(config).await?;
        }
        Command::Optimize {
            records,
            target_cents,
            limits,
        } => {
            let result = run_optimize(&records, target_cents, &limits.build()?)?;
            print_json(&result)?;
        }
        Command::Simulate {
            records,
            as_of,
            ytd_year,
        } => {
            let result = run_simulate(&records, as_of, ytd_year)?;
            print_json(&result)?;
        }
    }
    Ok(())
}

fn run_optimize(
    path: &Path,
    target_cents: Cents,
    limits: &Limits,
) -> Result<OptimizerResult, AppError> {
    let records = load_records(path)?;
    let items = outstanding_items(&records);
    limits.check(target_cents, items.len())?;

    let result = optimize(&items, target_cents);
    info!(
        success = result.success,
        exact = result.exact_match,
        total_cents = result.total_cents,
        "{}",
        result.message
    );
    Ok(result)
}

fn run_simulate(
    path: &Path,
    as_of: Option<NaiveDate>,
    ytd_year: Option<i32>,
) -> Result<CompoundingResult, AppError> {
    let records = load_records(path)?;
    let full = simulate(&compounding_inputs(&records), as_of);
    Ok(match ytd_year {
        Some(year) => filter_to_ytd(&full, year),
        None => full,
    })
}

fn load_records(path: &Path) -> Result<Vec<ExpenseRecord>, AppError> {
    let raw = fs::read_to_string(path).map_err(|source| AppError::ReadRecords {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<ExpenseRecord> =
        serde_json::from_str(&raw).map_err(|source| AppError::ParseRecords {
            path: path.to_path_buf(),
            source,
        })?;
    validate_records(&records)?;
    Ok(records)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    fn records_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write records");
        file
    }

    const RECORDS: &str = r#"[
        {"id": "a", "datePaid": "2024-01-15", "amountCents": 4000},
        {"id": "b", "datePaid": "2024-02-15", "amountCents": 4000},
        {"id": "c", "datePaid": "2024-03-15", "amountCents": 2500}
    ]"#;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_optimize_with_negative_target() {
        let cli = Cli::try_parse_from([
            "hsa-ledger",
            "optimize",
            "--records",
            "r.json",
            "--target-cents",
            "-10",
        ])
        .expect("parses");
        assert!(matches!(
            cli.command,
            Command::Optimize {
                target_cents: -10,
                ..
            }
        ));
    }

    #[test]
    fn parses_simulate_dates() {
        let cli = Cli::try_parse_from([
            "hsa-ledger",
            "simulate",
            "--records",
            "r.json",
            "--as-of",
            "2024-06-30",
            "--ytd-year",
            "2024",
        ])
        .expect("parses");
        let Command::Simulate { as_of, ytd_year, .. } = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(as_of, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(ytd_year, Some(2024));
    }

    #[test]
    fn optimize_from_file_prefers_older_equal_expense() {
        let file = records_file(RECORDS);
        let result = run_optimize(file.path(), 4000, &Limits::default()).expect("runs");
        assert_eq!(result.selected_item_ids, vec!["a"]);
    }

    #[test]
    fn simulate_from_file_covers_every_month() {
        let file = records_file(RECORDS);
        let as_of = NaiveDate::from_ymd_opt(2024, 12, 31);
        let result = run_simulate(file.path(), as_of, None).expect("runs");
        assert_eq!(result.data_points.len(), 12);
        assert_eq!(result.total_invested_cents, 10_500);
    }

    #[test]
    fn missing_and_malformed_files_are_reported() {
        let missing = run_simulate(Path::new("/nonexistent/records.json"), None, None);
        assert!(matches!(missing, Err(AppError::ReadRecords { .. })));

        let file = records_file("{not json");
        let malformed = run_simulate(file.path(), None, None);
        assert!(matches!(malformed, Err(AppError::ParseRecords { .. })));
    }

    #[test]
    fn out_of_range_amounts_in_files_are_rejected() {
        let file = records_file(
            r#"[{"id": "a", "datePaid": "2024-01-02", "amountCents": 9000000000000000000},
                {"id": "b", "datePaid": "2024-01-09", "amountCents": 9000000000000000000}]"#,
        );
        let simulated = run_simulate(file.path(), None, None);
        assert!(matches!(simulated, Err(AppError::InvalidRecord(_))));

        let negative = records_file(
            r#"[{"id": "n", "datePaid": "2024-01-02", "amountCents": 500,
                 "reimbursements": [{"date": "2024-01-03", "amountCents": -500}]}]"#,
        );
        let optimized = run_optimize(negative.path(), 100, &Limits::default());
        assert!(matches!(optimized, Err(AppError::InvalidRecord(_))));
    }

    #[test]
    fn limits_apply_to_cli_requests() {
        let file = records_file(RECORDS);
        let limits = Limits::new(1000, 10).expect("valid limits");
        let err = run_optimize(file.path(), 4000, &limits).expect_err("over limit");
        assert!(matches!(err, AppError::Limit(_)));
    }
}
