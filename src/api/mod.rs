mod error;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::{AppConfig, Limits};
use crate::core::{
    Cents, CompoundingConfig, CompoundingResult, ExpenseRecord, OptimizerResult,
    compounding_inputs, filter_to_ytd, optimize, outstanding_items, simulate_with_config,
    validate_records,
};

pub use error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptimizePayload {
    target_cents: Cents,
    #[serde(default)]
    expenses: Vec<ExpenseRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CompoundingPayload {
    expenses: Vec<ExpenseRecord>,
    as_of: Option<NaiveDate>,
    ytd_year: Option<i32>,
    /// Percent, e.g. 10 for 10%.
    annual_return: Option<f64>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(config: AppConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/optimize", post(optimize_handler))
        .route("/api/compounding", post(compounding_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

pub async fn run_http_server(config: AppConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(config.clone());

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "hsa-ledger HTTP API listening");
    info!("Local access: http://127.0.0.1:{}/health", config.port);
    info!(
        max_target_cents = config.limits.max_target_cents(),
        max_items = config.limits.max_items(),
        worst_case_table_bytes = config.limits.worst_case_table_bytes(),
        "optimizer request limits"
    );

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    ApiError::NotFound.into_response()
}

async fn optimize_handler(
    State(config): State<AppConfig>,
    payload: Result<Json<OptimizePayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidJson(e.body_text()))?;
    let result = run_optimize_request(&config.limits, payload)?;
    Ok(json_response(StatusCode::OK, result))
}

async fn compounding_handler(
    payload: Result<Json<CompoundingPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidJson(e.body_text()))?;
    let result = run_compounding_request(payload)?;
    Ok(json_response(StatusCode::OK, result))
}

fn run_optimize_request(limits: &Limits, payload: OptimizePayload) -> ApiResult<OptimizerResult> {
    validate_records(&payload.expenses)?;
    let items = outstanding_items(&payload.expenses);
    limits.check(payload.target_cents, items.len())?;

    let result = optimize(&items, payload.target_cents);
    debug!(
        target_cents = payload.target_cents,
        outstanding = items.len(),
        success = result.success,
        exact = result.exact_match,
        selected = result.selected_item_ids.len(),
        "optimize request handled"
    );
    Ok(result)
}

fn run_compounding_request(payload: CompoundingPayload) -> ApiResult<CompoundingResult> {
    let config = match payload.annual_return {
        None => CompoundingConfig::default(),
        Some(pct) if pct.is_finite() && pct > -100.0 => CompoundingConfig {
            annual_return: pct / 100.0,
        },
        Some(pct) => {
            return Err(ApiError::Validation {
                field: "annualReturn",
                message: format!("must be a finite percentage above -100, got {pct}"),
            });
        }
    };

    validate_records(&payload.expenses)?;
    let inputs = compounding_inputs(&payload.expenses);
    let full = simulate_with_config(&inputs, payload.as_of, config);
    let result = match payload.ytd_year {
        Some(year) => filter_to_ytd(&full, year),
        None => full,
    };
    debug!(
        expenses = inputs.len(),
        points = result.data_points.len(),
        total_gain_cents = result.total_gain_cents,
        "compounding request handled"
    );
    Ok(result)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FailureReason;

    fn optimize_payload_from_json(json: &str) -> OptimizePayload {
        serde_json::from_str(json).expect("valid optimize payload")
    }

    fn compounding_payload_from_json(json: &str) -> CompoundingPayload {
        serde_json::from_str(json).expect("valid compounding payload")
    }

    const RECORDS: &str = r#"[
        {"id": "dentist", "datePaid": "2024-03-10", "amountCents": 5000},
        {"id": "glasses", "datePaid": "2024-01-05", "amountCents": 8000,
         "reimbursements": [{"date": "2024-02-01", "amountCents": 5000}]},
        {"id": "urgent-care", "datePaid": "2024-06-22", "amountCents": 7000},
        {"id": "paid-off", "datePaid": "2023-11-02", "amountCents": 2500,
         "reimbursements": [{"date": "2023-12-01", "amountCents": 2500}]}
    ]"#;

    #[test]
    fn optimize_request_derives_outstanding_items_oldest_first() {
        let payload = optimize_payload_from_json(&format!(
            r#"{{"targetCents": 8000, "expenses": {RECORDS}}}"#
        ));
        let result = run_optimize_request(&Limits::default(), payload).expect("accepted");

        assert!(result.success);
        assert!(result.exact_match);
        assert_eq!(result.total_cents, 8000);
        assert_eq!(result.selected_item_ids, vec!["glasses", "dentist"]);
    }

    #[test]
    fn optimize_request_over_limit_is_rejected() {
        let payload = optimize_payload_from_json(&format!(
            r#"{{"targetCents": 8000, "expenses": {RECORDS}}}"#
        ));
        let limits = Limits::new(5000, 100).expect("valid limits");
        let err = run_optimize_request(&limits, payload).expect_err("over limit");
        assert!(matches!(err, ApiError::Limit(_)));
    }

    #[test]
    fn engine_failures_are_results_not_errors() {
        let payload = optimize_payload_from_json(r#"{"targetCents": 100}"#);
        let result = run_optimize_request(&Limits::default(), payload).expect("accepted");
        assert!(!result.success);
        assert_eq!(result.failure_reason, Some(FailureReason::NoOutstandingItems));
    }

    #[test]
    fn optimizer_result_serializes_camel_case() {
        let payload = optimize_payload_from_json(&format!(
            r#"{{"targetCents": 99999, "expenses": {RECORDS}}}"#
        ));
        let result = run_optimize_request(&Limits::default(), payload).expect("accepted");
        let value = serde_json::to_value(&result).expect("serializable");

        assert_eq!(value["success"], false);
        assert_eq!(value["exactMatch"], false);
        assert_eq!(value["totalCents"], 0);
        assert_eq!(value["failureReason"], "target-exceeds-available");
        assert!(value["selectedItemIds"].as_array().is_some());
        assert!(value["message"].as_str().is_some());
    }

    #[test]
    fn compounding_request_serializes_months_as_strings() {
        let payload = compounding_payload_from_json(&format!(
            r#"{{"expenses": {RECORDS}, "asOf": "2024-12-31"}}"#
        ));
        let result = run_compounding_request(payload).expect("accepted");
        let value = serde_json::to_value(&result).expect("serializable");

        assert_eq!(value["dataPoints"][0]["month"], "2023-11");
        assert_eq!(value["dataPoints"].as_array().map(Vec::len), Some(14));
        assert_eq!(value["totalInvestedCents"], 5000 + 3000 + 7000);
        assert!(value["totalGainCents"].as_i64().is_some_and(|g| g > 0));
    }

    #[test]
    fn compounding_request_applies_ytd_window() {
        let payload = compounding_payload_from_json(&format!(
            r#"{{"expenses": {RECORDS}, "asOf": "2024-06-30", "ytdYear": 2024}}"#
        ));
        let result = run_compounding_request(payload).expect("accepted");
        assert_eq!(result.data_points.len(), 6);
        assert!(result.data_points.iter().all(|p| p.month.year() == 2024));
    }

    #[test]
    fn compounding_request_rejects_bad_rate() {
        let payload = compounding_payload_from_json(r#"{"annualReturn": -150}"#);
        let err = run_compounding_request(payload).expect_err("invalid rate");
        assert!(err.to_string().contains("annualReturn"));
    }

    #[test]
    fn compounding_request_rejects_overflowing_amounts() {
        let payload = compounding_payload_from_json(
            r#"{"expenses": [
                {"id": "a", "datePaid": "2024-01-02", "amountCents": 9000000000000000000},
                {"id": "b", "datePaid": "2024-01-09", "amountCents": 9000000000000000000}
            ], "asOf": "2024-03-01"}"#,
        );
        let err = run_compounding_request(payload).expect_err("out of range");
        assert!(matches!(err, ApiError::InvalidRecord(_)));
    }

    #[test]
    fn optimize_request_rejects_negative_reimbursement() {
        let payload = optimize_payload_from_json(
            r#"{"targetCents": 100, "expenses": [
                {"id": "a", "datePaid": "2024-01-02", "amountCents": 9000000000000000000,
                 "reimbursements": [{"date": "2024-01-03", "amountCents": -9000000000000000000}]}
            ]}"#,
        );
        let err = run_optimize_request(&Limits::default(), payload).expect_err("out of range");
        assert!(matches!(err, ApiError::InvalidRecord(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn optimize_handler_returns_ok_with_no_store() {
        let payload = optimize_payload_from_json(&format!(
            r#"{{"targetCents": 5000, "expenses": {RECORDS}}}"#
        ));
        let response = optimize_handler(State(AppConfig::default()), Ok(Json(payload)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
    }

    #[tokio::test]
    async fn limit_rejection_maps_to_bad_request() {
        let payload = optimize_payload_from_json(r#"{"targetCents": 50000000}"#);
        let response = optimize_handler(State(AppConfig::default()), Ok(Json(payload)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
