use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use upkeep_core::DomainError;
use upkeep_infra::stock_service::ServiceError;
use upkeep_ledger::{AdjustmentKind, TransactionKind};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(domain) => domain_error_to_response(domain),
        ServiceError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvalidOperation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_operation", msg)
        }
        DomainError::InsufficientStock {
            requested,
            available,
        } => json_error(
            StatusCode::CONFLICT,
            "insufficient_stock",
            format!("requested {requested}, available {available}"),
        ),
        DomainError::NotFound(kind) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{kind} not found"))
        }
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_adjustment_kind(s: &str) -> Result<AdjustmentKind, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "receive" => Ok(AdjustmentKind::Receive),
        "issue" => Ok(AdjustmentKind::Issue),
        "adjust" => Ok(AdjustmentKind::Adjust),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_kind",
            "kind must be one of: receive, issue, adjust",
        )),
    }
}

pub fn parse_transaction_kind(s: &str) -> Result<TransactionKind, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "receive" => Ok(TransactionKind::Receive),
        "issue" => Ok(TransactionKind::Issue),
        "adjust" => Ok(TransactionKind::Adjust),
        "transfer" => Ok(TransactionKind::Transfer),
        "reserve" => Ok(TransactionKind::Reserve),
        "unreserve" => Ok(TransactionKind::Unreserve),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_kind",
            "kind must be one of: receive, issue, adjust, transfer, reserve, unreserve",
        )),
    }
}
