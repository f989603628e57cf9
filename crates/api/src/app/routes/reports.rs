use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/low-stock", get(low_stock))
        .route("/valuation", get(valuation))
}

/// Every active part whose aggregated classification is not Ok.
pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.stock().low_stock_report().await {
        Ok(report) => {
            let items = report
                .iter()
                .map(dto::stock_status_to_json)
                .collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "count": items.len(),
                    "items": items,
                })),
            )
                .into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Aggregated on-hand value per part at current catalog cost.
pub async fn valuation(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.stock().inventory_valuation().await {
        Ok(report) => {
            let total: i64 = report.iter().map(|s| s.valuation.minor_units()).sum();
            let items = report
                .iter()
                .map(dto::stock_status_to_json)
                .collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "total_value": total,
                    "items": items,
                })),
            )
                .into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
