use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use upkeep_core::{AssetId, LocationId, Money, PartId, WorkOrderId};
use upkeep_ledger::AssetConsumption;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_asset))
        .route("/:id/consume", post(consume_part))
}

pub async fn register_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterAssetRequest>,
) -> axum::response::Response {
    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name cannot be empty");
    }

    let asset_id = AssetId::new();
    if let Err(e) = services.register_asset(asset_id, &body.name).await {
        return errors::domain_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": asset_id.to_string() })),
    )
        .into_response()
}

pub async fn consume_part(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ConsumePartRequest>,
) -> axum::response::Response {
    let asset_id: AssetId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid asset id")
        }
    };
    let part_id: PartId = match body.part_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid part id")
        }
    };
    let location_id: LocationId = match body.location_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid location id")
        }
    };
    let work_order_id: Option<WorkOrderId> = match body.work_order_id.as_deref().map(str::parse) {
        Some(Ok(v)) => Some(v),
        Some(Err(_)) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid work order id")
        }
        None => None,
    };

    let op = AssetConsumption {
        asset_id,
        part_id,
        location_id,
        quantity: body.quantity,
        unit_cost_override: body.unit_cost_override.map(Money::from_minor_units),
        work_order_id,
        note: body.note,
        actor: actor.actor(),
        occurred_at: Utc::now(),
    };

    match services.stock().use_part_on_asset(op).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(dto::consumption_to_json(&record))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
