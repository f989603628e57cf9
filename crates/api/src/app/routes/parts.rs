use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use upkeep_catalog::{NewPart, Part};
use upkeep_core::{Money, PartId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_part).get(list_parts))
        .route("/:id", get(get_part))
}

pub async fn register_part(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterPartRequest>,
) -> axum::response::Response {
    let part_id = PartId::new();
    let part = match Part::register(
        part_id,
        NewPart {
            sku: body.sku,
            name: body.name,
            unit_cost: Money::from_minor_units(body.unit_cost),
            reorder_point: body.reorder_point,
            reorder_quantity: body.reorder_quantity,
            min_stock_level: body.min_stock_level,
            max_stock_level: body.max_stock_level,
            unit_of_measure: body.unit_of_measure,
        },
        Utc::now(),
    ) {
        Ok(part) => part,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.register_part(part.clone()).await {
        return errors::domain_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::part_to_json(&part))).into_response()
}

pub async fn get_part(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let part_id: PartId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid part id")
        }
    };

    match services.get_part(part_id).await {
        Ok(part) => (StatusCode::OK, Json(dto::part_to_json(&part))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_parts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_parts().await {
        Ok(parts) => {
            let items = parts.iter().map(dto::part_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
