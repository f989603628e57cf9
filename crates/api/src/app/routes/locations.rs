use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use upkeep_core::LocationId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(register_location))
}

pub async fn register_location(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterLocationRequest>,
) -> axum::response::Response {
    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name cannot be empty");
    }

    let location_id = LocationId::new();
    if let Err(e) = services.register_location(location_id, &body.name).await {
        return errors::domain_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": location_id.to_string() })),
    )
        .into_response()
}
