use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use upkeep_core::{LocationId, Money, PartId};
use upkeep_ledger::{StockAdjustment, StockReservation, StockTransfer};

use upkeep_infra::stock_store::{Pagination, TransactionFilter};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/adjust", post(adjust_stock))
        .route("/transfer", post(transfer_stock))
        .route("/reserve", post(reserve_stock))
        .route("/unreserve", post(unreserve_stock))
        .route("/transactions", get(list_transactions))
        .route("/:part_id", get(list_rows))
        .route("/:part_id/level", get(get_level))
        .route("/:part_id/:location_id/deactivate", post(deactivate_row))
}

fn parse_part_id(s: &str) -> Result<PartId, axum::response::Response> {
    s.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid part id"))
}

fn parse_location_id(s: &str) -> Result<LocationId, axum::response::Response> {
    s.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid location id")
    })
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let part_id = match parse_part_id(&body.part_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let location_id = match parse_location_id(&body.location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let kind = match errors::parse_adjustment_kind(&body.kind) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let reference = match dto::parse_reference(body.reference_kind.as_deref(), body.reference_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let op = StockAdjustment {
        part_id,
        location_id,
        kind,
        quantity: body.quantity,
        unit_cost: body.unit_cost.map(Money::from_minor_units),
        reference,
        note: body.note,
        actor: actor.actor(),
        occurred_at: Utc::now(),
    };

    match services.stock().adjust(op).await {
        Ok(row) => (StatusCode::OK, Json(dto::stock_row_to_json(&row))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn transfer_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::TransferStockRequest>,
) -> axum::response::Response {
    let part_id = match parse_part_id(&body.part_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let from_location_id = match parse_location_id(&body.from_location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let to_location_id = match parse_location_id(&body.to_location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let op = StockTransfer {
        part_id,
        from_location_id,
        to_location_id,
        quantity: body.quantity,
        note: body.note,
        actor: actor.actor(),
        occurred_at: Utc::now(),
    };

    match services.stock().transfer(op).await {
        Ok(outcome) => (StatusCode::OK, Json(dto::transfer_to_json(&outcome))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn reservation_from_request(
    body: dto::ReserveStockRequest,
    actor: ActorContext,
) -> Result<StockReservation, axum::response::Response> {
    let part_id = parse_part_id(&body.part_id)?;
    let location_id = parse_location_id(&body.location_id)?;
    let reference = dto::parse_reference(body.reference_kind.as_deref(), body.reference_id)?;

    Ok(StockReservation {
        part_id,
        location_id,
        quantity: body.quantity,
        reference,
        note: body.note,
        actor: actor.actor(),
        occurred_at: Utc::now(),
    })
}

pub async fn reserve_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::ReserveStockRequest>,
) -> axum::response::Response {
    let op = match reservation_from_request(body, actor) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock().reserve(op).await {
        Ok(row) => (StatusCode::OK, Json(dto::stock_row_to_json(&row))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn unreserve_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::ReserveStockRequest>,
) -> axum::response::Response {
    let op = match reservation_from_request(body, actor) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock().unreserve(op).await {
        Ok(row) => (StatusCode::OK, Json(dto::stock_row_to_json(&row))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_rows(
    Extension(services): Extension<Arc<AppServices>>,
    Path(part_id): Path<String>,
) -> axum::response::Response {
    let part_id = match parse_part_id(&part_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock().rows_for_part(part_id).await {
        Ok(rows) => {
            let items = rows.iter().map(dto::stock_row_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_level(
    Extension(services): Extension<Arc<AppServices>>,
    Path(part_id): Path<String>,
) -> axum::response::Response {
    let part_id = match parse_part_id(&part_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock().part_stock_status(part_id).await {
        Ok(status) => (StatusCode::OK, Json(dto::stock_status_to_json(&status))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn deactivate_row(
    Extension(services): Extension<Arc<AppServices>>,
    Path((part_id, location_id)): Path<(String, String)>,
) -> axum::response::Response {
    let part_id = match parse_part_id(&part_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let location_id = match parse_location_id(&location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .stock()
        .deactivate_row(part_id, location_id, Utc::now())
        .await
    {
        Ok(row) => (StatusCode::OK, Json(dto::stock_row_to_json(&row))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TransactionsQuery>,
) -> axum::response::Response {
    let part_id = match query.part_id.as_deref().map(parse_part_id).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let location_id = match query
        .location_id
        .as_deref()
        .map(parse_location_id)
        .transpose()
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let kind = match query
        .kind
        .as_deref()
        .map(errors::parse_transaction_kind)
        .transpose()
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let filter = TransactionFilter {
        part_id,
        kind,
        location_id,
        occurred_after: query.occurred_after,
        occurred_before: query.occurred_before,
    };
    let pagination = Pagination::new(query.limit, query.offset);

    match services.stock().list_transactions(filter, pagination).await {
        Ok(page) => (StatusCode::OK, Json(dto::transaction_page_to_json(&page))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
