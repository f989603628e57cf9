use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use upkeep_catalog::Part;
use upkeep_infra::stock_service::PartStockStatus;
use upkeep_infra::stock_store::{TransactionPage, TransferOutcome};
use upkeep_ledger::{AssetConsumptionRecord, Reference, ReferenceKind, StockRow, TransactionEntry};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub part_id: String,
    pub location_id: String,
    /// One of: receive, issue, adjust.
    pub kind: String,
    pub quantity: i64,
    /// Minor units; defaults to the part's current catalog cost.
    pub unit_cost: Option<i64>,
    pub reference_kind: Option<String>,
    pub reference_id: Option<uuid::Uuid>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransferStockRequest {
    pub part_id: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub quantity: i64,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReserveStockRequest {
    pub part_id: String,
    pub location_id: String,
    pub quantity: i64,
    pub reference_kind: Option<String>,
    pub reference_id: Option<uuid::Uuid>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumePartRequest {
    pub part_id: String,
    pub location_id: String,
    pub quantity: i64,
    /// Minor units; overrides the catalog cost snapshot.
    pub unit_cost_override: Option<i64>,
    pub work_order_id: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub part_id: Option<String>,
    pub kind: Option<String>,
    pub location_id: Option<String>,
    pub occurred_after: Option<DateTime<Utc>>,
    pub occurred_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPartRequest {
    pub sku: String,
    pub name: String,
    /// Minor units.
    pub unit_cost: i64,
    pub reorder_point: i64,
    pub reorder_quantity: i64,
    pub min_stock_level: i64,
    pub max_stock_level: Option<i64>,
    pub unit_of_measure: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterLocationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterAssetRequest {
    pub name: String,
}

/// Build an optional transaction reference from its two request fields.
/// Both must be present or both absent.
pub fn parse_reference(
    kind: Option<&str>,
    id: Option<uuid::Uuid>,
) -> Result<Option<Reference>, axum::response::Response> {
    match (kind, id) {
        (None, None) => Ok(None),
        (Some(kind), Some(id)) => match ReferenceKind::from_code(kind) {
            Ok(kind) => Ok(Some(Reference { kind, id })),
            Err(_) => Err(errors::json_error(
                axum::http::StatusCode::BAD_REQUEST,
                "invalid_reference",
                "reference_kind must be one of: work_order, asset_consumption, purchase_order, manual_count",
            )),
        },
        _ => Err(errors::json_error(
            axum::http::StatusCode::BAD_REQUEST,
            "invalid_reference",
            "reference_kind and reference_id must be provided together",
        )),
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn stock_row_to_json(row: &StockRow) -> serde_json::Value {
    json!({
        "part_id": row.part_id().to_string(),
        "location_id": row.location_id().to_string(),
        "quantity_on_hand": row.on_hand(),
        "quantity_reserved": row.reserved(),
        "quantity_available": row.available(),
        "is_active": row.is_active(),
        "updated_at": row.updated_at().to_rfc3339(),
    })
}

pub fn transfer_to_json(outcome: &TransferOutcome) -> serde_json::Value {
    json!({
        "from": stock_row_to_json(&outcome.from_row),
        "to": stock_row_to_json(&outcome.to_row),
    })
}

pub fn entry_to_json(entry: &TransactionEntry) -> serde_json::Value {
    json!({
        "entry_id": entry.entry_id.to_string(),
        "part_id": entry.part_id.to_string(),
        "source_location_id": entry.source_location_id.map(|id| id.to_string()),
        "destination_location_id": entry.destination_location_id.map(|id| id.to_string()),
        "kind": entry.kind.code(),
        "quantity": entry.quantity,
        "unit_cost": entry.unit_cost.map(|cost| cost.minor_units()),
        "reference_kind": entry.reference.map(|r| r.kind.code()),
        "reference_id": entry.reference.map(|r| r.id.to_string()),
        "note": entry.note,
        "actor": entry.actor.to_string(),
        "occurred_at": entry.occurred_at.to_rfc3339(),
    })
}

pub fn transaction_page_to_json(page: &TransactionPage) -> serde_json::Value {
    json!({
        "items": page.entries.iter().map(entry_to_json).collect::<Vec<_>>(),
        "total": page.total,
        "limit": page.pagination.limit,
        "offset": page.pagination.offset,
        "has_more": page.has_more,
    })
}

pub fn part_to_json(part: &Part) -> serde_json::Value {
    json!({
        "part_id": part.id.to_string(),
        "sku": part.sku,
        "name": part.name,
        "unit_cost": part.unit_cost.minor_units(),
        "reorder_point": part.reorder_point,
        "reorder_quantity": part.reorder_quantity,
        "min_stock_level": part.min_stock_level,
        "max_stock_level": part.max_stock_level,
        "unit_of_measure": part.unit_of_measure,
        "status": part.status.code(),
        "created_at": part.created_at.to_rfc3339(),
        "updated_at": part.updated_at.to_rfc3339(),
    })
}

pub fn stock_status_to_json(status: &PartStockStatus) -> serde_json::Value {
    json!({
        "part_id": status.part.id.to_string(),
        "sku": status.part.sku,
        "name": status.part.name,
        "quantity_on_hand": status.level.on_hand,
        "quantity_reserved": status.level.reserved,
        "quantity_available": status.level.available,
        "reorder_point": status.part.reorder_point,
        "reorder_quantity": status.part.reorder_quantity,
        "min_stock_level": status.part.min_stock_level,
        "status": status.status.code(),
        "valuation": status.valuation.minor_units(),
    })
}

pub fn consumption_to_json(record: &AssetConsumptionRecord) -> serde_json::Value {
    json!({
        "record_id": record.record_id.to_string(),
        "asset_id": record.asset_id.to_string(),
        "part_id": record.part_id.to_string(),
        "location_id": record.location_id.to_string(),
        "work_order_id": record.work_order_id.map(|id| id.to_string()),
        "quantity": record.quantity,
        "unit_cost_at_use": record.unit_cost_at_use.minor_units(),
        "total_cost": record.total_cost().ok().map(|cost| cost.minor_units()),
        "note": record.note,
        "actor": record.actor.to_string(),
        "occurred_at": record.occurred_at.to_rfc3339(),
    })
}
