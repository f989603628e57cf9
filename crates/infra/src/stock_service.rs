//! Stock operations service (application-level orchestration).
//!
//! This is the single entry point callers use to mutate or inspect the stock
//! ledger. It composes the `StockStore` with the catalog/location/asset
//! lookup collaborators:
//!
//! ```text
//! Operation
//!   ↓
//! 1. Validate input shape (signs, distinct locations)
//!   ↓
//! 2. Resolve referential validity through the lookup collaborators
//!   ↓
//! 3. Resolve the unit cost snapshot (override or current catalog cost)
//!   ↓
//! 4. Delegate to the store (atomic read-validate-write + log append)
//! ```
//!
//! The service contains no storage code itself; it composes infrastructure
//! traits, so it is testable with in-memory implementations and swappable
//! with the Postgres backend.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use upkeep_catalog::{AssetRegistry, LocationDirectory, Part, PartCatalog};
use upkeep_core::{DomainError, LocationId, Money, PartId};
use upkeep_ledger::{
    AssetConsumption, AssetConsumptionRecord, ReorderPolicy, ReorderStatus, StockAdjustment,
    StockLevel, StockReservation, StockRow, StockTransfer,
};

use crate::stock_store::{
    Pagination, StockStore, StockStoreError, TransactionFilter, TransactionPage, TransferOutcome,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Deterministic domain failure; surfaced verbatim to the caller.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Transient infrastructure failure; retry is a caller decision.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StockStoreError> for ServiceError {
    fn from(value: StockStoreError) -> Self {
        match value {
            StockStoreError::Domain(err) => ServiceError::Domain(err),
            StockStoreError::Storage { operation, message } => {
                ServiceError::Storage(format!("{operation}: {message}"))
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A part's aggregated position: level, classification, valuation.
#[derive(Debug, Clone, Serialize)]
pub struct PartStockStatus {
    pub part: Part,
    pub level: StockLevel,
    pub status: ReorderStatus,
    /// Aggregated on-hand at the current catalog unit cost.
    pub valuation: Money,
}

/// Stock operations service.
pub struct StockService<S> {
    store: S,
    catalog: Arc<dyn PartCatalog>,
    locations: Arc<dyn LocationDirectory>,
    assets: Arc<dyn AssetRegistry>,
}

impl<S> StockService<S>
where
    S: StockStore,
{
    pub fn new(
        store: S,
        catalog: Arc<dyn PartCatalog>,
        locations: Arc<dyn LocationDirectory>,
        assets: Arc<dyn AssetRegistry>,
    ) -> Self {
        Self {
            store,
            catalog,
            locations,
            assets,
        }
    }

    /// Receive, issue, or correct stock at one location.
    ///
    /// If the operation does not carry an explicit unit cost, the part's
    /// current catalog cost is snapshotted into the transaction entry.
    #[instrument(skip(self, op), fields(part_id = %op.part_id, kind = ?op.kind), err)]
    pub async fn adjust(&self, mut op: StockAdjustment) -> ServiceResult<StockRow> {
        op.validate()?;
        let part = self.catalog.active_part(op.part_id).await?;
        self.locations.ensure_location(op.location_id).await?;

        if op.unit_cost.is_none() {
            op.unit_cost = Some(part.unit_cost);
        }

        Ok(self.store.apply_adjustment(&op).await?)
    }

    /// Move stock between two locations, both sides atomically.
    #[instrument(skip(self, op), fields(part_id = %op.part_id), err)]
    pub async fn transfer(&self, op: StockTransfer) -> ServiceResult<TransferOutcome> {
        op.validate()?;
        self.catalog.active_part(op.part_id).await?;
        self.locations.ensure_location(op.from_location_id).await?;
        self.locations.ensure_location(op.to_location_id).await?;

        Ok(self.store.apply_transfer(&op).await?)
    }

    /// Place a soft hold on stock.
    #[instrument(skip(self, op), fields(part_id = %op.part_id), err)]
    pub async fn reserve(&self, op: StockReservation) -> ServiceResult<StockRow> {
        op.validate()?;
        self.catalog.active_part(op.part_id).await?;
        self.locations.ensure_location(op.location_id).await?;

        Ok(self.store.apply_reserve(&op).await?)
    }

    /// Release a soft hold.
    ///
    /// Existence only, not activity: a hold placed while the part was active
    /// must remain releasable after the part is discontinued.
    #[instrument(skip(self, op), fields(part_id = %op.part_id), err)]
    pub async fn unreserve(&self, op: StockReservation) -> ServiceResult<StockRow> {
        op.validate()?;
        self.catalog.part(op.part_id).await?;
        self.locations.ensure_location(op.location_id).await?;

        Ok(self.store.apply_unreserve(&op).await?)
    }

    /// Issue stock onto an asset and record the historical-cost usage, both
    /// in the same atomic unit.
    #[instrument(
        skip(self, op),
        fields(asset_id = %op.asset_id, part_id = %op.part_id),
        err
    )]
    pub async fn use_part_on_asset(
        &self,
        op: AssetConsumption,
    ) -> ServiceResult<AssetConsumptionRecord> {
        op.validate()?;
        let part = self.catalog.active_part(op.part_id).await?;
        self.locations.ensure_location(op.location_id).await?;
        self.assets.ensure_asset(op.asset_id).await?;

        let unit_cost = op.unit_cost_override.unwrap_or(part.unit_cost);
        Ok(self.store.record_consumption(&op, unit_cost).await?)
    }

    /// Current row for one part at one location.
    pub async fn get_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
    ) -> ServiceResult<Option<StockRow>> {
        self.catalog.part(part_id).await?;
        Ok(self.store.get_row(part_id, location_id).await?)
    }

    /// All rows for a part across locations.
    pub async fn rows_for_part(&self, part_id: PartId) -> ServiceResult<Vec<StockRow>> {
        self.catalog.part(part_id).await?;
        Ok(self.store.list_rows_for_part(part_id).await?)
    }

    /// Aggregated level, reorder classification, and valuation for one part.
    pub async fn part_stock_status(&self, part_id: PartId) -> ServiceResult<PartStockStatus> {
        let part = self.catalog.part(part_id).await?;
        let level = self.store.aggregate(part_id).await?;
        let status =
            ReorderPolicy::new(part.min_stock_level, part.reorder_point).classify(level.available);
        let valuation = part.unit_cost.times(level.on_hand)?;

        Ok(PartStockStatus {
            part,
            level,
            status,
            valuation,
        })
    }

    /// Page through the transaction log, newest first.
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> ServiceResult<TransactionPage> {
        Ok(self.store.query_transactions(filter, pagination).await?)
    }

    /// Every active part whose aggregated classification is not `Ok`,
    /// most urgent first.
    #[instrument(skip(self), err)]
    pub async fn low_stock_report(&self) -> ServiceResult<Vec<PartStockStatus>> {
        let parts = self.catalog.list_parts().await?;

        let mut report = Vec::new();
        for part in parts {
            if !part.accepts_stock() {
                continue;
            }
            let level = self.store.aggregate(part.id).await?;
            let status = ReorderPolicy::new(part.min_stock_level, part.reorder_point)
                .classify(level.available);
            if !status.needs_attention() {
                continue;
            }
            let valuation = part.unit_cost.times(level.on_hand)?;
            report.push(PartStockStatus {
                part,
                level,
                status,
                valuation,
            });
        }

        let urgency = |status: ReorderStatus| match status {
            ReorderStatus::OutOfStock => 0,
            ReorderStatus::Critical => 1,
            ReorderStatus::Low => 2,
            ReorderStatus::Ok => 3,
        };
        report.sort_by(|a, b| {
            urgency(a.status)
                .cmp(&urgency(b.status))
                .then_with(|| a.part.sku.cmp(&b.part.sku))
        });

        Ok(report)
    }

    /// Valuation of every part currently holding stock: aggregated on-hand
    /// at the current catalog unit cost, ordered by SKU.
    #[instrument(skip(self), err)]
    pub async fn inventory_valuation(&self) -> ServiceResult<Vec<PartStockStatus>> {
        let mut out = Vec::new();
        for part_id in self.store.part_ids_with_stock().await? {
            out.push(self.part_stock_status(part_id).await?);
        }
        out.sort_by(|a, b| a.part.sku.cmp(&b.part.sku));
        Ok(out)
    }

    /// Soft-deactivate an emptied row.
    pub async fn deactivate_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
        now: DateTime<Utc>,
    ) -> ServiceResult<StockRow> {
        self.catalog.part(part_id).await?;
        Ok(self.store.deactivate_row(part_id, location_id, now).await?)
    }
}
