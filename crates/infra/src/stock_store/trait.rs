use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use upkeep_core::{DomainError, LocationId, Money, PartId};
use upkeep_ledger::{
    AssetConsumption, AssetConsumptionRecord, StockAdjustment, StockLevel, StockReservation,
    StockRow, StockTransfer,
};

use super::query::{Pagination, TransactionFilter, TransactionPage};

/// Stock store operation error.
///
/// Domain failures are deterministic and caller-correctable; storage failures
/// are transient infrastructure problems. In both cases the operation was
/// rolled back with no partial effect — retry, if any, is a caller decision.
#[derive(Debug, Error)]
pub enum StockStoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl StockStoreError {
    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StockStoreError>;

/// Both sides of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub from_row: StockRow,
    pub to_row: StockRow,
}

/// Atomic stock ledger storage.
///
/// The store is the only component permitted to mutate stock rows. Every
/// mutating method performs read → validate → write inside one atomic unit
/// and pairs the row change with exactly one transaction-log append; either
/// both are committed or neither is. Guards are always evaluated against row
/// state read inside that same unit, never against a value the caller read
/// earlier, so concurrent operations on the same `(part, location)` cannot
/// lose updates.
///
/// Rows are created lazily by the first receipt, positive adjustment, or
/// transfer-in for a `(part, location)` pair; a failed operation never
/// creates one. Read methods take no locks and reflect committed state only.
///
/// Implementations must:
/// - enforce the quantity invariants (`on_hand >= 0`, `0 <= reserved <= on_hand`)
///   on every committed row
/// - append transaction entries immutably (no update, no delete)
/// - apply both sides of a transfer atomically, with no observable
///   intermediate state
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Current row for one part at one location, if it has ever held stock.
    async fn get_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
    ) -> StoreResult<Option<StockRow>>;

    /// All rows for a part across locations.
    async fn list_rows_for_part(&self, part_id: PartId) -> StoreResult<Vec<StockRow>>;

    /// Summed on-hand/reserved/available for a part across locations.
    async fn aggregate(&self, part_id: PartId) -> StoreResult<StockLevel>;

    /// Distinct parts that have a stock row.
    async fn part_ids_with_stock(&self) -> StoreResult<Vec<PartId>>;

    /// Receive, issue, or correct stock at one location.
    async fn apply_adjustment(&self, op: &StockAdjustment) -> StoreResult<StockRow>;

    /// Move stock between two locations, both sides atomically.
    async fn apply_transfer(&self, op: &StockTransfer) -> StoreResult<TransferOutcome>;

    /// Place a soft hold on stock.
    async fn apply_reserve(&self, op: &StockReservation) -> StoreResult<StockRow>;

    /// Release a soft hold.
    async fn apply_unreserve(&self, op: &StockReservation) -> StoreResult<StockRow>;

    /// Issue stock onto an asset and write the historical-cost usage record,
    /// both in the same atomic unit. `unit_cost` is the resolved snapshot
    /// (override or current catalog cost).
    async fn record_consumption(
        &self,
        op: &AssetConsumption,
        unit_cost: Money,
    ) -> StoreResult<AssetConsumptionRecord>;

    /// Soft-deactivate an emptied row. Rows referenced by transactions are
    /// never deleted.
    async fn deactivate_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
        now: DateTime<Utc>,
    ) -> StoreResult<StockRow>;

    /// Page through the transaction log, newest first.
    async fn query_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> StoreResult<TransactionPage>;
}

#[async_trait]
impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    async fn get_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
    ) -> StoreResult<Option<StockRow>> {
        (**self).get_row(part_id, location_id).await
    }

    async fn list_rows_for_part(&self, part_id: PartId) -> StoreResult<Vec<StockRow>> {
        (**self).list_rows_for_part(part_id).await
    }

    async fn aggregate(&self, part_id: PartId) -> StoreResult<StockLevel> {
        (**self).aggregate(part_id).await
    }

    async fn part_ids_with_stock(&self) -> StoreResult<Vec<PartId>> {
        (**self).part_ids_with_stock().await
    }

    async fn apply_adjustment(&self, op: &StockAdjustment) -> StoreResult<StockRow> {
        (**self).apply_adjustment(op).await
    }

    async fn apply_transfer(&self, op: &StockTransfer) -> StoreResult<TransferOutcome> {
        (**self).apply_transfer(op).await
    }

    async fn apply_reserve(&self, op: &StockReservation) -> StoreResult<StockRow> {
        (**self).apply_reserve(op).await
    }

    async fn apply_unreserve(&self, op: &StockReservation) -> StoreResult<StockRow> {
        (**self).apply_unreserve(op).await
    }

    async fn record_consumption(
        &self,
        op: &AssetConsumption,
        unit_cost: Money,
    ) -> StoreResult<AssetConsumptionRecord> {
        (**self).record_consumption(op, unit_cost).await
    }

    async fn deactivate_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
        now: DateTime<Utc>,
    ) -> StoreResult<StockRow> {
        (**self).deactivate_row(part_id, location_id, now).await
    }

    async fn query_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> StoreResult<TransactionPage> {
        (**self).query_transactions(filter, pagination).await
    }
}
