use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use upkeep_core::{DomainError, LocationId, Money, PartId};
use upkeep_ledger::{
    AdjustmentKind, AssetConsumption, AssetConsumptionRecord, Reference, ReferenceKind,
    StockAdjustment, StockLevel, StockReservation, StockRow, StockTransfer, TransactionEntry,
    TransactionKind,
};

use super::query::{Pagination, TransactionFilter, TransactionPage};
use super::r#trait::{StockStore, StockStoreError, StoreResult, TransferOutcome};

#[derive(Debug, Default)]
struct LedgerState {
    rows: HashMap<(PartId, LocationId), StockRow>,
    log: Vec<TransactionEntry>,
    consumptions: Vec<AssetConsumptionRecord>,
}

/// In-memory stock store.
///
/// Intended for tests/dev. A single mutex guards the whole ledger and is held
/// across validate + write, which is what makes each operation atomic here:
/// a failed guard returns before anything is inserted, so no partial state is
/// ever observable.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    state: Mutex<LedgerState>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| StockStoreError::storage("lock", "mutex poisoned"))
    }

    /// Snapshot of all consumption records (reporting/tests).
    pub fn consumptions(&self) -> StoreResult<Vec<AssetConsumptionRecord>> {
        Ok(self.lock()?.consumptions.clone())
    }
}

fn row_or_open(
    state: &LedgerState,
    part_id: PartId,
    location_id: LocationId,
    now: DateTime<Utc>,
) -> StockRow {
    state
        .rows
        .get(&(part_id, location_id))
        .cloned()
        .unwrap_or_else(|| StockRow::open(part_id, location_id, now))
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn get_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
    ) -> StoreResult<Option<StockRow>> {
        Ok(self.lock()?.rows.get(&(part_id, location_id)).cloned())
    }

    async fn list_rows_for_part(&self, part_id: PartId) -> StoreResult<Vec<StockRow>> {
        let state = self.lock()?;
        let mut rows: Vec<StockRow> = state
            .rows
            .values()
            .filter(|row| row.part_id() == part_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| *row.location_id().as_uuid());
        Ok(rows)
    }

    async fn aggregate(&self, part_id: PartId) -> StoreResult<StockLevel> {
        let state = self.lock()?;
        Ok(StockLevel::from_rows(
            state.rows.values().filter(|row| row.part_id() == part_id),
        ))
    }

    async fn part_ids_with_stock(&self) -> StoreResult<Vec<PartId>> {
        let state = self.lock()?;
        let mut ids: Vec<PartId> = state.rows.keys().map(|(part_id, _)| *part_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn apply_adjustment(&self, op: &StockAdjustment) -> StoreResult<StockRow> {
        op.validate()?;

        let mut state = self.lock()?;
        let mut row = row_or_open(&state, op.part_id, op.location_id, op.occurred_at);

        match op.kind {
            AdjustmentKind::Receive => row.receive(op.quantity, op.occurred_at)?,
            AdjustmentKind::Issue => row.issue(op.quantity, op.occurred_at)?,
            AdjustmentKind::Adjust => row.adjust(op.quantity, op.occurred_at)?,
        }

        let entry = TransactionEntry::movement(
            op.part_id,
            op.location_id,
            op.kind.transaction_kind(),
            op.signed_delta(),
            op.unit_cost,
            op.reference,
            op.note.clone(),
            op.actor,
            op.occurred_at,
        );

        state.rows.insert((op.part_id, op.location_id), row.clone());
        state.log.push(entry);
        Ok(row)
    }

    async fn apply_transfer(&self, op: &StockTransfer) -> StoreResult<TransferOutcome> {
        op.validate()?;

        let mut state = self.lock()?;
        let mut from_row = row_or_open(&state, op.part_id, op.from_location_id, op.occurred_at);
        let mut to_row = row_or_open(&state, op.part_id, op.to_location_id, op.occurred_at);

        from_row.transfer_out(op.quantity, op.occurred_at)?;
        to_row.transfer_in(op.quantity, op.occurred_at)?;

        let entry = TransactionEntry::transfer(
            op.part_id,
            op.from_location_id,
            op.to_location_id,
            op.quantity,
            op.note.clone(),
            op.actor,
            op.occurred_at,
        );

        state
            .rows
            .insert((op.part_id, op.from_location_id), from_row.clone());
        state
            .rows
            .insert((op.part_id, op.to_location_id), to_row.clone());
        state.log.push(entry);

        Ok(TransferOutcome { from_row, to_row })
    }

    async fn apply_reserve(&self, op: &StockReservation) -> StoreResult<StockRow> {
        op.validate()?;

        let mut state = self.lock()?;
        let mut row = row_or_open(&state, op.part_id, op.location_id, op.occurred_at);
        row.reserve(op.quantity, op.occurred_at)?;

        let entry = TransactionEntry::movement(
            op.part_id,
            op.location_id,
            TransactionKind::Reserve,
            op.quantity,
            None,
            op.reference,
            op.note.clone(),
            op.actor,
            op.occurred_at,
        );

        state.rows.insert((op.part_id, op.location_id), row.clone());
        state.log.push(entry);
        Ok(row)
    }

    async fn apply_unreserve(&self, op: &StockReservation) -> StoreResult<StockRow> {
        op.validate()?;

        let mut state = self.lock()?;
        let mut row = row_or_open(&state, op.part_id, op.location_id, op.occurred_at);
        row.unreserve(op.quantity, op.occurred_at)?;

        let entry = TransactionEntry::movement(
            op.part_id,
            op.location_id,
            TransactionKind::Unreserve,
            -op.quantity,
            None,
            op.reference,
            op.note.clone(),
            op.actor,
            op.occurred_at,
        );

        state.rows.insert((op.part_id, op.location_id), row.clone());
        state.log.push(entry);
        Ok(row)
    }

    async fn record_consumption(
        &self,
        op: &AssetConsumption,
        unit_cost: Money,
    ) -> StoreResult<AssetConsumptionRecord> {
        op.validate()?;

        let mut state = self.lock()?;
        let mut row = row_or_open(&state, op.part_id, op.location_id, op.occurred_at);
        row.issue(op.quantity, op.occurred_at)?;

        let entry = TransactionEntry::movement(
            op.part_id,
            op.location_id,
            TransactionKind::Issue,
            -op.quantity,
            Some(unit_cost),
            Some(Reference {
                kind: ReferenceKind::AssetConsumption,
                id: *op.asset_id.as_uuid(),
            }),
            op.note.clone(),
            op.actor,
            op.occurred_at,
        );

        let record = AssetConsumptionRecord::new(
            op.asset_id,
            op.part_id,
            op.location_id,
            op.work_order_id,
            op.quantity,
            unit_cost,
            op.note.clone(),
            op.actor,
            op.occurred_at,
        );

        state.rows.insert((op.part_id, op.location_id), row);
        state.log.push(entry);
        state.consumptions.push(record.clone());
        Ok(record)
    }

    async fn deactivate_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
        now: DateTime<Utc>,
    ) -> StoreResult<StockRow> {
        let mut state = self.lock()?;
        let mut row = state
            .rows
            .get(&(part_id, location_id))
            .cloned()
            .ok_or(DomainError::NotFound("stock row"))?;

        row.deactivate(now)?;
        state.rows.insert((part_id, location_id), row.clone());
        Ok(row)
    }

    async fn query_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> StoreResult<TransactionPage> {
        let state = self.lock()?;

        let mut matched: Vec<TransactionEntry> = state
            .log
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();

        // Newest first; entry ids are time-ordered so they break timestamp ties.
        matched.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then(b.entry_id.cmp(&a.entry_id))
        });

        let total = matched.len() as u64;
        let entries: Vec<TransactionEntry> = matched
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        let has_more = total > (pagination.offset + pagination.limit) as u64;

        Ok(TransactionPage {
            entries,
            total,
            pagination,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upkeep_core::UserId;

    fn receive(part_id: PartId, location_id: LocationId, quantity: i64) -> StockAdjustment {
        StockAdjustment {
            part_id,
            location_id,
            kind: AdjustmentKind::Receive,
            quantity,
            unit_cost: None,
            reference: None,
            note: None,
            actor: UserId::new(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn rows_are_created_lazily_on_first_receipt() {
        let store = InMemoryStockStore::new();
        let part_id = PartId::new();
        let location_id = LocationId::new();

        assert!(store.get_row(part_id, location_id).await.unwrap().is_none());

        store
            .apply_adjustment(&receive(part_id, location_id, 10))
            .await
            .unwrap();

        let row = store.get_row(part_id, location_id).await.unwrap().unwrap();
        assert_eq!(row.on_hand(), 10);
    }

    #[tokio::test]
    async fn failed_issue_leaves_no_row_and_no_log_entry() {
        let store = InMemoryStockStore::new();
        let part_id = PartId::new();
        let location_id = LocationId::new();

        let mut issue = receive(part_id, location_id, 5);
        issue.kind = AdjustmentKind::Issue;

        let err = store.apply_adjustment(&issue).await.unwrap_err();
        assert!(matches!(
            err,
            StockStoreError::Domain(DomainError::InsufficientStock { .. })
        ));

        assert!(store.get_row(part_id, location_id).await.unwrap().is_none());
        let page = store
            .query_transactions(TransactionFilter::for_part(part_id), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn every_mutation_appends_exactly_one_entry() {
        let store = InMemoryStockStore::new();
        let part_id = PartId::new();
        let location_id = LocationId::new();

        store
            .apply_adjustment(&receive(part_id, location_id, 100))
            .await
            .unwrap();
        store
            .apply_reserve(&StockReservation {
                part_id,
                location_id,
                quantity: 30,
                reference: None,
                note: None,
                actor: UserId::new(),
                occurred_at: Utc::now(),
            })
            .await
            .unwrap();

        let page = store
            .query_transactions(TransactionFilter::for_part(part_id), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let deltas: Vec<i64> = page.entries.iter().map(|e| e.quantity).collect();
        assert!(deltas.contains(&100));
        assert!(deltas.contains(&30));
    }
}
