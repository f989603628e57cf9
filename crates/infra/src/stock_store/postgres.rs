//! Postgres-backed stock store implementation.
//!
//! This module persists the stock ledger in PostgreSQL. Atomicity and
//! concurrency correctness come entirely from database transaction semantics:
//! every mutating operation runs inside one transaction, re-reads the row(s)
//! it will modify with `SELECT ... FOR UPDATE`, validates the quantity guards
//! against that freshly read state, and commits the row update together with
//! its transaction-log append — or rolls back with no partial effect.
//!
//! ## Locking
//!
//! Pessimistic row locks are used rather than optimistic version tokens, so
//! two operations targeting the same `(part, location)` serialize on the row
//! and lost updates cannot occur. A transfer locks both of its rows in
//! ascending `location_id` order; two concurrent transfers touching the same
//! pair in opposite directions therefore acquire locks in the same order and
//! cannot deadlock. Rows are materialized (`INSERT ... ON CONFLICT DO
//! NOTHING`) before locking so the lock always has a target; the insert is
//! rolled back with the transaction when a guard fails, which preserves lazy
//! row creation.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL code | Mapped to | Scenario |
//! |------------|-----------------|-----------|----------|
//! | Database (unique violation) | `23505` | `Domain(Conflict)` | Concurrent insert raced the lock (should not occur with row materialization) |
//! | Database (check violation) | `23514` | `Storage` | Schema-level quantity constraint tripped (guards run first; indicates external mutation) |
//! | Database (other) | any | `Storage` | Other database errors |
//! | PoolClosed / network | N/A | `Storage` | Transient connectivity failure |
//!
//! ## Thread Safety
//!
//! `PostgresStockStore` is `Send + Sync` and can be shared across threads.
//! All operations use the SQLx connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use upkeep_core::{DomainError, LocationId, Money, PartId, UserId};
use upkeep_ledger::{
    AdjustmentKind, AssetConsumption, AssetConsumptionRecord, Reference, ReferenceKind,
    StockAdjustment, StockLevel, StockReservation, StockRow, StockTransfer, TransactionEntry,
    TransactionKind,
};

use super::query::{Pagination, TransactionFilter, TransactionPage};
use super::r#trait::{StockStore, StockStoreError, StoreResult, TransferOutcome};

/// Postgres-backed atomic stock store.
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: Arc<PgPool>,
}

impl PostgresStockStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

/// Roll back and surface a domain failure with no partial effect.
async fn rollback_with<T>(
    tx: Transaction<'_, Postgres>,
    err: DomainError,
) -> StoreResult<T> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))?;
    Err(StockStoreError::Domain(err))
}

/// Materialize the row so `FOR UPDATE` always has a lock target.
///
/// The empty row only becomes durable if the surrounding transaction commits,
/// so a failed guard still leaves the `(part, location)` pair without a row.
async fn ensure_row(
    tx: &mut Transaction<'_, Postgres>,
    part_id: PartId,
    location_id: LocationId,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_rows (
            part_id,
            location_id,
            quantity_on_hand,
            quantity_reserved,
            is_active,
            updated_at
        )
        VALUES ($1, $2, 0, 0, TRUE, $3)
        ON CONFLICT (part_id, location_id) DO NOTHING
        "#,
    )
    .bind(part_id.as_uuid())
    .bind(location_id.as_uuid())
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("ensure_row", e))?;

    Ok(())
}

/// Read one row under a pessimistic lock, held until commit/rollback.
async fn lock_row(
    tx: &mut Transaction<'_, Postgres>,
    part_id: PartId,
    location_id: LocationId,
) -> StoreResult<StockRow> {
    let row = sqlx::query(
        r#"
        SELECT
            part_id,
            location_id,
            quantity_on_hand,
            quantity_reserved,
            is_active,
            updated_at
        FROM stock_rows
        WHERE part_id = $1 AND location_id = $2
        FOR UPDATE
        "#,
    )
    .bind(part_id.as_uuid())
    .bind(location_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_row", e))?;

    let record = StockRowRecord::from_row(&row)
        .map_err(|e| StockStoreError::storage("lock_row", e.to_string()))?;
    record.try_into().map_err(StockStoreError::Domain)
}

async fn update_row(
    tx: &mut Transaction<'_, Postgres>,
    row: &StockRow,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        UPDATE stock_rows
        SET quantity_on_hand = $3,
            quantity_reserved = $4,
            is_active = $5,
            updated_at = $6
        WHERE part_id = $1 AND location_id = $2
        "#,
    )
    .bind(row.part_id().as_uuid())
    .bind(row.location_id().as_uuid())
    .bind(row.on_hand())
    .bind(row.reserved())
    .bind(row.is_active())
    .bind(row.updated_at())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("update_row", e))?;

    Ok(())
}

async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    entry: &TransactionEntry,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_transactions (
            entry_id,
            part_id,
            source_location_id,
            destination_location_id,
            kind,
            quantity,
            unit_cost,
            reference_kind,
            reference_id,
            note,
            actor,
            occurred_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(entry.entry_id)
    .bind(entry.part_id.as_uuid())
    .bind(entry.source_location_id.map(|id| *id.as_uuid()))
    .bind(entry.destination_location_id.map(|id| *id.as_uuid()))
    .bind(entry.kind.code())
    .bind(entry.quantity)
    .bind(entry.unit_cost.map(|cost| cost.minor_units()))
    .bind(entry.reference.map(|r| r.kind.code()))
    .bind(entry.reference.map(|r| r.id))
    .bind(entry.note.as_deref())
    .bind(entry.actor.as_uuid())
    .bind(entry.occurred_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_entry", e))?;

    Ok(())
}

async fn insert_consumption(
    tx: &mut Transaction<'_, Postgres>,
    record: &AssetConsumptionRecord,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO asset_consumptions (
            record_id,
            asset_id,
            part_id,
            location_id,
            work_order_id,
            quantity,
            unit_cost_at_use,
            note,
            actor,
            occurred_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(record.record_id)
    .bind(record.asset_id.as_uuid())
    .bind(record.part_id.as_uuid())
    .bind(record.location_id.as_uuid())
    .bind(record.work_order_id.map(|id| *id.as_uuid()))
    .bind(record.quantity)
    .bind(record.unit_cost_at_use.minor_units())
    .bind(record.note.as_deref())
    .bind(record.actor.as_uuid())
    .bind(record.occurred_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_consumption", e))?;

    Ok(())
}

async fn commit(tx: Transaction<'_, Postgres>) -> StoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

#[async_trait]
impl StockStore for PostgresStockStore {
    #[instrument(
        skip(self),
        fields(part_id = %part_id, location_id = %location_id),
        err
    )]
    async fn get_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
    ) -> StoreResult<Option<StockRow>> {
        let row = sqlx::query(
            r#"
            SELECT
                part_id,
                location_id,
                quantity_on_hand,
                quantity_reserved,
                is_active,
                updated_at
            FROM stock_rows
            WHERE part_id = $1 AND location_id = $2
            "#,
        )
        .bind(part_id.as_uuid())
        .bind(location_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_row", e))?;

        match row {
            Some(row) => {
                let record = StockRowRecord::from_row(&row)
                    .map_err(|e| StockStoreError::storage("get_row", e.to_string()))?;
                Ok(Some(record.try_into().map_err(StockStoreError::Domain)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(part_id = %part_id), err)]
    async fn list_rows_for_part(&self, part_id: PartId) -> StoreResult<Vec<StockRow>> {
        let rows = sqlx::query(
            r#"
            SELECT
                part_id,
                location_id,
                quantity_on_hand,
                quantity_reserved,
                is_active,
                updated_at
            FROM stock_rows
            WHERE part_id = $1
            ORDER BY location_id ASC
            "#,
        )
        .bind(part_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_rows_for_part", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let record = StockRowRecord::from_row(&row)
                .map_err(|e| StockStoreError::storage("list_rows_for_part", e.to_string()))?;
            out.push(record.try_into().map_err(StockStoreError::Domain)?);
        }
        Ok(out)
    }

    #[instrument(skip(self), fields(part_id = %part_id), err)]
    async fn aggregate(&self, part_id: PartId) -> StoreResult<StockLevel> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(quantity_on_hand), 0)::BIGINT AS on_hand,
                COALESCE(SUM(quantity_reserved), 0)::BIGINT AS reserved
            FROM stock_rows
            WHERE part_id = $1
            "#,
        )
        .bind(part_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("aggregate", e))?;

        let on_hand: i64 = row
            .try_get("on_hand")
            .map_err(|e| StockStoreError::storage("aggregate", e.to_string()))?;
        let reserved: i64 = row
            .try_get("reserved")
            .map_err(|e| StockStoreError::storage("aggregate", e.to_string()))?;

        Ok(StockLevel {
            on_hand,
            reserved,
            available: on_hand - reserved,
        })
    }

    #[instrument(skip(self), err)]
    async fn part_ids_with_stock(&self) -> StoreResult<Vec<PartId>> {
        let rows = sqlx::query("SELECT DISTINCT part_id FROM stock_rows ORDER BY part_id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("part_ids_with_stock", e))?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row
                .try_get("part_id")
                .map_err(|e| StockStoreError::storage("part_ids_with_stock", e.to_string()))?;
            ids.push(PartId::from_uuid(id));
        }
        Ok(ids)
    }

    #[instrument(
        skip(self, op),
        fields(part_id = %op.part_id, location_id = %op.location_id, kind = ?op.kind, quantity = op.quantity),
        err
    )]
    async fn apply_adjustment(&self, op: &StockAdjustment) -> StoreResult<StockRow> {
        op.validate()?;

        let mut tx = self.begin().await?;
        ensure_row(&mut tx, op.part_id, op.location_id, op.occurred_at).await?;
        let mut row = lock_row(&mut tx, op.part_id, op.location_id).await?;

        let applied = match op.kind {
            AdjustmentKind::Receive => row.receive(op.quantity, op.occurred_at),
            AdjustmentKind::Issue => row.issue(op.quantity, op.occurred_at),
            AdjustmentKind::Adjust => row.adjust(op.quantity, op.occurred_at),
        };
        if let Err(err) = applied {
            return rollback_with(tx, err).await;
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

        update_row(&mut tx, &row).await?;
        insert_entry(&mut tx, &entry).await?;
        commit(tx).await?;

        Ok(row)
    }

    #[instrument(
        skip(self, op),
        fields(
            part_id = %op.part_id,
            from = %op.from_location_id,
            to = %op.to_location_id,
            quantity = op.quantity
        ),
        err
    )]
    async fn apply_transfer(&self, op: &StockTransfer) -> StoreResult<TransferOutcome> {
        op.validate()?;

        let mut tx = self.begin().await?;

        // Fixed lock order: ascending location id, so two opposite-direction
        // transfers over the same pair cannot deadlock.
        let (first, second) = if op.from_location_id <= op.to_location_id {
            (op.from_location_id, op.to_location_id)
        } else {
            (op.to_location_id, op.from_location_id)
        };

        ensure_row(&mut tx, op.part_id, first, op.occurred_at).await?;
        ensure_row(&mut tx, op.part_id, second, op.occurred_at).await?;
        let first_row = lock_row(&mut tx, op.part_id, first).await?;
        let second_row = lock_row(&mut tx, op.part_id, second).await?;

        let (mut from_row, mut to_row) = if first == op.from_location_id {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };

        if let Err(err) = from_row.transfer_out(op.quantity, op.occurred_at) {
            return rollback_with(tx, err).await;
        }
        if let Err(err) = to_row.transfer_in(op.quantity, op.occurred_at) {
            return rollback_with(tx, err).await;
        }

        let entry = TransactionEntry::transfer(
            op.part_id,
            op.from_location_id,
            op.to_location_id,
            op.quantity,
            op.note.clone(),
            op.actor,
            op.occurred_at,
        );

        update_row(&mut tx, &from_row).await?;
        update_row(&mut tx, &to_row).await?;
        insert_entry(&mut tx, &entry).await?;
        commit(tx).await?;

        Ok(TransferOutcome { from_row, to_row })
    }

    #[instrument(
        skip(self, op),
        fields(part_id = %op.part_id, location_id = %op.location_id, quantity = op.quantity),
        err
    )]
    async fn apply_reserve(&self, op: &StockReservation) -> StoreResult<StockRow> {
        op.validate()?;

        let mut tx = self.begin().await?;
        ensure_row(&mut tx, op.part_id, op.location_id, op.occurred_at).await?;
        let mut row = lock_row(&mut tx, op.part_id, op.location_id).await?;

        if let Err(err) = row.reserve(op.quantity, op.occurred_at) {
            return rollback_with(tx, err).await;
        }

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

        update_row(&mut tx, &row).await?;
        insert_entry(&mut tx, &entry).await?;
        commit(tx).await?;

        Ok(row)
    }

    #[instrument(
        skip(self, op),
        fields(part_id = %op.part_id, location_id = %op.location_id, quantity = op.quantity),
        err
    )]
    async fn apply_unreserve(&self, op: &StockReservation) -> StoreResult<StockRow> {
        op.validate()?;

        let mut tx = self.begin().await?;
        ensure_row(&mut tx, op.part_id, op.location_id, op.occurred_at).await?;
        let mut row = lock_row(&mut tx, op.part_id, op.location_id).await?;

        if let Err(err) = row.unreserve(op.quantity, op.occurred_at) {
            return rollback_with(tx, err).await;
        }

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

        update_row(&mut tx, &row).await?;
        insert_entry(&mut tx, &entry).await?;
        commit(tx).await?;

        Ok(row)
    }

    #[instrument(
        skip(self, op),
        fields(
            asset_id = %op.asset_id,
            part_id = %op.part_id,
            location_id = %op.location_id,
            quantity = op.quantity
        ),
        err
    )]
    async fn record_consumption(
        &self,
        op: &AssetConsumption,
        unit_cost: Money,
    ) -> StoreResult<AssetConsumptionRecord> {
        op.validate()?;

        let mut tx = self.begin().await?;
        ensure_row(&mut tx, op.part_id, op.location_id, op.occurred_at).await?;
        let mut row = lock_row(&mut tx, op.part_id, op.location_id).await?;

        if let Err(err) = row.issue(op.quantity, op.occurred_at) {
            return rollback_with(tx, err).await;
        }

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

        update_row(&mut tx, &row).await?;
        insert_entry(&mut tx, &entry).await?;
        insert_consumption(&mut tx, &record).await?;
        commit(tx).await?;

        Ok(record)
    }

    #[instrument(
        skip(self),
        fields(part_id = %part_id, location_id = %location_id),
        err
    )]
    async fn deactivate_row(
        &self,
        part_id: PartId,
        location_id: LocationId,
        now: DateTime<Utc>,
    ) -> StoreResult<StockRow> {
        let mut tx = self.begin().await?;

        let exists = sqlx::query(
            "SELECT 1 AS present FROM stock_rows WHERE part_id = $1 AND location_id = $2",
        )
        .bind(part_id.as_uuid())
        .bind(location_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("deactivate_row", e))?;

        if exists.is_none() {
            return rollback_with(tx, DomainError::NotFound("stock row")).await;
        }

        let mut row = lock_row(&mut tx, part_id, location_id).await?;
        if let Err(err) = row.deactivate(now) {
            return rollback_with(tx, err).await;
        }

        update_row(&mut tx, &row).await?;
        commit(tx).await?;

        Ok(row)
    }

    #[instrument(skip(self, filter, pagination), err)]
    async fn query_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> StoreResult<TransactionPage> {
        let part_param: Option<Uuid> = filter.part_id.map(|id| *id.as_uuid());
        let kind_param: Option<&str> = filter.kind.map(|k| k.code());
        let location_param: Option<Uuid> = filter.location_id.map(|id| *id.as_uuid());

        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM stock_transactions
            WHERE ($1::uuid IS NULL OR part_id = $1)
                AND ($2::text IS NULL OR kind = $2)
                AND ($3::uuid IS NULL OR source_location_id = $3 OR destination_location_id = $3)
                AND ($4::timestamptz IS NULL OR occurred_at >= $4)
                AND ($5::timestamptz IS NULL OR occurred_at <= $5)
            "#,
        )
        .bind(part_param)
        .bind(kind_param)
        .bind(location_param)
        .bind(filter.occurred_after)
        .bind(filter.occurred_before)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_transactions", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| StockStoreError::storage("count_transactions", e.to_string()))?;

        let rows = sqlx::query(
            r#"
            SELECT
                entry_id,
                part_id,
                source_location_id,
                destination_location_id,
                kind,
                quantity,
                unit_cost,
                reference_kind,
                reference_id,
                note,
                actor,
                occurred_at
            FROM stock_transactions
            WHERE ($1::uuid IS NULL OR part_id = $1)
                AND ($2::text IS NULL OR kind = $2)
                AND ($3::uuid IS NULL OR source_location_id = $3 OR destination_location_id = $3)
                AND ($4::timestamptz IS NULL OR occurred_at >= $4)
                AND ($5::timestamptz IS NULL OR occurred_at <= $5)
            ORDER BY occurred_at DESC, entry_id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(part_param)
        .bind(kind_param)
        .bind(location_param)
        .bind(filter.occurred_after)
        .bind(filter.occurred_before)
        .bind(pagination.limit as i64)
        .bind(pagination.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_transactions", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let record = TransactionRow::from_row(&row)
                .map_err(|e| StockStoreError::storage("query_transactions", e.to_string()))?;
            entries.push(record.try_into().map_err(StockStoreError::Domain)?);
        }

        let has_more = total > (pagination.offset + pagination.limit) as i64;

        Ok(TransactionPage {
            entries,
            total: total as u64,
            pagination,
            has_more,
        })
    }
}

/// Map SQLx errors to StockStoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StockStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                if code.as_ref() == "23505" {
                    return StockStoreError::Domain(DomainError::conflict(format!(
                        "concurrent write detected in {operation}: {}",
                        db_err.message()
                    )));
                }
            }
            StockStoreError::storage(operation, db_err.message().to_string())
        }
        sqlx::Error::PoolClosed => StockStoreError::storage(operation, "connection pool closed"),
        other => StockStoreError::storage(operation, other.to_string()),
    }
}

// SQLx row types

#[derive(Debug)]
struct StockRowRecord {
    part_id: Uuid,
    location_id: Uuid,
    quantity_on_hand: i64,
    quantity_reserved: i64,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StockRowRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StockRowRecord {
            part_id: row.try_get("part_id")?,
            location_id: row.try_get("location_id")?,
            quantity_on_hand: row.try_get("quantity_on_hand")?,
            quantity_reserved: row.try_get("quantity_reserved")?,
            is_active: row.try_get("is_active")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<StockRowRecord> for StockRow {
    type Error = DomainError;

    fn try_from(record: StockRowRecord) -> Result<Self, Self::Error> {
        StockRow::restore(
            PartId::from_uuid(record.part_id),
            LocationId::from_uuid(record.location_id),
            record.quantity_on_hand,
            record.quantity_reserved,
            record.is_active,
            record.updated_at,
        )
    }
}

#[derive(Debug)]
struct TransactionRow {
    entry_id: Uuid,
    part_id: Uuid,
    source_location_id: Option<Uuid>,
    destination_location_id: Option<Uuid>,
    kind: String,
    quantity: i64,
    unit_cost: Option<i64>,
    reference_kind: Option<String>,
    reference_id: Option<Uuid>,
    note: Option<String>,
    actor: Uuid,
    occurred_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TransactionRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TransactionRow {
            entry_id: row.try_get("entry_id")?,
            part_id: row.try_get("part_id")?,
            source_location_id: row.try_get("source_location_id")?,
            destination_location_id: row.try_get("destination_location_id")?,
            kind: row.try_get("kind")?,
            quantity: row.try_get("quantity")?,
            unit_cost: row.try_get("unit_cost")?,
            reference_kind: row.try_get("reference_kind")?,
            reference_id: row.try_get("reference_id")?,
            note: row.try_get("note")?,
            actor: row.try_get("actor")?,
            occurred_at: row.try_get("occurred_at")?,
        })
    }
}

impl TryFrom<TransactionRow> for TransactionEntry {
    type Error = DomainError;

    fn try_from(record: TransactionRow) -> Result<Self, Self::Error> {
        let reference = match (record.reference_kind, record.reference_id) {
            (Some(kind), Some(id)) => Some(Reference {
                kind: ReferenceKind::from_code(&kind)?,
                id,
            }),
            _ => None,
        };

        Ok(TransactionEntry {
            entry_id: record.entry_id,
            part_id: PartId::from_uuid(record.part_id),
            source_location_id: record.source_location_id.map(LocationId::from_uuid),
            destination_location_id: record.destination_location_id.map(LocationId::from_uuid),
            kind: TransactionKind::from_code(&record.kind)?,
            quantity: record.quantity,
            unit_cost: record.unit_cost.map(Money::from_minor_units),
            reference,
            note: record.note,
            actor: UserId::from_uuid(record.actor),
            occurred_at: record.occurred_at,
        })
    }
}
