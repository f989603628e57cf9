//! Lookup collaborator implementations.
//!
//! The ledger resolves part/location/asset identifiers through the traits in
//! `upkeep-catalog`. In-memory implementations back tests and dev; the
//! Postgres implementations read the catalog reference tables.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use upkeep_catalog::{AssetRegistry, LocationDirectory, Part, PartCatalog, PartStatus};
use upkeep_core::{AssetId, DomainError, DomainResult, LocationId, Money, PartId};

fn lock_failed() -> DomainError {
    DomainError::conflict("lookup lock poisoned")
}

/// In-memory part catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPartCatalog {
    parts: RwLock<HashMap<PartId, Part>>,
}

impl InMemoryPartCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, part: Part) -> DomainResult<()> {
        let mut parts = self.parts.write().map_err(|_| lock_failed())?;
        parts.insert(part.id, part);
        Ok(())
    }
}

#[async_trait]
impl PartCatalog for InMemoryPartCatalog {
    async fn part(&self, part_id: PartId) -> DomainResult<Part> {
        let parts = self.parts.read().map_err(|_| lock_failed())?;
        parts
            .get(&part_id)
            .cloned()
            .ok_or(DomainError::NotFound("part"))
    }

    async fn list_parts(&self) -> DomainResult<Vec<Part>> {
        let parts = self.parts.read().map_err(|_| lock_failed())?;
        let mut out: Vec<Part> = parts.values().cloned().collect();
        out.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(out)
    }
}

/// In-memory location directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLocationDirectory {
    locations: RwLock<HashMap<LocationId, bool>>,
}

impl InMemoryLocationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, location_id: LocationId) -> DomainResult<()> {
        let mut locations = self.locations.write().map_err(|_| lock_failed())?;
        locations.insert(location_id, true);
        Ok(())
    }

    pub fn deactivate(&self, location_id: LocationId) -> DomainResult<()> {
        let mut locations = self.locations.write().map_err(|_| lock_failed())?;
        locations.insert(location_id, false);
        Ok(())
    }
}

#[async_trait]
impl LocationDirectory for InMemoryLocationDirectory {
    async fn ensure_location(&self, location_id: LocationId) -> DomainResult<()> {
        let locations = self.locations.read().map_err(|_| lock_failed())?;
        match locations.get(&location_id) {
            Some(true) => Ok(()),
            Some(false) => Err(DomainError::invalid_operation("location is inactive")),
            None => Err(DomainError::NotFound("location")),
        }
    }
}

/// In-memory asset registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAssetRegistry {
    assets: RwLock<HashMap<AssetId, bool>>,
}

impl InMemoryAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, asset_id: AssetId) -> DomainResult<()> {
        let mut assets = self.assets.write().map_err(|_| lock_failed())?;
        assets.insert(asset_id, true);
        Ok(())
    }

    pub fn deactivate(&self, asset_id: AssetId) -> DomainResult<()> {
        let mut assets = self.assets.write().map_err(|_| lock_failed())?;
        assets.insert(asset_id, false);
        Ok(())
    }
}

#[async_trait]
impl AssetRegistry for InMemoryAssetRegistry {
    async fn ensure_asset(&self, asset_id: AssetId) -> DomainResult<()> {
        let assets = self.assets.read().map_err(|_| lock_failed())?;
        match assets.get(&asset_id) {
            Some(true) => Ok(()),
            Some(false) => Err(DomainError::invalid_operation("asset is inactive")),
            None => Err(DomainError::NotFound("asset")),
        }
    }
}

fn lookup_failed(operation: &str, err: sqlx::Error) -> DomainError {
    // Lookup traits surface domain errors only; transient storage failures
    // land in Conflict so callers treat them as retryable.
    DomainError::conflict(format!("lookup failure in {operation}: {err}"))
}

/// Postgres-backed part catalog over the `parts` reference table.
#[derive(Debug, Clone)]
pub struct PostgresPartCatalog {
    pool: Arc<PgPool>,
}

impl PostgresPartCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Register or update a catalog entry.
    pub async fn upsert(&self, part: &Part) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO parts (
                part_id,
                sku,
                name,
                unit_cost,
                reorder_point,
                reorder_quantity,
                min_stock_level,
                max_stock_level,
                unit_of_measure,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (part_id)
            DO UPDATE SET
                sku = EXCLUDED.sku,
                name = EXCLUDED.name,
                unit_cost = EXCLUDED.unit_cost,
                reorder_point = EXCLUDED.reorder_point,
                reorder_quantity = EXCLUDED.reorder_quantity,
                min_stock_level = EXCLUDED.min_stock_level,
                max_stock_level = EXCLUDED.max_stock_level,
                unit_of_measure = EXCLUDED.unit_of_measure,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(part.id.as_uuid())
        .bind(&part.sku)
        .bind(&part.name)
        .bind(part.unit_cost.minor_units())
        .bind(part.reorder_point)
        .bind(part.reorder_quantity)
        .bind(part.min_stock_level)
        .bind(part.max_stock_level)
        .bind(&part.unit_of_measure)
        .bind(part.status.code())
        .bind(part.created_at)
        .bind(part.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| lookup_failed("upsert_part", e))?;

        Ok(())
    }
}

fn part_from_pg_row(row: &sqlx::postgres::PgRow) -> DomainResult<Part> {
    let read = |e: sqlx::Error| DomainError::conflict(format!("malformed part row: {e}"));
    let status: String = row.try_get("status").map_err(read)?;

    Ok(Part {
        id: PartId::from_uuid(row.try_get::<Uuid, _>("part_id").map_err(read)?),
        sku: row.try_get("sku").map_err(read)?,
        name: row.try_get("name").map_err(read)?,
        unit_cost: Money::from_minor_units(row.try_get("unit_cost").map_err(read)?),
        reorder_point: row.try_get("reorder_point").map_err(read)?,
        reorder_quantity: row.try_get("reorder_quantity").map_err(read)?,
        min_stock_level: row.try_get("min_stock_level").map_err(read)?,
        max_stock_level: row.try_get("max_stock_level").map_err(read)?,
        unit_of_measure: row.try_get("unit_of_measure").map_err(read)?,
        status: PartStatus::from_code(&status)?,
        created_at: row.try_get("created_at").map_err(read)?,
        updated_at: row.try_get("updated_at").map_err(read)?,
    })
}

#[async_trait]
impl PartCatalog for PostgresPartCatalog {
    async fn part(&self, part_id: PartId) -> DomainResult<Part> {
        let row = sqlx::query(
            r#"
            SELECT
                part_id,
                sku,
                name,
                unit_cost,
                reorder_point,
                reorder_quantity,
                min_stock_level,
                max_stock_level,
                unit_of_measure,
                status,
                created_at,
                updated_at
            FROM parts
            WHERE part_id = $1
            "#,
        )
        .bind(part_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| lookup_failed("get_part", e))?;

        match row {
            Some(row) => part_from_pg_row(&row),
            None => Err(DomainError::NotFound("part")),
        }
    }

    async fn list_parts(&self) -> DomainResult<Vec<Part>> {
        let rows = sqlx::query(
            r#"
            SELECT
                part_id,
                sku,
                name,
                unit_cost,
                reorder_point,
                reorder_quantity,
                min_stock_level,
                max_stock_level,
                unit_of_measure,
                status,
                created_at,
                updated_at
            FROM parts
            ORDER BY sku ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| lookup_failed("list_parts", e))?;

        rows.iter().map(part_from_pg_row).collect()
    }
}

/// Postgres-backed location directory over the `locations` reference table.
#[derive(Debug, Clone)]
pub struct PostgresLocationDirectory {
    pool: Arc<PgPool>,
}

impl PostgresLocationDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn register(&self, location_id: LocationId, name: &str) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (location_id, name, is_active)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (location_id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(location_id.as_uuid())
        .bind(name)
        .execute(&*self.pool)
        .await
        .map_err(|e| lookup_failed("register_location", e))?;

        Ok(())
    }
}

#[async_trait]
impl LocationDirectory for PostgresLocationDirectory {
    async fn ensure_location(&self, location_id: LocationId) -> DomainResult<()> {
        let row = sqlx::query("SELECT is_active FROM locations WHERE location_id = $1")
            .bind(location_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| lookup_failed("ensure_location", e))?;

        match row {
            None => Err(DomainError::NotFound("location")),
            Some(row) => {
                let is_active: bool = row
                    .try_get("is_active")
                    .map_err(|e| DomainError::conflict(format!("malformed location row: {e}")))?;
                if is_active {
                    Ok(())
                } else {
                    Err(DomainError::invalid_operation("location is inactive"))
                }
            }
        }
    }
}

/// Postgres-backed asset registry over the `assets` reference table.
#[derive(Debug, Clone)]
pub struct PostgresAssetRegistry {
    pool: Arc<PgPool>,
}

impl PostgresAssetRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn register(&self, asset_id: AssetId, name: &str) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assets (asset_id, name, is_active)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (asset_id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(asset_id.as_uuid())
        .bind(name)
        .execute(&*self.pool)
        .await
        .map_err(|e| lookup_failed("register_asset", e))?;

        Ok(())
    }
}

#[async_trait]
impl AssetRegistry for PostgresAssetRegistry {
    async fn ensure_asset(&self, asset_id: AssetId) -> DomainResult<()> {
        let row = sqlx::query("SELECT is_active FROM assets WHERE asset_id = $1")
            .bind(asset_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| lookup_failed("ensure_asset", e))?;

        match row {
            None => Err(DomainError::NotFound("asset")),
            Some(row) => {
                let is_active: bool = row
                    .try_get("is_active")
                    .map_err(|e| DomainError::conflict(format!("malformed asset row: {e}")))?;
                if is_active {
                    Ok(())
                } else {
                    Err(DomainError::invalid_operation("asset is inactive"))
                }
            }
        }
    }
}
