//! Lookup collaborators consumed by the stock ledger.
//!
//! Category/location/asset hierarchies are owned elsewhere; the ledger only
//! needs opaque identifiers resolved through these traits before accepting an
//! operation. Implementations live in the infrastructure layer.

use async_trait::async_trait;

use upkeep_core::{AssetId, DomainError, DomainResult, LocationId, PartId};

use crate::part::{Part, PartStatus};

/// Read-only part catalog lookup.
#[async_trait]
pub trait PartCatalog: Send + Sync {
    /// Fetch a part by id. `NotFound` if the id is unknown.
    async fn part(&self, part_id: PartId) -> DomainResult<Part>;

    /// List the full catalog (reporting support).
    async fn list_parts(&self) -> DomainResult<Vec<Part>>;

    /// Fetch a part and require it to accept stock mutations.
    async fn active_part(&self, part_id: PartId) -> DomainResult<Part> {
        let part = self.part(part_id).await?;
        if part.status != PartStatus::Active {
            return Err(DomainError::invalid_operation(format!(
                "part {} is {}",
                part.sku,
                part.status.code()
            )));
        }
        Ok(part)
    }
}

/// Referential validity check for storage locations.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// `NotFound` if the location is unknown, `InvalidOperation` if it is
    /// soft-deleted/inactive.
    async fn ensure_location(&self, location_id: LocationId) -> DomainResult<()>;
}

/// Referential validity check for maintainable assets.
#[async_trait]
pub trait AssetRegistry: Send + Sync {
    /// `NotFound` if the asset is unknown, `InvalidOperation` if it is
    /// soft-deleted/inactive.
    async fn ensure_asset(&self, asset_id: AssetId) -> DomainResult<()>;
}
