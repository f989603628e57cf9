use std::sync::Arc;

use sqlx::PgPool;

use upkeep_catalog::{AssetRegistry, LocationDirectory, Part, PartCatalog};
use upkeep_core::{AssetId, DomainResult, LocationId, PartId};
use upkeep_infra::lookups::{
    InMemoryAssetRegistry, InMemoryLocationDirectory, InMemoryPartCatalog, PostgresAssetRegistry,
    PostgresLocationDirectory, PostgresPartCatalog,
};
use upkeep_infra::stock_service::StockService;
use upkeep_infra::stock_store::{InMemoryStockStore, PostgresStockStore, StockStore};

/// Reference-data registration backends.
///
/// Parts/locations/assets are owned by collaborators in the full system; this
/// keeps each deployment self-contained so the ledger can be exercised end to
/// end without them.
enum RefData {
    InMemory {
        catalog: Arc<InMemoryPartCatalog>,
        locations: Arc<InMemoryLocationDirectory>,
        assets: Arc<InMemoryAssetRegistry>,
    },
    Persistent {
        catalog: PostgresPartCatalog,
        locations: PostgresLocationDirectory,
        assets: PostgresAssetRegistry,
    },
}

/// Wired application services shared by all routes.
pub struct AppServices {
    stock: StockService<Arc<dyn StockStore>>,
    catalog: Arc<dyn PartCatalog>,
    refdata: RefData,
}

impl AppServices {
    pub fn stock(&self) -> &StockService<Arc<dyn StockStore>> {
        &self.stock
    }

    pub async fn get_part(&self, part_id: PartId) -> DomainResult<Part> {
        self.catalog.part(part_id).await
    }

    pub async fn list_parts(&self) -> DomainResult<Vec<Part>> {
        self.catalog.list_parts().await
    }

    pub async fn register_part(&self, part: Part) -> DomainResult<()> {
        match &self.refdata {
            RefData::InMemory { catalog, .. } => catalog.upsert(part),
            RefData::Persistent { catalog, .. } => catalog.upsert(&part).await,
        }
    }

    pub async fn register_location(&self, location_id: LocationId, name: &str) -> DomainResult<()> {
        match &self.refdata {
            RefData::InMemory { locations, .. } => locations.register(location_id),
            RefData::Persistent { locations, .. } => locations.register(location_id, name).await,
        }
    }

    pub async fn register_asset(&self, asset_id: AssetId, name: &str) -> DomainResult<()> {
        match &self.refdata {
            RefData::InMemory { assets, .. } => assets.register(asset_id),
            RefData::Persistent { assets, .. } => assets.register(asset_id, name).await,
        }
    }
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        match build_persistent_services().await {
            Ok(services) => return services,
            Err(err) => {
                tracing::warn!(
                    "USE_PERSISTENT_STORES=true but persistent wiring failed ({err}); \
                     falling back to in-memory"
                );
            }
        }
    }

    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    // In-memory infra wiring (dev/test): store + lookup collaborators.
    let store: Arc<dyn StockStore> = Arc::new(InMemoryStockStore::new());
    let catalog = Arc::new(InMemoryPartCatalog::new());
    let locations = Arc::new(InMemoryLocationDirectory::new());
    let assets = Arc::new(InMemoryAssetRegistry::new());

    let catalog_dyn: Arc<dyn PartCatalog> = catalog.clone();
    let locations_dyn: Arc<dyn LocationDirectory> = locations.clone();
    let assets_dyn: Arc<dyn AssetRegistry> = assets.clone();

    AppServices {
        stock: StockService::new(
            store,
            catalog_dyn.clone(),
            locations_dyn,
            assets_dyn,
        ),
        catalog: catalog_dyn,
        refdata: RefData::InMemory {
            catalog,
            locations,
            assets,
        },
    }
}

async fn build_persistent_services() -> anyhow::Result<AppServices> {
    let url = std::env::var("DATABASE_URL")?;
    let pool = PgPool::connect(&url).await?;

    let store: Arc<dyn StockStore> = Arc::new(PostgresStockStore::new(pool.clone()));
    let catalog = PostgresPartCatalog::new(pool.clone());
    let locations = PostgresLocationDirectory::new(pool.clone());
    let assets = PostgresAssetRegistry::new(pool);

    let catalog_dyn: Arc<dyn PartCatalog> = Arc::new(catalog.clone());
    let locations_dyn: Arc<dyn LocationDirectory> = Arc::new(locations.clone());
    let assets_dyn: Arc<dyn AssetRegistry> = Arc::new(assets.clone());

    Ok(AppServices {
        stock: StockService::new(
            store,
            catalog_dyn.clone(),
            locations_dyn,
            assets_dyn,
        ),
        catalog: catalog_dyn,
        refdata: RefData::Persistent {
            catalog,
            locations,
            assets,
        },
    })
}
