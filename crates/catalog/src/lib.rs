//! Part catalog reference data.
//!
//! This crate contains the catalog entities the stock ledger reads (parts and
//! their reorder thresholds) plus the lookup collaborator traits through which
//! the ledger checks referential validity. The catalog is read-mostly: the
//! ledger never mutates it.

pub mod lookup;
pub mod part;

pub use lookup::{AssetRegistry, LocationDirectory, PartCatalog};
pub use part::{NewPart, Part, PartStatus};
