//! Stock store boundary.
//!
//! This module defines the infrastructure-facing abstraction for reading and
//! atomically mutating the stock ledger without making storage assumptions.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryStockStore;
pub use postgres::PostgresStockStore;
pub use query::{Pagination, TransactionFilter, TransactionPage};
pub use r#trait::{StockStore, StockStoreError, StoreResult, TransferOutcome};
