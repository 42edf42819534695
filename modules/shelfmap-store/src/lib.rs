//! Catalog persistence: canonical brands, the category tree, and per-platform
//! category mappings.
//!
//! Rows are never deleted, only deactivated. Unique indexes are the source
//! of truth for entity identity; everything above this crate treats a
//! [`StoreError::DuplicateKey`] as "somebody else won the creation race, go
//! re-read".

pub mod error;
pub mod memory;
pub mod migrate;
pub mod models;
pub mod pg;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use error::{Result, StoreError};
pub use memory::MemoryCatalogStore;
pub use migrate::migrate;
pub use models::{Brand, Category, CategoryMapping};
pub use pg::PgCatalogStore;
pub use store::{CatalogStore, UNMAPPED_ROOT_NAME};
