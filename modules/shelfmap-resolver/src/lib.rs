//! Entity resolution for the ingestion pipeline.
//!
//! Raw scraped strings ("SONY", "Laptops & Notebooks") are matched to
//! canonical catalog entities through tiered lookups backed by a
//! [`CatalogStore`](shelfmap_store::CatalogStore). Matching never deletes
//! or rewrites catalog rows; unknown values are auto-created behind review
//! flags, and concurrent creations converge on one row through the store's
//! unique constraints.

pub mod brand;
pub mod cache;
pub mod category;
pub mod fuzzy;

pub use brand::BrandResolver;
pub use cache::{CacheStats, ResolutionCache, DEFAULT_TTL};
pub use category::CategoryResolver;
