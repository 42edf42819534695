//! The catalog store boundary.
//!
//! Resolvers are written against this trait so tests run against
//! [`MemoryCatalogStore`](crate::MemoryCatalogStore) with no database, while
//! production uses [`PgCatalogStore`](crate::PgCatalogStore). Both enforce
//! the same unique constraints and surface violations as
//! [`StoreError::DuplicateKey`](crate::StoreError), which is the hook for
//! the resolvers' create-then-refetch race recovery.

use async_trait::async_trait;
use uuid::Uuid;

use shelfmap_common::MappingType;

use crate::error::{Result, StoreError};
use crate::models::{Brand, Category, CategoryMapping};

/// Name of the single catch-all root category for auto-created placeholders.
pub const UNMAPPED_ROOT_NAME: &str = "Unmapped Products";

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Brands ---

    async fn find_brand(&self, id: Uuid) -> Result<Option<Brand>>;

    /// Exact match on the normalized name. No active filter: the row owns
    /// the unique index whether or not it has been deactivated.
    async fn find_brand_by_normalized(&self, normalized_name: &str) -> Result<Option<Brand>>;

    /// Case-insensitive match on the display name, active brands only.
    async fn find_brand_by_canonical(&self, name: &str) -> Result<Option<Brand>>;

    /// Case-insensitive match against any alias, active brands only.
    async fn find_brand_by_alias(&self, alias: &str) -> Result<Option<Brand>>;

    /// Insert a new brand. Fails with `DuplicateKey` if `normalized_name`
    /// is already taken.
    async fn create_brand(
        &self,
        canonical_name: &str,
        normalized_name: &str,
        aliases: &[String],
        is_verified: bool,
    ) -> Result<Brand>;

    /// Append an alias, skipping it if already present or equal to the
    /// brand's normalized name. Returns the brand as stored afterwards.
    async fn add_brand_alias(&self, brand_id: Uuid, alias: &str) -> Result<Brand>;

    async fn deactivate_brand(&self, brand_id: Uuid) -> Result<()>;

    /// Active, unverified brands (auto-created), oldest first.
    async fn list_brands_needing_review(&self) -> Result<Vec<Brand>>;

    // --- Categories ---

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;

    /// Exact (name, parent) lookup; the constraint-owner query, so no
    /// active filter.
    async fn find_category_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Category>>;

    /// The active tree, roots before children, names ascending within a
    /// level. Fuzzy matching scans this order, so it must be deterministic.
    async fn list_active_categories(&self) -> Result<Vec<Category>>;

    /// Insert a new category under `parent` (or as a root). `level` and
    /// `path` are derived from the parent. Fails with `DuplicateKey` if
    /// `(name, parent)` is already taken.
    async fn create_category(&self, name: &str, parent: Option<&Category>) -> Result<Category>;

    /// Race-safe find-or-create of the "Unmapped Products" root.
    async fn ensure_unmapped_root(&self) -> Result<Category> {
        if let Some(root) = self
            .find_category_by_name_and_parent(UNMAPPED_ROOT_NAME, None)
            .await?
        {
            return Ok(root);
        }
        match self.create_category(UNMAPPED_ROOT_NAME, None).await {
            Ok(root) => Ok(root),
            Err(e) if e.is_duplicate_key() => self
                .find_category_by_name_and_parent(UNMAPPED_ROOT_NAME, None)
                .await?
                .ok_or_else(|| {
                    StoreError::NotFound(format!(
                        "{UNMAPPED_ROOT_NAME} root missing after duplicate-key recovery"
                    ))
                }),
            Err(e) => Err(e),
        }
    }

    // --- Category mappings ---

    /// Case-insensitive lookup of an active mapping for this platform.
    async fn find_active_mapping(
        &self,
        platform_id: Uuid,
        platform_category: &str,
    ) -> Result<Option<CategoryMapping>>;

    /// As above but without the active filter; used for duplicate-key
    /// recovery, where the winning row may be any state.
    async fn find_mapping_any(
        &self,
        platform_id: Uuid,
        platform_category: &str,
    ) -> Result<Option<CategoryMapping>>;

    /// Insert a new mapping. Fails with `DuplicateKey` if
    /// `(platform_id, lower(platform_category))` is already taken.
    async fn create_mapping(
        &self,
        platform_id: Uuid,
        platform_category: &str,
        target_category_id: Uuid,
        target_subcategory_id: Option<Uuid>,
        mapping_type: MappingType,
        confidence: f64,
        is_verified: bool,
    ) -> Result<CategoryMapping>;

    /// Bump `usage_count` and `last_used_at` after a mapping served a
    /// resolution. A single UPDATE; the caller keeps its fetched row.
    async fn record_mapping_use(&self, mapping_id: Uuid) -> Result<()>;

    async fn deactivate_mapping(&self, mapping_id: Uuid) -> Result<()>;

    /// Active, unverified mappings, most used first (triage order).
    async fn list_unverified_mappings(&self) -> Result<Vec<CategoryMapping>>;
}
