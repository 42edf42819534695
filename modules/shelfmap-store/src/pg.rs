//! Postgres-backed catalog store.
//!
//! Uniqueness lives in the database: one index per identity invariant
//! (normalized brand name, category name per parent, platform category per
//! platform). Inserts are single atomic statements; a violated index comes
//! back as [`StoreError::DuplicateKey`] for the caller's re-fetch path.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use shelfmap_common::MappingType;

use crate::error::{Result, StoreError};
use crate::models::{clean_aliases, Brand, Category, CategoryMapping};
use crate::store::CatalogStore;

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translate an insert failure, surfacing unique violations as the typed
/// duplicate-key variant instead of a provider error code check.
fn insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StoreError::DuplicateKey {
                constraint: db.constraint().unwrap_or("unknown").to_string(),
            };
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    // --- Brands ---

    async fn find_brand(&self, id: Uuid) -> Result<Option<Brand>> {
        sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn find_brand_by_normalized(&self, normalized_name: &str) -> Result<Option<Brand>> {
        sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE normalized_name = $1")
            .bind(normalized_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn find_brand_by_canonical(&self, name: &str) -> Result<Option<Brand>> {
        sqlx::query_as::<_, Brand>(
            "SELECT * FROM brands
             WHERE LOWER(canonical_name) = LOWER($1) AND is_active = TRUE
             ORDER BY popularity_score DESC
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn find_brand_by_alias(&self, alias: &str) -> Result<Option<Brand>> {
        // unnest + LOWER rather than ILIKE ANY: stored aliases must never be
        // interpreted as patterns.
        sqlx::query_as::<_, Brand>(
            "SELECT * FROM brands
             WHERE is_active = TRUE
               AND EXISTS (
                   SELECT 1 FROM unnest(aliases) a WHERE LOWER(a) = LOWER($1)
               )
             ORDER BY popularity_score DESC
             LIMIT 1",
        )
        .bind(alias)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create_brand(
        &self,
        canonical_name: &str,
        normalized_name: &str,
        aliases: &[String],
        is_verified: bool,
    ) -> Result<Brand> {
        let aliases = clean_aliases(normalized_name, aliases);
        sqlx::query_as::<_, Brand>(
            r#"
            INSERT INTO brands (canonical_name, normalized_name, aliases, is_verified)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(canonical_name)
        .bind(normalized_name)
        .bind(&aliases)
        .bind(is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)
    }

    async fn add_brand_alias(&self, brand_id: Uuid, alias: &str) -> Result<Brand> {
        let alias = alias.trim();
        if !alias.is_empty() {
            let updated = sqlx::query_as::<_, Brand>(
                r#"
                UPDATE brands
                SET aliases = array_append(aliases, $2), updated_at = NOW()
                WHERE id = $1
                  AND normalized_name <> $2
                  AND NOT ($2 = ANY(aliases))
                RETURNING *
                "#,
            )
            .bind(brand_id)
            .bind(alias)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(brand) = updated {
                return Ok(brand);
            }
        }
        // Alias was empty, already present, or shadows the normalized name.
        self.find_brand(brand_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("brand {brand_id}")))
    }

    async fn deactivate_brand(&self, brand_id: Uuid) -> Result<()> {
        let result =
            sqlx::query("UPDATE brands SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(brand_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("brand {brand_id}")));
        }
        Ok(())
    }

    async fn list_brands_needing_review(&self) -> Result<Vec<Brand>> {
        sqlx::query_as::<_, Brand>(
            "SELECT * FROM brands
             WHERE is_active = TRUE AND is_verified = FALSE
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    // --- Categories ---

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn find_category_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories
             WHERE name = $1 AND parent_id IS NOT DISTINCT FROM $2",
        )
        .bind(name)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn list_active_categories(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories
             WHERE is_active = TRUE
             ORDER BY level ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create_category(&self, name: &str, parent: Option<&Category>) -> Result<Category> {
        let (parent_id, level, path) = match parent {
            Some(p) => {
                let mut path = p.path.clone();
                path.push(p.id);
                (Some(p.id), p.level + 1, path)
            }
            None => (None, 0, Vec::new()),
        };
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, parent_id, level, path)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(parent_id)
        .bind(level)
        .bind(&path)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)
    }

    // --- Category mappings ---

    async fn find_active_mapping(
        &self,
        platform_id: Uuid,
        platform_category: &str,
    ) -> Result<Option<CategoryMapping>> {
        sqlx::query_as::<_, CategoryMapping>(
            "SELECT * FROM category_mappings
             WHERE platform_id = $1
               AND LOWER(platform_category) = LOWER($2)
               AND is_active = TRUE",
        )
        .bind(platform_id)
        .bind(platform_category)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn find_mapping_any(
        &self,
        platform_id: Uuid,
        platform_category: &str,
    ) -> Result<Option<CategoryMapping>> {
        sqlx::query_as::<_, CategoryMapping>(
            "SELECT * FROM category_mappings
             WHERE platform_id = $1
               AND LOWER(platform_category) = LOWER($2)",
        )
        .bind(platform_id)
        .bind(platform_category)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create_mapping(
        &self,
        platform_id: Uuid,
        platform_category: &str,
        target_category_id: Uuid,
        target_subcategory_id: Option<Uuid>,
        mapping_type: MappingType,
        confidence: f64,
        is_verified: bool,
    ) -> Result<CategoryMapping> {
        sqlx::query_as::<_, CategoryMapping>(
            r#"
            INSERT INTO category_mappings
                (platform_id, platform_category, target_category_id,
                 target_subcategory_id, mapping_type, confidence, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(platform_id)
        .bind(platform_category)
        .bind(target_category_id)
        .bind(target_subcategory_id)
        .bind(mapping_type.to_string())
        .bind(confidence)
        .bind(is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)
    }

    async fn record_mapping_use(&self, mapping_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE category_mappings
             SET usage_count = usage_count + 1, last_used_at = NOW()
             WHERE id = $1",
        )
        .bind(mapping_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("mapping {mapping_id}")));
        }
        Ok(())
    }

    async fn deactivate_mapping(&self, mapping_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE category_mappings SET is_active = FALSE WHERE id = $1")
            .bind(mapping_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("mapping {mapping_id}")));
        }
        Ok(())
    }

    async fn list_unverified_mappings(&self) -> Result<Vec<CategoryMapping>> {
        sqlx::query_as::<_, CategoryMapping>(
            "SELECT * FROM category_mappings
             WHERE is_active = TRUE AND is_verified = FALSE
             ORDER BY usage_count DESC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
