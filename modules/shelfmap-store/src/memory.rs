//! In-memory catalog store for tests and local development. No database
//! required. Enforces the same unique constraints as Postgres, under one
//! lock per call, and reports violations with the same index names, so
//! resolver race recovery is exercised for real. Thread-safe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use shelfmap_common::MappingType;

use crate::error::{Result, StoreError};
use crate::models::{clean_aliases, Brand, Category, CategoryMapping};
use crate::store::CatalogStore;

pub struct MemoryCatalogStore {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

#[derive(Default)]
struct Inner {
    brands: Vec<Brand>,
    categories: Vec<Category>,
    mappings: Vec<CategoryMapping>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with `Unavailable`. For tests that
    /// assert hard-failure propagation.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    // --- Assertion accessors ---

    pub fn brand_count(&self) -> usize {
        self.inner.lock().unwrap().brands.len()
    }

    pub fn category_count(&self) -> usize {
        self.inner.lock().unwrap().categories.len()
    }

    pub fn mapping_count(&self) -> usize {
        self.inner.lock().unwrap().mappings.len()
    }

    pub fn brands(&self) -> Vec<Brand> {
        self.inner.lock().unwrap().brands.clone()
    }

    pub fn mappings(&self) -> Vec<CategoryMapping> {
        self.inner.lock().unwrap().mappings.clone()
    }

    fn available(&self) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    // --- Brands ---

    async fn find_brand(&self, id: Uuid) -> Result<Option<Brand>> {
        self.available()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.brands.iter().find(|b| b.id == id).cloned())
    }

    async fn find_brand_by_normalized(&self, normalized_name: &str) -> Result<Option<Brand>> {
        self.available()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .brands
            .iter()
            .find(|b| b.normalized_name == normalized_name)
            .cloned())
    }

    async fn find_brand_by_canonical(&self, name: &str) -> Result<Option<Brand>> {
        self.available()?;
        let needle = name.to_lowercase();
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<&Brand> = inner
            .brands
            .iter()
            .filter(|b| b.is_active && b.canonical_name.to_lowercase() == needle)
            .collect();
        matches.sort_by_key(|b| std::cmp::Reverse(b.popularity_score));
        Ok(matches.first().map(|b| (*b).clone()))
    }

    async fn find_brand_by_alias(&self, alias: &str) -> Result<Option<Brand>> {
        self.available()?;
        let needle = alias.to_lowercase();
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<&Brand> = inner
            .brands
            .iter()
            .filter(|b| {
                b.is_active && b.aliases.iter().any(|a| a.to_lowercase() == needle)
            })
            .collect();
        matches.sort_by_key(|b| std::cmp::Reverse(b.popularity_score));
        Ok(matches.first().map(|b| (*b).clone()))
    }

    async fn create_brand(
        &self,
        canonical_name: &str,
        normalized_name: &str,
        aliases: &[String],
        is_verified: bool,
    ) -> Result<Brand> {
        self.available()?;
        let mut inner = self.inner.lock().unwrap();
        if inner
            .brands
            .iter()
            .any(|b| b.normalized_name == normalized_name)
        {
            return Err(StoreError::DuplicateKey {
                constraint: "brands_normalized_name_key".to_string(),
            });
        }
        let now = Utc::now();
        let brand = Brand {
            id: Uuid::new_v4(),
            canonical_name: canonical_name.to_string(),
            normalized_name: normalized_name.to_string(),
            aliases: clean_aliases(normalized_name, aliases),
            is_verified,
            popularity_score: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.brands.push(brand.clone());
        Ok(brand)
    }

    async fn add_brand_alias(&self, brand_id: Uuid, alias: &str) -> Result<Brand> {
        self.available()?;
        let alias = alias.trim();
        let mut inner = self.inner.lock().unwrap();
        let brand = inner
            .brands
            .iter_mut()
            .find(|b| b.id == brand_id)
            .ok_or_else(|| StoreError::NotFound(format!("brand {brand_id}")))?;
        if !alias.is_empty()
            && alias != brand.normalized_name
            && !brand.aliases.iter().any(|a| a == alias)
        {
            brand.aliases.push(alias.to_string());
            brand.updated_at = Utc::now();
        }
        Ok(brand.clone())
    }

    async fn deactivate_brand(&self, brand_id: Uuid) -> Result<()> {
        self.available()?;
        let mut inner = self.inner.lock().unwrap();
        let brand = inner
            .brands
            .iter_mut()
            .find(|b| b.id == brand_id)
            .ok_or_else(|| StoreError::NotFound(format!("brand {brand_id}")))?;
        brand.is_active = false;
        brand.updated_at = Utc::now();
        Ok(())
    }

    async fn list_brands_needing_review(&self) -> Result<Vec<Brand>> {
        self.available()?;
        let inner = self.inner.lock().unwrap();
        let mut brands: Vec<Brand> = inner
            .brands
            .iter()
            .filter(|b| b.is_active && !b.is_verified)
            .cloned()
            .collect();
        brands.sort_by_key(|b| b.created_at);
        Ok(brands)
    }

    // --- Categories ---

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        self.available()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Category>> {
        self.available()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .categories
            .iter()
            .find(|c| c.name == name && c.parent_id == parent_id)
            .cloned())
    }

    async fn list_active_categories(&self) -> Result<Vec<Category>> {
        self.available()?;
        let inner = self.inner.lock().unwrap();
        let mut categories: Vec<Category> = inner
            .categories
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn create_category(&self, name: &str, parent: Option<&Category>) -> Result<Category> {
        self.available()?;
        let mut inner = self.inner.lock().unwrap();
        let parent_id = parent.map(|p| p.id);
        if inner
            .categories
            .iter()
            .any(|c| c.name == name && c.parent_id == parent_id)
        {
            return Err(StoreError::DuplicateKey {
                constraint: "categories_name_parent_key".to_string(),
            });
        }
        let (level, path) = match parent {
            Some(p) => {
                let mut path = p.path.clone();
                path.push(p.id);
                (p.level + 1, path)
            }
            None => (0, Vec::new()),
        };
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id,
            level,
            path,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.categories.push(category.clone());
        Ok(category)
    }

    // --- Category mappings ---

    async fn find_active_mapping(
        &self,
        platform_id: Uuid,
        platform_category: &str,
    ) -> Result<Option<CategoryMapping>> {
        self.available()?;
        let needle = platform_category.to_lowercase();
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .mappings
            .iter()
            .find(|m| {
                m.is_active
                    && m.platform_id == platform_id
                    && m.platform_category.to_lowercase() == needle
            })
            .cloned())
    }

    async fn find_mapping_any(
        &self,
        platform_id: Uuid,
        platform_category: &str,
    ) -> Result<Option<CategoryMapping>> {
        self.available()?;
        let needle = platform_category.to_lowercase();
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .mappings
            .iter()
            .find(|m| {
                m.platform_id == platform_id && m.platform_category.to_lowercase() == needle
            })
            .cloned())
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
        self.available()?;
        let needle = platform_category.to_lowercase();
        let mut inner = self.inner.lock().unwrap();
        if inner
            .mappings
            .iter()
            .any(|m| m.platform_id == platform_id && m.platform_category.to_lowercase() == needle)
        {
            return Err(StoreError::DuplicateKey {
                constraint: "category_mappings_platform_key".to_string(),
            });
        }
        let now = Utc::now();
        let mapping = CategoryMapping {
            id: Uuid::new_v4(),
            platform_id,
            platform_category: platform_category.to_string(),
            target_category_id,
            target_subcategory_id,
            mapping_type: mapping_type.to_string(),
            confidence,
            is_verified,
            usage_count: 0,
            last_used_at: now,
            is_active: true,
            created_at: now,
        };
        inner.mappings.push(mapping.clone());
        Ok(mapping)
    }

    async fn record_mapping_use(&self, mapping_id: Uuid) -> Result<()> {
        self.available()?;
        let mut inner = self.inner.lock().unwrap();
        let mapping = inner
            .mappings
            .iter_mut()
            .find(|m| m.id == mapping_id)
            .ok_or_else(|| StoreError::NotFound(format!("mapping {mapping_id}")))?;
        mapping.usage_count += 1;
        mapping.last_used_at = Utc::now();
        Ok(())
    }

    async fn deactivate_mapping(&self, mapping_id: Uuid) -> Result<()> {
        self.available()?;
        let mut inner = self.inner.lock().unwrap();
        let mapping = inner
            .mappings
            .iter_mut()
            .find(|m| m.id == mapping_id)
            .ok_or_else(|| StoreError::NotFound(format!("mapping {mapping_id}")))?;
        mapping.is_active = false;
        Ok(())
    }

    async fn list_unverified_mappings(&self) -> Result<Vec<CategoryMapping>> {
        self.available()?;
        let inner = self.inner.lock().unwrap();
        let mut mappings: Vec<CategoryMapping> = inner
            .mappings
            .iter()
            .filter(|m| m.is_active && !m.is_verified)
            .cloned()
            .collect();
        mappings.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(mappings)
    }
}
