//! Category resolution: platform category strings to the canonical tree.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use shelfmap_common::{normalize_name, CategoryResolution, MappingType, ResolutionSource};
use shelfmap_store::{CatalogStore, Category, CategoryMapping, Result, StoreError};

use crate::cache::ResolutionCache;
use crate::fuzzy;

/// Resolves platform category strings through tiered matching: cache,
/// persisted platform mapping, fuzzy name match against the active tree,
/// then a placeholder under the "Unmapped Products" root when enabled.
///
/// Fuzzy hits are advisory and never persisted. Placeholder creation writes
/// both a child category and an automatic mapping, so the next cold lookup
/// of the same string resolves through the mapping tier.
pub struct CategoryResolver {
    store: Arc<dyn CatalogStore>,
    cache: Arc<ResolutionCache<CategoryResolution>>,
    auto_create: bool,
    unmapped_root_id: Option<Uuid>,
}

impl CategoryResolver {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<ResolutionCache<CategoryResolution>>,
        auto_create: bool,
        unmapped_root_id: Option<Uuid>,
    ) -> Self {
        Self {
            store,
            cache,
            auto_create,
            unmapped_root_id,
        }
    }

    /// Resolve one platform category string. Mappings are scoped to a
    /// platform, so the cache key carries the platform id.
    pub async fn resolve(
        &self,
        platform_id: Uuid,
        raw_category: &str,
    ) -> Result<CategoryResolution> {
        let trimmed = raw_category.trim();
        if trimmed.is_empty() {
            return Ok(CategoryResolution::invalid_input());
        }

        let key = format!("{platform_id}:{}", normalize_name(trimmed));
        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "Category resolution served from cache");
            return Ok(CategoryResolution {
                source: ResolutionSource::Cache,
                ..(*cached).clone()
            });
        }

        let resolution = self.resolve_against_store(platform_id, trimmed).await?;
        self.cache.set(&key, resolution.clone());
        Ok(resolution)
    }

    async fn resolve_against_store(
        &self,
        platform_id: Uuid,
        raw: &str,
    ) -> Result<CategoryResolution> {
        if let Some(mapping) = self.store.find_active_mapping(platform_id, raw).await? {
            self.store.record_mapping_use(mapping.id).await?;
            debug!(mapping_id = %mapping.id, raw, "Category resolved by persisted mapping");
            return self.from_mapping(&mapping).await;
        }

        let categories = self.store.list_active_categories().await?;
        if let Some(hit) = fuzzy::match_category(raw, &categories) {
            let (category, subcategory) = self.tree_position(hit, &categories).await?;
            debug!(category = %category.name, raw, "Category resolved by fuzzy name match");
            return Ok(CategoryResolution {
                category_id: Some(category.id),
                subcategory_id: subcategory.as_ref().map(|c| c.id),
                category_name: Some(category.name),
                subcategory_name: subcategory.map(|c| c.name),
                confidence: 0.8,
                source: ResolutionSource::FuzzyMatch,
                needs_review: false,
            });
        }

        let Some(root_id) = self.unmapped_root_id else {
            debug!(raw, "No category match and no unmapped root is configured");
            return Ok(CategoryResolution::no_match());
        };
        if !self.auto_create {
            debug!(raw, "No category match and auto-creation is disabled");
            return Ok(CategoryResolution::no_match());
        }
        self.create_placeholder(platform_id, raw, root_id).await
    }

    /// Map a matched node to the result's (category, subcategory) pair: a
    /// root stands alone, a child is reported under its parent.
    async fn tree_position(
        &self,
        hit: &Category,
        categories: &[Category],
    ) -> Result<(Category, Option<Category>)> {
        let Some(parent_id) = hit.parent_id else {
            return Ok((hit.clone(), None));
        };
        let parent = match categories.iter().find(|c| c.id == parent_id) {
            Some(parent) => Some(parent.clone()),
            // The parent may have been deactivated out of the listing.
            None => self.store.find_category(parent_id).await?,
        };
        match parent {
            Some(parent) => Ok((parent, Some(hit.clone()))),
            None => Ok((hit.clone(), None)),
        }
    }

    async fn create_placeholder(
        &self,
        platform_id: Uuid,
        raw: &str,
        root_id: Uuid,
    ) -> Result<CategoryResolution> {
        let root = self
            .store
            .find_category(root_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("unmapped root category {root_id}")))?;

        let child = match self
            .store
            .find_category_by_name_and_parent(raw, Some(root_id))
            .await?
        {
            Some(existing) => existing,
            None => match self.store.create_category(raw, Some(&root)).await {
                Ok(created) => {
                    debug!(category_id = %created.id, raw, "Created placeholder category");
                    created
                }
                Err(e) if e.is_duplicate_key() => self
                    .store
                    .find_category_by_name_and_parent(raw, Some(root_id))
                    .await?
                    .ok_or_else(|| {
                        StoreError::NotFound(format!(
                            "category {raw:?} missing after duplicate-key recovery"
                        ))
                    })?,
                Err(e) => return Err(e),
            },
        };

        match self
            .store
            .create_mapping(
                platform_id,
                raw,
                root_id,
                Some(child.id),
                MappingType::Automatic,
                0.5,
                false,
            )
            .await
        {
            Ok(mapping) => {
                debug!(mapping_id = %mapping.id, raw, "Created placeholder mapping");
                Ok(CategoryResolution {
                    category_id: Some(root.id),
                    subcategory_id: Some(child.id),
                    category_name: Some(root.name),
                    subcategory_name: Some(child.name),
                    confidence: mapping.confidence,
                    source: ResolutionSource::AutoCreated,
                    needs_review: true,
                })
            }
            Err(e) if e.is_duplicate_key() => {
                // Another worker persisted a mapping for this string first.
                // Its row is canonical, active or not.
                warn!(%platform_id, raw, "Mapping creation raced a concurrent insert, reusing the winner");
                let mapping = self
                    .store
                    .find_mapping_any(platform_id, raw)
                    .await?
                    .ok_or_else(|| {
                        StoreError::NotFound(format!(
                            "mapping for {raw:?} missing after duplicate-key recovery"
                        ))
                    })?;
                self.store.record_mapping_use(mapping.id).await?;
                self.from_mapping(&mapping).await
            }
            Err(e) => Err(e),
        }
    }

    async fn from_mapping(&self, mapping: &CategoryMapping) -> Result<CategoryResolution> {
        let category = self.store.find_category(mapping.target_category_id).await?;
        let subcategory = match mapping.target_subcategory_id {
            Some(id) => self.store.find_category(id).await?,
            None => None,
        };
        Ok(CategoryResolution {
            category_id: Some(mapping.target_category_id),
            subcategory_id: mapping.target_subcategory_id,
            category_name: category.map(|c| c.name),
            subcategory_name: subcategory.map(|c| c.name),
            confidence: mapping.confidence,
            source: ResolutionSource::ExistingMapping,
            needs_review: !mapping.is_verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use shelfmap_store::MemoryCatalogStore;

    async fn seeded_store() -> (Arc<MemoryCatalogStore>, Category) {
        let store = Arc::new(MemoryCatalogStore::new());
        let root = store.ensure_unmapped_root().await.unwrap();
        (store, root)
    }

    fn resolver_with_root(store: &Arc<MemoryCatalogStore>, root: &Category) -> CategoryResolver {
        CategoryResolver::new(
            store.clone(),
            Arc::new(ResolutionCache::default()),
            true,
            Some(root.id),
        )
    }

    #[tokio::test]
    async fn persisted_mapping_wins_and_tracks_usage() {
        let (store, root) = seeded_store().await;
        let electronics = store.create_category("Electronics", None).await.unwrap();
        let laptop = store
            .create_category("Laptop", Some(&electronics))
            .await
            .unwrap();
        let platform = Uuid::new_v4();
        store
            .create_mapping(
                platform,
                "Notebooks",
                electronics.id,
                Some(laptop.id),
                MappingType::Manual,
                1.0,
                true,
            )
            .await
            .unwrap();

        let resolution = resolver_with_root(&store, &root)
            .resolve(platform, "NOTEBOOKS")
            .await
            .unwrap();

        assert_eq!(resolution.source, ResolutionSource::ExistingMapping);
        assert_eq!(resolution.confidence, 1.0);
        assert!(!resolution.needs_review);
        assert_eq!(resolution.category_name.as_deref(), Some("Electronics"));
        assert_eq!(resolution.subcategory_name.as_deref(), Some("Laptop"));
        assert_eq!(store.mappings()[0].usage_count, 1);
    }

    #[tokio::test]
    async fn fuzzy_match_is_advisory_and_never_persisted() {
        let (store, root) = seeded_store().await;
        let electronics = store.create_category("Electronics", None).await.unwrap();
        let laptop = store
            .create_category("Laptop", Some(&electronics))
            .await
            .unwrap();
        let platform = Uuid::new_v4();

        let resolution = resolver_with_root(&store, &root)
            .resolve(platform, "Laptops")
            .await
            .unwrap();
        assert_eq!(resolution.source, ResolutionSource::FuzzyMatch);
        assert_eq!(resolution.confidence, 0.8);
        assert!(!resolution.needs_review);
        assert_eq!(resolution.category_id, Some(electronics.id));
        assert_eq!(resolution.subcategory_id, Some(laptop.id));
        assert_eq!(store.mapping_count(), 0);

        // Still fuzzy on a cold second lookup: nothing was written.
        let again = resolver_with_root(&store, &root)
            .resolve(platform, "Laptops")
            .await
            .unwrap();
        assert_eq!(again.source, ResolutionSource::FuzzyMatch);
        assert_eq!(store.mapping_count(), 0);
    }

    #[tokio::test]
    async fn unmapped_string_gets_a_placeholder_and_later_lookups_reuse_it() {
        let (store, root) = seeded_store().await;
        let platform = Uuid::new_v4();

        let first = resolver_with_root(&store, &root)
            .resolve(platform, "Massage Chairs")
            .await
            .unwrap();
        assert_eq!(first.source, ResolutionSource::AutoCreated);
        assert_eq!(first.confidence, 0.5);
        assert!(first.needs_review);
        assert_eq!(first.category_id, Some(root.id));
        assert_eq!(first.subcategory_name.as_deref(), Some("Massage Chairs"));
        assert_eq!(store.category_count(), 2);
        assert_eq!(store.mapping_count(), 1);
        let mapping = &store.mappings()[0];
        assert_eq!(mapping.mapping_type, "automatic");
        assert!(!mapping.is_verified);

        // Cold cache: the persisted mapping answers, nothing new is made.
        let second = resolver_with_root(&store, &root)
            .resolve(platform, "massage chairs")
            .await
            .unwrap();
        assert_eq!(second.source, ResolutionSource::ExistingMapping);
        assert_eq!(second.subcategory_id, first.subcategory_id);
        assert!(second.needs_review);
        assert_eq!(store.category_count(), 2);
        assert_eq!(store.mapping_count(), 1);
    }

    #[tokio::test]
    async fn no_match_without_auto_create_or_root() {
        let (store, root) = seeded_store().await;
        let platform = Uuid::new_v4();

        let disabled = CategoryResolver::new(
            store.clone(),
            Arc::new(ResolutionCache::default()),
            false,
            Some(root.id),
        );
        let resolution = disabled.resolve(platform, "Massage Chairs").await.unwrap();
        assert_eq!(resolution.source, ResolutionSource::NoMatch);
        assert!(resolution.needs_review);

        let rootless =
            CategoryResolver::new(store.clone(), Arc::new(ResolutionCache::default()), true, None);
        let resolution = rootless.resolve(platform, "Massage Chairs").await.unwrap();
        assert_eq!(resolution.source, ResolutionSource::NoMatch);

        assert_eq!(store.category_count(), 1);
        assert_eq!(store.mapping_count(), 0);
    }

    #[tokio::test]
    async fn blank_input_never_touches_the_store() {
        let store = Arc::new(MemoryCatalogStore::new());
        store.set_failing(true);
        let resolver =
            CategoryResolver::new(store.clone(), Arc::new(ResolutionCache::default()), true, None);

        let resolution = resolver.resolve(Uuid::new_v4(), "  ").await.unwrap();
        assert_eq!(resolution.source, ResolutionSource::InvalidInput);
        assert_eq!(resolution.category_id, None);
        assert_eq!(resolution.confidence, 0.0);
    }

    #[tokio::test]
    async fn cache_keys_are_scoped_per_platform() {
        let (store, root) = seeded_store().await;
        let cache = Arc::new(ResolutionCache::default());
        let resolver = CategoryResolver::new(store.clone(), cache.clone(), true, Some(root.id));
        let platform_a = Uuid::new_v4();
        let platform_b = Uuid::new_v4();

        let first = resolver.resolve(platform_a, "Massage Chairs").await.unwrap();
        assert_eq!(first.source, ResolutionSource::AutoCreated);

        let hit = resolver.resolve(platform_a, "Massage Chairs").await.unwrap();
        assert_eq!(hit.source, ResolutionSource::Cache);
        assert_eq!(hit.subcategory_id, first.subcategory_id);

        let cached = cache.get(&format!("{platform_a}:massage chairs")).unwrap();
        assert_eq!(
            serde_json::to_vec(cached.as_ref()).unwrap(),
            serde_json::to_vec(&first).unwrap()
        );

        // Same string from another platform misses the cache. The
        // placeholder category is a real tree node by now, so it lands as
        // a fuzzy hit rather than a second mapping.
        let other = resolver.resolve(platform_b, "Massage Chairs").await.unwrap();
        assert_eq!(other.source, ResolutionSource::FuzzyMatch);
        assert_eq!(other.subcategory_id, first.subcategory_id);
        assert_eq!(store.mapping_count(), 1);
    }

    #[tokio::test]
    async fn lost_mapping_race_reuses_the_winning_row() {
        let (store, root) = seeded_store().await;
        let electronics = store.create_category("Electronics", None).await.unwrap();
        let platform = Uuid::new_v4();

        // A deactivated row stands in for a concurrent writer's insert:
        // invisible to the active lookup but still holding the unique slot.
        let mapping = store
            .create_mapping(
                platform,
                "Gizmos",
                electronics.id,
                None,
                MappingType::Manual,
                0.9,
                false,
            )
            .await
            .unwrap();
        store.deactivate_mapping(mapping.id).await.unwrap();

        let resolution = resolver_with_root(&store, &root)
            .resolve(platform, "Gizmos")
            .await
            .unwrap();

        assert_eq!(resolution.source, ResolutionSource::ExistingMapping);
        assert_eq!(resolution.category_id, Some(electronics.id));
        assert_eq!(resolution.subcategory_id, None);
        assert_eq!(resolution.confidence, 0.9);
        assert!(resolution.needs_review);
        assert_eq!(store.mapping_count(), 1);
        assert_eq!(store.mappings()[0].usage_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_placeholder_creation_yields_one_mapping() {
        let (store, root) = seeded_store().await;
        let platform = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let store = store.clone();
            let root = root.clone();
            handles.push(tokio::spawn(async move {
                resolver_with_root(&store, &root)
                    .resolve(platform, "Massage Chairs")
                    .await
            }));
        }

        let mut subcategory_ids = HashSet::new();
        for handle in futures::future::join_all(handles).await {
            let resolution = handle.unwrap().unwrap();
            subcategory_ids.insert(resolution.subcategory_id.unwrap());
        }
        assert_eq!(subcategory_ids.len(), 1);
        assert_eq!(store.mapping_count(), 1);
        assert_eq!(store.category_count(), 2);
    }
}
