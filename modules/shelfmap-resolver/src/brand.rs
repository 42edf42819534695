//! Brand resolution: raw scraped brand strings to canonical brand records.

use std::sync::Arc;

use tracing::{debug, warn};

use shelfmap_common::{normalize_name, BrandResolution, ResolutionSource};
use shelfmap_store::{Brand, CatalogStore, Result, StoreError};

use crate::cache::ResolutionCache;

/// Resolves raw brand strings against the catalog through tiered matching:
/// cache, exact normalized name, case-insensitive canonical name,
/// case-insensitive alias, then auto-creation when enabled.
///
/// Every tier outcome is cached under the normalized input, so repeated
/// mentions of the same brand within the TTL cost no store round trips.
pub struct BrandResolver {
    store: Arc<dyn CatalogStore>,
    cache: Arc<ResolutionCache<BrandResolution>>,
    auto_create: bool,
}

impl BrandResolver {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<ResolutionCache<BrandResolution>>,
        auto_create: bool,
    ) -> Self {
        Self {
            store,
            cache,
            auto_create,
        }
    }

    /// Resolve one raw brand string. A store failure is a hard error; an
    /// unmatched brand is a normal `no_match` outcome.
    pub async fn resolve(&self, raw_brand: &str) -> Result<BrandResolution> {
        let trimmed = raw_brand.trim();
        if trimmed.is_empty() {
            return Ok(BrandResolution::invalid_input());
        }

        let key = normalize_name(trimmed);
        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "Brand resolution served from cache");
            return Ok(BrandResolution {
                source: ResolutionSource::Cache,
                ..(*cached).clone()
            });
        }

        let resolution = self.resolve_against_store(trimmed, &key).await?;
        self.cache.set(&key, resolution.clone());
        Ok(resolution)
    }

    async fn resolve_against_store(&self, raw: &str, normalized: &str) -> Result<BrandResolution> {
        if let Some(brand) = self.store.find_brand_by_normalized(normalized).await? {
            return Ok(resolved(&brand, 1.0, ResolutionSource::ExactMatch));
        }
        if let Some(brand) = self.store.find_brand_by_canonical(raw).await? {
            return Ok(resolved(&brand, 0.95, ResolutionSource::CaseInsensitive));
        }
        if let Some(brand) = self.store.find_brand_by_alias(raw).await? {
            return Ok(resolved(&brand, 0.90, ResolutionSource::AliasMatch));
        }

        if !self.auto_create {
            debug!(normalized, "No brand match and auto-creation is disabled");
            return Ok(BrandResolution::no_match());
        }

        match self.store.create_brand(raw, normalized, &[], false).await {
            Ok(brand) => {
                debug!(brand_id = %brand.id, normalized, "Auto-created brand");
                Ok(BrandResolution {
                    brand_id: Some(brand.id),
                    canonical_name: Some(brand.canonical_name),
                    confidence: 1.0,
                    source: ResolutionSource::AutoCreated,
                    needs_review: true,
                })
            }
            Err(e) if e.is_duplicate_key() => {
                // Another worker inserted this brand between our lookup and
                // the write. The winner's row is canonical.
                warn!(normalized, "Brand creation raced a concurrent insert, reusing the winner");
                let brand = self
                    .store
                    .find_brand_by_normalized(normalized)
                    .await?
                    .ok_or_else(|| {
                        StoreError::NotFound(format!(
                            "brand {normalized:?} missing after duplicate-key recovery"
                        ))
                    })?;
                Ok(resolved(&brand, 1.0, ResolutionSource::ExactMatch))
            }
            Err(e) => Err(e),
        }
    }
}

fn resolved(brand: &Brand, confidence: f64, source: ResolutionSource) -> BrandResolution {
    BrandResolution {
        brand_id: Some(brand.id),
        canonical_name: Some(brand.canonical_name.clone()),
        confidence,
        source,
        needs_review: !brand.is_verified,
    }
}
