//! Integration tests for the Postgres catalog store.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.
//!
//! Tests share one database and never truncate; every row they create is
//! suffixed with a fresh uuid so parallel runs stay independent.

use sqlx::PgPool;
use uuid::Uuid;

use shelfmap_common::MappingType;
use shelfmap_store::{migrate, CatalogStore, PgCatalogStore, StoreError};

async fn test_store() -> Option<PgCatalogStore> {
    let url = match std::env::var("DATABASE_TEST_URL") {
        Ok(url) => url,
        Err(_) => return None,
    };
    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to DATABASE_TEST_URL");
    migrate(&pool).await.expect("Failed to run migrations");
    Some(PgCatalogStore::new(pool))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[tokio::test]
async fn brand_roundtrip_and_typed_duplicate_key() {
    let Some(store) = test_store().await else { return };

    let canonical = unique("Sony");
    let normalized = canonical.to_lowercase();
    let aliases = vec![unique("sony-corp")];

    let created = store
        .create_brand(&canonical, &normalized, &aliases, false)
        .await
        .unwrap();
    assert_eq!(created.normalized_name, normalized);
    assert_eq!(created.aliases.len(), 1);
    assert!(!created.is_verified);

    let err = store
        .create_brand(&canonical.to_uppercase(), &normalized, &[], false)
        .await
        .unwrap_err();
    match err {
        StoreError::DuplicateKey { constraint } => {
            assert_eq!(constraint, "brands_normalized_name_key")
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }

    let by_normalized = store.find_brand_by_normalized(&normalized).await.unwrap();
    assert_eq!(by_normalized.map(|b| b.id), Some(created.id));

    let by_canonical = store
        .find_brand_by_canonical(&canonical.to_uppercase())
        .await
        .unwrap();
    assert_eq!(by_canonical.map(|b| b.id), Some(created.id));

    let by_alias = store
        .find_brand_by_alias(&aliases[0].to_uppercase())
        .await
        .unwrap();
    assert_eq!(by_alias.map(|b| b.id), Some(created.id));
}

#[tokio::test]
async fn alias_append_skips_duplicates_and_normalized_name() {
    let Some(store) = test_store().await else { return };

    let canonical = unique("Anker");
    let normalized = canonical.to_lowercase();
    let brand = store
        .create_brand(&canonical, &normalized, &[], true)
        .await
        .unwrap();

    let unchanged = store.add_brand_alias(brand.id, &normalized).await.unwrap();
    assert!(unchanged.aliases.is_empty());

    let alias = unique("anker-innovations");
    let updated = store.add_brand_alias(brand.id, &alias).await.unwrap();
    assert_eq!(updated.aliases, vec![alias.clone()]);

    let again = store.add_brand_alias(brand.id, &alias).await.unwrap();
    assert_eq!(again.aliases.len(), 1);
}

#[tokio::test]
async fn category_name_unique_per_parent_including_roots() {
    let Some(store) = test_store().await else { return };

    let root_name = unique("Root");
    let root = store.create_category(&root_name, None).await.unwrap();
    assert_eq!(root.level, 0);
    assert!(root.path.is_empty());

    // Same name under the same (null) parent is rejected.
    let err = store.create_category(&root_name, None).await.unwrap_err();
    assert!(err.is_duplicate_key());

    let child_name = unique("Child");
    let child = store
        .create_category(&child_name, Some(&root))
        .await
        .unwrap();
    assert_eq!(child.level, 1);
    assert_eq!(child.path, vec![root.id]);

    let err = store
        .create_category(&child_name, Some(&root))
        .await
        .unwrap_err();
    match err {
        StoreError::DuplicateKey { constraint } => {
            assert_eq!(constraint, "categories_name_parent_key")
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }

    let found = store
        .find_category_by_name_and_parent(&child_name, Some(root.id))
        .await
        .unwrap();
    assert_eq!(found.map(|c| c.id), Some(child.id));
}

#[tokio::test]
async fn mapping_case_insensitive_unique_and_usage_tracking() {
    let Some(store) = test_store().await else { return };

    let root = store.create_category(&unique("Root"), None).await.unwrap();
    let platform = Uuid::new_v4();
    let raw = unique("Smart-Home");

    let mapping = store
        .create_mapping(platform, &raw, root.id, None, MappingType::Manual, 1.0, true)
        .await
        .unwrap();
    assert_eq!(mapping.mapping_type, "manual");
    assert_eq!(mapping.usage_count, 0);

    let err = store
        .create_mapping(platform, &raw.to_uppercase(), root.id, None, MappingType::Manual, 1.0, true)
        .await
        .unwrap_err();
    match err {
        StoreError::DuplicateKey { constraint } => {
            assert_eq!(constraint, "category_mappings_platform_key")
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }

    let hit = store
        .find_active_mapping(platform, &raw.to_uppercase())
        .await
        .unwrap()
        .expect("case-insensitive lookup should find the mapping");
    assert_eq!(hit.id, mapping.id);

    store.record_mapping_use(mapping.id).await.unwrap();
    let after = store
        .find_mapping_any(platform, &raw)
        .await
        .unwrap()
        .expect("mapping should still exist");
    assert_eq!(after.usage_count, 1);
    assert!(after.last_used_at >= mapping.last_used_at);
}

#[tokio::test]
async fn unmapped_root_ensure_is_idempotent() {
    let Some(store) = test_store().await else { return };

    let first = store.ensure_unmapped_root().await.unwrap();
    let second = store.ensure_unmapped_root().await.unwrap();
    assert_eq!(first.id, second.id);
    assert!(first.is_root());
}

#[tokio::test]
async fn deactivated_mapping_leaves_lookups_but_keeps_the_unique_slot() {
    let Some(store) = test_store().await else { return };

    let root = store.create_category(&unique("Root"), None).await.unwrap();
    let platform = Uuid::new_v4();
    let raw = unique("Outdoor");

    let mapping = store
        .create_mapping(platform, &raw, root.id, None, MappingType::Automatic, 0.5, false)
        .await
        .unwrap();
    store.deactivate_mapping(mapping.id).await.unwrap();

    assert!(store
        .find_active_mapping(platform, &raw)
        .await
        .unwrap()
        .is_none());
    assert!(store.find_mapping_any(platform, &raw).await.unwrap().is_some());

    // The unique index still covers the deactivated row.
    let err = store
        .create_mapping(platform, &raw, root.id, None, MappingType::Automatic, 0.5, false)
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key());
}
