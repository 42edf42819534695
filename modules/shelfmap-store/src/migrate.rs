//! Idempotent schema setup: tables, then unique indexes.
//! Every statement is IF NOT EXISTS, safe to re-run on every boot.

use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running catalog schema migrations...");

    let tables = [
        "CREATE TABLE IF NOT EXISTS brands (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            canonical_name TEXT NOT NULL,
            normalized_name TEXT NOT NULL,
            aliases TEXT[] NOT NULL DEFAULT '{}',
            is_verified BOOLEAN NOT NULL DEFAULT FALSE,
            popularity_score INTEGER NOT NULL DEFAULT 0,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
        "CREATE TABLE IF NOT EXISTS categories (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            parent_id UUID REFERENCES categories(id),
            level INTEGER NOT NULL DEFAULT 0,
            path UUID[] NOT NULL DEFAULT '{}',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
        "CREATE TABLE IF NOT EXISTS category_mappings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            platform_id UUID NOT NULL,
            platform_category TEXT NOT NULL,
            target_category_id UUID NOT NULL REFERENCES categories(id),
            target_subcategory_id UUID REFERENCES categories(id),
            mapping_type TEXT NOT NULL,
            confidence DOUBLE PRECISION NOT NULL,
            is_verified BOOLEAN NOT NULL DEFAULT FALSE,
            usage_count INTEGER NOT NULL DEFAULT 0,
            last_used_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ];

    for t in &tables {
        sqlx::query(t).execute(pool).await?;
    }
    info!("Catalog tables ready");

    // Uniqueness the resolvers rely on. Roots have a null parent_id, and
    // Postgres treats nulls as distinct, so the category index coalesces to
    // the zero uuid to make root names unique too.
    let indexes = [
        "CREATE UNIQUE INDEX IF NOT EXISTS brands_normalized_name_key
            ON brands (normalized_name)",
        "CREATE UNIQUE INDEX IF NOT EXISTS categories_name_parent_key
            ON categories (name, COALESCE(parent_id, '00000000-0000-0000-0000-000000000000'::uuid))",
        "CREATE UNIQUE INDEX IF NOT EXISTS category_mappings_platform_key
            ON category_mappings (platform_id, LOWER(platform_category))",
        "CREATE INDEX IF NOT EXISTS categories_parent_idx ON categories (parent_id)",
        "CREATE INDEX IF NOT EXISTS category_mappings_review_idx
            ON category_mappings (is_verified, usage_count) WHERE is_active",
    ];

    for idx in &indexes {
        sqlx::query(idx).execute(pool).await?;
    }
    info!("Catalog indexes ready");

    Ok(())
}
