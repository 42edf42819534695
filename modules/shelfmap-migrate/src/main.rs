use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelfmap_common::Config;
use shelfmap_store::{migrate, CatalogStore, PgCatalogStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shelfmap=info".parse()?))
        .init();

    info!("Shelfmap migrate starting...");

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&config.database_url)
        .await?;

    migrate(&pool).await?;

    // Auto-created categories need their parent in place before ingestion
    // starts.
    let store = PgCatalogStore::new(pool);
    let root = store.ensure_unmapped_root().await?;
    info!(root_id = %root.id, "Unmapped Products root is in place");

    info!("Migration complete");
    Ok(())
}
