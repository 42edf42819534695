use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Resolution
    pub resolution_cache_ttl_secs: u64,
    pub auto_create_brands: bool,
    pub auto_create_categories: bool,

    // Review collection
    pub collector_max_items: usize,
    pub collector_max_iterations: u32,
    pub collector_poll_interval_ms: u64,
    pub collector_change_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            resolution_cache_ttl_secs: parsed_env("RESOLUTION_CACHE_TTL_SECS", 3600),
            auto_create_brands: parsed_env("AUTO_CREATE_BRANDS", true),
            auto_create_categories: parsed_env("AUTO_CREATE_CATEGORIES", true),
            collector_max_items: parsed_env("COLLECTOR_MAX_ITEMS", 500),
            collector_max_iterations: parsed_env("COLLECTOR_MAX_ITERATIONS", 30),
            collector_poll_interval_ms: parsed_env("COLLECTOR_POLL_INTERVAL_MS", 500),
            collector_change_timeout_secs: parsed_env("COLLECTOR_CHANGE_TIMEOUT_SECS", 10),
        }
    }

    /// Log the non-secret fields at startup. The database URL carries
    /// credentials and is never logged.
    pub fn log_redacted(&self) {
        info!(
            resolution_cache_ttl_secs = self.resolution_cache_ttl_secs,
            auto_create_brands = self.auto_create_brands,
            auto_create_categories = self.auto_create_categories,
            collector_max_items = self.collector_max_items,
            collector_max_iterations = self.collector_max_iterations,
            collector_poll_interval_ms = self.collector_poll_interval_ms,
            collector_change_timeout_secs = self.collector_change_timeout_secs,
            "Config loaded (database_url redacted)"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

/// Optional var with a default; panics if present but unparseable.
fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
