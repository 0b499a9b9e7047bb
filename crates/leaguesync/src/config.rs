use std::{env, time::Duration};

use leaguesync_core::record::Season;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Season every record and cache key is scoped to (default: "2425")
    pub season: String,
    /// Path to SQLite database file (default: "leaguesync.db")
    pub sqlite_path: String,
    /// Redis connection URL. When unset, the in-process LRU cache is used.
    pub redis_url: Option<String>,
    /// Base URL of the upstream fantasy API
    pub upstream_base_url: String,
    /// Cache TTL in seconds (default: 300)
    pub cache_ttl_seconds: u64,
    /// Maximum number of cache entries for the in-process cache
    /// (default: 10,000)
    pub cache_max_entries: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SEASON` - Season identifier (default: "2425")
    /// - `SQLITE_PATH` - SQLite database path (default: "leaguesync.db")
    /// - `REDIS_URL` - Redis connection URL (optional; in-process cache when unset)
    /// - `UPSTREAM_BASE_URL` - Upstream API base URL
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Maximum in-process cache entries (default: 10,000)
    pub fn from_env() -> Self {
        Self {
            season: env::var("SEASON").unwrap_or_else(|_| "2425".to_string()),
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "leaguesync.db".to_string()),
            redis_url: env::var("REDIS_URL").ok(),
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .unwrap_or_else(|_| "https://fantasy.premierleague.com/api/".to_string()),
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Get the season as the typed identifier.
    pub fn season(&self) -> Season {
        Season::new(self.season.clone())
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}
