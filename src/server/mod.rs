//! HTTP front end for the key-value service
//!
//! Routing, shared application state, and the request handlers that stitch
//! the cache, the connection pool, and the backing store into the
//! read-through / write-invalidate path:
//!
//! - `GET /{k}`: probe the cache, fall back to the store, populate on found
//! - `PUT /{k}`: upsert the store, then invalidate the cache entry
//! - `DELETE /{k}`: delete from the store, then invalidate the cache entry
//! - `GET /`: plain-text counter summary
//!
//! The legacy `/key/{k}` paths route to the same handlers.

mod handlers;

pub use handlers::{router, AppState};

use std::path::PathBuf;

/// Server runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind on 0.0.0.0
    pub port: u16,
    /// SQLite database file backing the store
    pub db_path: PathBuf,
    /// Runtime worker threads; also the connection pool size
    pub threads: usize,
    /// Total cache capacity in entries
    pub cache_capacity: usize,
    /// Number of cache shards
    pub cache_shards: usize,
    /// Drop and recreate the key_value table on startup
    pub reset: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            db_path: PathBuf::from("kv.db"),
            threads: 10,
            cache_capacity: 1024,
            cache_shards: 32,
            reset: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.threads, 10);
        assert_eq!(config.cache_capacity, 1024);
        assert_eq!(config.cache_shards, 32);
        assert!(!config.reset);
    }
}
