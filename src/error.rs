//! Error types for the service

use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum Error {
    /// Cache construction error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Backing store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error
    #[error("{0}")]
    Internal(String),
}

/// Cache construction errors
///
/// Runtime cache operations never fail; only `ShardedCache::new` does.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Total capacity was zero
    #[error("cache capacity must be greater than 0")]
    ZeroCapacity,

    /// Shard count was zero
    #[error("shard count must be greater than 0")]
    ZeroShardCount,

    /// Capacity distribution left no shard with a usable slot
    #[error("no shard received a non-zero capacity")]
    NoUsableShards,
}

/// Connection pool errors
#[derive(Error, Debug)]
pub enum PoolError {
    /// Pool size was zero
    #[error("pool max size must be greater than 0")]
    ZeroMaxSize,

    /// The pool's admission queue was torn down
    #[error("pool has been closed")]
    Closed,
}

/// Backing store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite-level failure
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection could not be established
    #[error("connect error: {0}")]
    Connect(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
