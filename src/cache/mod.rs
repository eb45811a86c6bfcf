//! Sharded LRU Cache Module
//!
//! The lookaside cache that absorbs the server's read load:
//!
//! - **`CacheShard`**: a bounded LRU over a key-linked recency list (`shard.rs`)
//! - **`ShardedCache`**: per-shard locking over disjoint key subsets (`sharded.rs`)
//!
//! # Architecture
//!
//! ```text
//!                 hash(key) % shard_count
//!                          │
//!        ┌─────────────────┼─────────────────┐
//!        ▼                 ▼                 ▼
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │  Shard 0    │   │  Shard 1    │   │  Shard N-1  │
//! │  Mutex      │   │  Mutex      │   │  Mutex      │
//! │  LRU list   │   │  LRU list   │   │  LRU list   │
//! └─────────────┘   └─────────────┘   └─────────────┘
//! ```
//!
//! The cache is lookaside: the request handler consults it before the
//! backing store and populates it on a miss. Writes invalidate (remove)
//! rather than update, so a later read reloads from the store.

mod shard;
mod sharded;

pub use sharded::{CacheStats, ShardedCache};
