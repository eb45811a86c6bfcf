//! Cachefront: a cache-fronted key-value service with a closed-loop load
//! generator
//!
//! The server exposes `GET`/`PUT`/`DELETE` on integer keys over HTTP/1.1,
//! fronted by a sharded in-memory LRU cache and backed by a single-table
//! relational store reached through a bounded connection pool. Reads are
//! read-through (populate on miss); writes invalidate the cached entry so
//! the store stays the source of truth.
//!
//! # Components
//!
//! - [`cache`]: sharded LRU with per-shard locking
//! - [`pool`]: bounded, lazily-filled connection pool with scoped handles
//! - [`store`]: the three-operation store contract and its SQLite adapter
//! - [`server`]: axum routing and the read-through / write-invalidate path
//! - [`workload`]: the four parameterized request generators
//! - [`sysmon`]: host CPU and disk sampling during load runs
//! - [`report`]: per-run result records and the results file
//!
//! # Data flow
//!
//! ```text
//! read:  client → handler → cache (hit → respond)
//!                          └─ miss → pool → store → cache → respond
//! write: client → handler → pool → store → cache.remove → respond
//! ```

pub mod cache;
pub mod error;
pub mod pool;
pub mod report;
pub mod server;
pub mod store;
pub mod sysmon;
pub mod types;
pub mod workload;

pub use error::{Error, Result};
