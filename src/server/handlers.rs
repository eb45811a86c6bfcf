//! HTTP endpoint handlers for the key-value API

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::error;

use crate::cache::ShardedCache;
use crate::error::{Error, StoreError};
use crate::pool::ConnectionPool;
use crate::store::{KeyValueStore, SqliteStore};
use crate::types::{Key, ServerStats};

/// Shared application state: the lookaside cache, the connection pool, and
/// the request counters
pub struct AppState {
    pub cache: ShardedCache<Key, String>,
    pub pool: ConnectionPool<SqliteStore>,
    pub stats: ServerStats,
}

impl AppState {
    /// Bundle a cache and pool with fresh counters
    pub fn new(cache: ShardedCache<Key, String>, pool: ConnectionPool<SqliteStore>) -> Self {
        Self {
            cache,
            pool,
            stats: ServerStats::new(),
        }
    }
}

/// Build the application router: the status route plus the three key
/// operations on the current and legacy paths
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/:key", get(get_key).put(put_key).delete(delete_key))
        .route("/key/:key", get(get_key).put(put_key).delete(delete_key))
        .with_state(state)
}

/// Accept exactly the `\d+` segments that fit in a [`Key`]
fn parse_key(raw: &str) -> Option<Key> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn invalid_key() -> Response {
    (
        StatusCode::BAD_REQUEST,
        "Invalid key format. Key must be an integer.",
    )
        .into_response()
}

fn store_failure(err: &Error) -> Response {
    error!(error = %err, "Store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal server error: {err}"),
    )
        .into_response()
}

/// Run one store operation on a pooled connection
///
/// The connection is acquired asynchronously, the blocking store call runs
/// off the async workers, and the scope exit inside the closure releases
/// the connection back to the pool.
async fn with_connection<T, F>(state: &AppState, op: F) -> Result<T, Error>
where
    F: FnOnce(&mut SqliteStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let mut conn = state.pool.acquire().await?;
    let result = tokio::task::spawn_blocking(move || {
        let out = op(&mut conn);
        drop(conn);
        out
    })
    .await
    .map_err(|e| Error::Internal(format!("store task failed: {e}")))?;
    result.map_err(Error::from)
}

/// Plain-text counter summary
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = format!(
        "totalGets:{}\ncacheHits:{}\n",
        state.stats.total_gets(),
        state.stats.cache_hits()
    );
    (StatusCode::OK, body)
}

/// Read a key: cache first, store on miss, populate on found
async fn get_key(State(state): State<Arc<AppState>>, Path(raw): Path<String>) -> Response {
    let Some(key) = parse_key(&raw) else {
        return invalid_key();
    };

    state.stats.record_get();

    if let Some(value) = state.cache.get(&key) {
        state.stats.record_cache_hit();
        return (StatusCode::OK, value).into_response();
    }

    match with_connection(&state, move |store| store.get(key)).await {
        Ok(Some(value)) => {
            state.cache.put(key, value.clone());
            (StatusCode::OK, value).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Key not found").into_response(),
        Err(e) => store_failure(&e),
    }
}

/// Write a key, then invalidate its cache entry
///
/// Write-invalidate, not write-through: the next read repopulates from the
/// store, which stays the single source of truth.
async fn put_key(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    body: String,
) -> Response {
    let Some(key) = parse_key(&raw) else {
        return invalid_key();
    };

    match with_connection(&state, move |store| store.upsert(key, &body)).await {
        Ok(()) => {
            state.cache.remove(&key);
            (StatusCode::OK, "Updated").into_response()
        }
        Err(e) => store_failure(&e),
    }
}

/// Delete a key, then invalidate its cache entry
async fn delete_key(State(state): State<Arc<AppState>>, Path(raw): Path<String>) -> Response {
    let Some(key) = parse_key(&raw) else {
        return invalid_key();
    };

    match with_connection(&state, move |store| store.delete(key)).await {
        Ok(()) => {
            state.cache.remove(&key);
            (StatusCode::OK, "Deleted").into_response()
        }
        Err(e) => store_failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("0"), Some(0));
        assert_eq!(parse_key("42"), Some(42));
        assert_eq!(parse_key("1000000000"), Some(1_000_000_000));

        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("abc"), None);
        assert_eq!(parse_key("12abc"), None);
        assert_eq!(parse_key("-5"), None);
        assert_eq!(parse_key("4.2"), None);
        // Larger than i32
        assert_eq!(parse_key("99999999999"), None);
    }
}
