//! Key-value server binary
//!
//! Usage: `server <port> <db_path> <threads>`
//!
//! Binds 0.0.0.0:`port`, runs `threads` runtime workers, and sizes the
//! connection pool to match. The cache dimensions have sensible defaults
//! and can be overridden with flags.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use cachefront::cache::ShardedCache;
use cachefront::error::{Error, Result};
use cachefront::pool::ConnectionPool;
use cachefront::server::{router, AppState, ServerConfig};
use cachefront::store::SqliteStore;

#[derive(Debug, Parser)]
#[command(name = "server", about = "Cache-fronted key-value server")]
struct Cli {
    /// Port to listen on
    port: u16,

    /// Path to the SQLite database file
    db_path: PathBuf,

    /// Worker threads (also the connection pool size)
    threads: usize,

    /// Total cache capacity in entries
    #[arg(long, default_value_t = 1024)]
    cache_capacity: usize,

    /// Number of cache shards
    #[arg(long, default_value_t = 32)]
    cache_shards: usize,

    /// Drop and recreate the key_value table on startup
    #[arg(long)]
    reset: bool,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            exit(1);
        }
    };
    if cli.threads == 0 {
        error!("Thread count must be greater than 0");
        exit(1);
    }

    let config = ServerConfig {
        port: cli.port,
        db_path: cli.db_path,
        threads: cli.threads,
        cache_capacity: cli.cache_capacity,
        cache_shards: cli.cache_shards,
        reset: cli.reset,
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.threads)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to build runtime");
            exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!(error = %e, "Server failed");
        exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<()> {
    let bootstrap = SqliteStore::open(&config.db_path)?;
    if config.reset {
        bootstrap.reset()?;
        info!("key_value table dropped and recreated");
    } else {
        bootstrap.bootstrap()?;
    }
    drop(bootstrap);

    let db_path = config.db_path.clone();
    let pool = ConnectionPool::new(config.threads, move || {
        SqliteStore::open(&db_path).map_err(Into::into)
    })?;
    let cache = ShardedCache::new(config.cache_capacity, config.cache_shards)?;
    let state = Arc::new(AppState::new(cache, pool));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        %addr,
        threads = config.threads,
        cache_capacity = config.cache_capacity,
        cache_shards = config.cache_shards,
        db_path = %config.db_path.display(),
        "Key-value server listening"
    );

    axum::Server::bind(&addr)
        .tcp_nodelay(true)
        .serve(router(Arc::clone(&state)).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    let cache_stats = state.cache.stats();
    info!(
        total_gets = state.stats.total_gets(),
        cache_hits = state.stats.cache_hits(),
        cached_entries = state.cache.len(),
        cache_hit_rate = cache_stats.hit_rate(),
        cache_evictions = cache_stats.evictions,
        pool_idle = state.pool.idle_count(),
        pool_total = state.pool.total_count(),
        "Server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
