//! Bounded Connection Pool
//!
//! A generic pool of reusable resources (database connections, in practice):
//!
//! - `acquire()` waits until an idle resource is available or the pool may
//!   create a new one through the caller-supplied factory
//! - `PooledConnection` is a scoped handle: dropping it returns the resource
//!   to the pool and wakes exactly one waiter, oldest first
//!
//! Admission is bounded by a FIFO semaphore holding `max_size` permits, so
//! in-use plus idle resources never exceed `max_size`. The factory runs
//! outside the idle-queue lock; when it fails, the permit is returned
//! (waking the next waiter) and the error propagates to the caller.
//!
//! Resources handed back in a broken state are not detected here; a dead
//! connection surfaces as an error on its next use, and recycling it is the
//! adapter's concern.
//!
//! # Example
//!
//! ```rust,ignore
//! let pool = ConnectionPool::new(4, move || SqliteStore::open(&path).map_err(Into::into))?;
//! let mut conn = pool.acquire().await?;
//! conn.upsert(1, "value-1")?;
//! // conn drops here and returns to the pool
//! ```

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Error, PoolError, Result};

type Factory<R> = dyn Fn() -> Result<R> + Send + Sync;

struct PoolInner<R> {
    max_size: usize,
    /// Idle resources, reused oldest first
    idle: Mutex<VecDeque<R>>,
    /// Resources ever constructed; only grows, bounded by `max_size`
    total_created: AtomicUsize,
    /// One permit per allowed resource, FIFO-fair
    permits: Arc<Semaphore>,
    factory: Box<Factory<R>>,
}

/// A thread-safe, bounded, lazily-filled resource pool
///
/// Cloning is cheap and yields another handle to the same pool.
pub struct ConnectionPool<R> {
    inner: Arc<PoolInner<R>>,
}

impl<R> Clone for ConnectionPool<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Send + 'static> ConnectionPool<R> {
    /// Create a pool that will hold at most `max_size` resources,
    /// constructed on demand by `factory`
    pub fn new<F>(max_size: usize, factory: F) -> Result<Self>
    where
        F: Fn() -> Result<R> + Send + Sync + 'static,
    {
        if max_size == 0 {
            return Err(PoolError::ZeroMaxSize.into());
        }
        Ok(Self {
            inner: Arc::new(PoolInner {
                max_size,
                idle: Mutex::new(VecDeque::with_capacity(max_size)),
                total_created: AtomicUsize::new(0),
                permits: Arc::new(Semaphore::new(max_size)),
                factory: Box::new(factory),
            }),
        })
    }

    /// Acquire a resource, waiting when the pool is at capacity with nothing
    /// idle
    ///
    /// Waiters are admitted in arrival order as permits free up. A factory
    /// failure releases the waiter's slot and propagates the error.
    pub async fn acquire(&self) -> Result<PooledConnection<R>> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::from(PoolError::Closed))?;

        if let Some(resource) = self.inner.idle.lock().pop_front() {
            return Ok(PooledConnection::new(
                resource,
                Arc::clone(&self.inner),
                permit,
            ));
        }

        // Holding a permit with nothing idle means we are entitled to
        // construct. The factory may do real I/O, so no lock is held here.
        match (self.inner.factory)() {
            Ok(resource) => {
                self.inner.total_created.fetch_add(1, Ordering::Relaxed);
                Ok(PooledConnection::new(
                    resource,
                    Arc::clone(&self.inner),
                    permit,
                ))
            }
            Err(e) => {
                // Returning the permit wakes the next waiter, which may
                // retry construction itself.
                drop(permit);
                Err(e)
            }
        }
    }

    /// Number of currently idle resources
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// Number of resources ever constructed (idle + in use)
    pub fn total_count(&self) -> usize {
        self.inner.total_created.load(Ordering::Relaxed)
    }

    /// Configured upper bound on live resources
    pub fn max_size(&self) -> usize {
        self.inner.max_size
    }
}

/// Scoped, exclusive handle to a pooled resource
///
/// Dereferences to the resource. Dropping the handle re-enqueues the
/// resource and releases the admission permit, waking one waiter. The type
/// is move-only; a moved-from handle no longer exists, so a resource can
/// never be released twice.
pub struct PooledConnection<R> {
    resource: Option<R>,
    pool: Arc<PoolInner<R>>,
    _permit: Option<OwnedSemaphorePermit>,
}

impl<R> PooledConnection<R> {
    fn new(resource: R, pool: Arc<PoolInner<R>>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            resource: Some(resource),
            pool,
            _permit: Some(permit),
        }
    }
}

impl<R> Deref for PooledConnection<R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.resource
            .as_ref()
            .expect("pooled resource present until drop")
    }
}

impl<R> DerefMut for PooledConnection<R> {
    fn deref_mut(&mut self) -> &mut R {
        self.resource
            .as_mut()
            .expect("pooled resource present until drop")
    }
}

impl<R> Drop for PooledConnection<R> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.idle.lock().push_back(resource);
        }
        // The permit field drops after this body, waking one FIFO waiter
        // only after the resource is back in the idle queue.
    }
}
