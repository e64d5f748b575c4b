use async_trait::async_trait;
use thiserror::Error;

/// Error raised by a pool adapter primitive.
///
/// Adapter errors never reach session callers directly; the supervisor and
/// the acquisition retry loop absorb them and surface only as latency.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Ping failed: {0}")]
    Ping(String),

    #[error("Acquire failed: {0}")]
    Acquire(String),
}

/// Driver seam between the session and a concrete pool implementation.
///
/// A session keeps one adapter for its whole lifetime and calls it from the
/// supervisor, the health monitor, and the acquisition path concurrently.
/// The pool handle is opaque to the session; it is replaced wholesale on
/// every reconnect.
#[async_trait]
pub trait PoolAdapter: Send + Sync + 'static {
    /// Pool handle produced by [`PoolAdapter::open`].
    type Pool: Send + Sync + 'static;
    /// Connection borrowed from a pool, handed out to callers.
    type Connection: Send + 'static;

    /// Open a fresh pool. Every call must produce an independent handle;
    /// an unreachable server must fail here rather than on first borrow.
    async fn open(&self) -> Result<Self::Pool, AdapterError>;

    /// Liveness probe against an open pool.
    async fn ping(&self, pool: &Self::Pool) -> Result<(), AdapterError>;

    /// Borrow a connection from the pool.
    async fn acquire(&self, pool: &Self::Pool) -> Result<Self::Connection, AdapterError>;

    /// Gracefully close the pool.
    async fn close(&self, pool: &Self::Pool);
}
