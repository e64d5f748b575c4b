mod state;
mod supervisor;

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, HealthCheckConfig, RetryConfig};
use crate::pool::{PgPoolAdapter, PoolAdapter};

use state::SharedState;

/// Session-level errors.
///
/// Everything transient (connect failures, dead pools, failed borrows) is
/// retried internally and never surfaces; these two are the only errors a
/// caller ever sees.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `close` found nothing to close: the session was never ready, is
    /// mid-reconnect, or has already shut down.
    #[error("already closed: not connected to the server")]
    AlreadyClosed,

    /// Shutdown has begun; returned by `acquire` instead of blocking.
    #[error("session is shutting down")]
    ShuttingDown,
}

/// Shared core of a session, owned jointly by the handle clones, the
/// supervisor task, and the health monitor tasks.
pub(crate) struct SessionInner<A: PoolAdapter> {
    pub(crate) adapter: Arc<A>,
    pub(crate) retry: RetryConfig,
    pub(crate) health: HealthCheckConfig,
    pub(crate) state: RwLock<SharedState<A::Pool>>,
    pub(crate) shutdown: CancellationToken,
}

/// Self-healing handle to one pooled database target.
///
/// A background supervisor opens the pool, watches it through a health
/// monitor, and replaces it whenever it dies. Callers borrow connections
/// through [`Session::acquire`] and see outages as latency, not errors.
///
/// Cloning is cheap; every clone shares the same supervisor and pool.
pub struct Session<A: PoolAdapter = PgPoolAdapter> {
    inner: Arc<SessionInner<A>>,
}

impl<A: PoolAdapter> Clone for Session<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Session<PgPoolAdapter> {
    /// Create a Postgres-backed session and start its supervisor.
    ///
    /// Returns immediately; the first connect happens in the background and
    /// readiness follows asynchronously. Watch [`Session::is_ready`] or
    /// just call [`Session::acquire`].
    ///
    /// # Panics
    /// Panics if the configured DSN is malformed (see [`PgPoolAdapter::new`])
    /// or when called outside a tokio runtime.
    pub fn new(config: &Config) -> Self {
        Self::with_adapter(
            PgPoolAdapter::new(config.database.clone()),
            config.retry.clone(),
            config.health.clone(),
        )
    }
}

impl<A: PoolAdapter> Session<A> {
    /// Create a session over any [`PoolAdapter`] and start its supervisor.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn with_adapter(adapter: A, retry: RetryConfig, health: HealthCheckConfig) -> Self {
        let inner = Arc::new(SessionInner {
            adapter: Arc::new(adapter),
            retry,
            health,
            state: RwLock::new(SharedState::new()),
            shutdown: CancellationToken::new(),
        });

        info!("Starting connection supervisor");
        tokio::spawn(supervisor::run(inner.clone()));

        Self { inner }
    }

    /// Whether a live, health-checked pool is currently available.
    pub fn is_ready(&self) -> bool {
        self.inner.state.read().is_ready()
    }

    /// Borrow a connection, waiting out any reconnect in progress.
    ///
    /// While the session is not ready, or a borrow fails, this retries on
    /// the configured delay. The only error it returns is
    /// [`SessionError::ShuttingDown`], and it returns that promptly even to
    /// callers already parked on the timer.
    pub async fn acquire(&self) -> Result<A::Connection, SessionError> {
        loop {
            if self.inner.shutdown.is_cancelled() {
                return Err(SessionError::ShuttingDown);
            }

            // Snapshot under the read lock; never held across an await.
            let pool = self.inner.state.read().live_pool();
            if let Some(pool) = pool {
                match self.inner.adapter.acquire(&pool).await {
                    Ok(conn) => return Ok(conn),
                    Err(e) => warn!(error = %e, "Acquire failed, retrying"),
                }
            }

            tokio::select! {
                _ = self.inner.shutdown.cancelled() => {
                    return Err(SessionError::ShuttingDown);
                }
                _ = tokio::time::sleep(self.inner.retry.reconnect_delay()) => {}
            }
        }
    }

    /// Shut the session down and release the live pool.
    ///
    /// Only a ready session can be closed: during an outage, before the
    /// first connect, or after a previous close this returns
    /// [`SessionError::AlreadyClosed`] and changes nothing.
    pub async fn close(&self) -> Result<(), SessionError> {
        info!("Stopping session");

        let pool = {
            let mut state = self.inner.state.write();
            if !state.is_ready() {
                return Err(SessionError::AlreadyClosed);
            }
            state.mark_closed()
        };

        // Cancel first so parked acquire callers and the supervisor wake
        // before the pool drain starts.
        self.inner.shutdown.cancel();

        if let Some(pool) = pool {
            self.inner.adapter.close(&pool).await;
        }
        Ok(())
    }
}
