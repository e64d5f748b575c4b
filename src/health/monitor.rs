use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::HealthCheckConfig;
use crate::pool::PoolAdapter;

/// Periodic liveness prober bound to one pool handle.
pub(crate) struct HealthMonitor<A: PoolAdapter> {
    adapter: Arc<A>,
    pool: Arc<A::Pool>,
    config: HealthCheckConfig,
    shutdown: CancellationToken,
}

impl<A: PoolAdapter> HealthMonitor<A> {
    pub(crate) fn new(
        adapter: Arc<A>,
        pool: Arc<A::Pool>,
        config: HealthCheckConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            adapter,
            pool,
            config,
            shutdown,
        }
    }

    /// Spawn the probe task. On the first failed or timed-out probe it
    /// sends one unit on `notify` and exits; on shutdown it exits silently.
    pub(crate) fn spawn(self, notify: oneshot::Sender<()>) -> JoinHandle<()> {
        let check_interval = self.config.check_interval();
        let check_timeout = self.config.check_timeout();

        tokio::spawn(async move {
            // The connect path pinged this pool just before spawning us,
            // so the first probe is due one full interval out.
            let mut ticker = interval_at(Instant::now() + check_interval, check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        debug!("Health monitor cancelled");
                        return;
                    }
                    _ = ticker.tick() => {
                        match tokio::time::timeout(check_timeout, self.adapter.ping(&self.pool)).await {
                            Ok(Ok(())) => {
                                debug!("Health check passed");
                            }
                            Ok(Err(e)) => {
                                warn!(error = %e, "Health check failed");
                                // Fails silently if the supervisor has
                                // already moved past this pool.
                                let _ = notify.send(());
                                return;
                            }
                            Err(_) => {
                                warn!(
                                    timeout_ms = self.config.check_timeout_ms,
                                    "Health check timed out"
                                );
                                let _ = notify.send(());
                                return;
                            }
                        }
                    }
                }
            }
        })
    }
}
