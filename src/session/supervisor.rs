use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::health::HealthMonitor;
use crate::pool::{AdapterError, PoolAdapter};

use super::SessionInner;

/// Drive one session until shutdown: open a pool, watch it, replace it
/// when it dies. Every lifecycle transition except the one made by
/// `Session::close` happens here.
pub(crate) async fn run<A: PoolAdapter>(inner: Arc<SessionInner<A>>) {
    let mut attempt: u32 = 0;

    loop {
        if inner.shutdown.is_cancelled() {
            break;
        }

        // Empty the slot before dialing; the returned handle (if any) is
        // the dead pool from the previous cycle and drops here.
        inner.state.write().mark_connecting();

        attempt += 1;
        info!(attempt, "Attempting to connect");

        // Biased so a shutdown that lands mid-cycle is seen before the
        // dial starts, and an in-flight dial is dropped where it stands.
        let outcome = tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => break,
            outcome = connect(&inner) => outcome,
        };

        let (pool, death) = match outcome {
            Ok(started) => started,
            Err(e) => {
                warn!(attempt, error = %e, "Connect attempt failed");
                tokio::select! {
                    _ = inner.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(inner.retry.reconnect_delay()) => continue,
                }
            }
        };

        if !inner.state.write().mark_ready(pool) {
            // Shutdown won the race against this attempt; the handle was
            // never published and drops unused.
            break;
        }
        info!(attempt, "Connected");
        attempt = 0;

        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            notice = death => {
                if notice.is_ok() {
                    info!("Connection lost, reconnecting");
                }
                // A dropped sender means the monitor was cancelled; the
                // next loop iteration exits on the shutdown check.
            }
        }
    }

    info!("Supervisor stopped");
}

/// One connect attempt: fresh pool, initial ping, then a monitor bound to
/// the new handle. The receiver resolves when that monitor sees death.
async fn connect<A: PoolAdapter>(
    inner: &Arc<SessionInner<A>>,
) -> Result<(Arc<A::Pool>, oneshot::Receiver<()>), AdapterError> {
    let pool = Arc::new(inner.adapter.open().await?);

    // No monitor watches this pool yet, so the first ping is bounded by
    // the check timeout here; an unanswered ping fails the attempt.
    match tokio::time::timeout(inner.health.check_timeout(), inner.adapter.ping(&pool)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(AdapterError::Ping(format!(
                "timed out after {}ms",
                inner.health.check_timeout_ms
            )));
        }
    }

    let (notify, death) = oneshot::channel();
    HealthMonitor::new(
        inner.adapter.clone(),
        pool.clone(),
        inner.health.clone(),
        inner.shutdown.clone(),
    )
    .spawn(notify);

    Ok((pool, death))
}
