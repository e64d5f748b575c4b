use std::sync::Arc;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// The supervisor is trying to open a pool; no handle is live.
    Connecting,
    /// A pool handle is live and its last health check passed.
    Ready,
    /// Shutdown has been requested. Terminal: no transition leaves it.
    Closed,
}

/// Lifecycle phase plus the single live pool slot.
///
/// The slot is occupied exactly while the phase is `Ready`; every
/// transition below keeps the two in step.
#[derive(Debug)]
pub struct SharedState<P> {
    lifecycle: Lifecycle,
    pool: Option<Arc<P>>,
}

impl<P> SharedState<P> {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Connecting,
            pool: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    /// Snapshot of the live handle, `None` unless ready.
    pub fn live_pool(&self) -> Option<Arc<P>> {
        match self.lifecycle {
            Lifecycle::Ready => self.pool.clone(),
            _ => None,
        }
    }

    /// Enter the connecting phase, emptying the pool slot and returning the
    /// discarded handle. A closed session stays closed.
    pub fn mark_connecting(&mut self) -> Option<Arc<P>> {
        if self.lifecycle != Lifecycle::Closed {
            self.lifecycle = Lifecycle::Connecting;
        }
        self.pool.take()
    }

    /// Publish a fresh handle and become ready. Refused once the session is
    /// closed; the caller should drop the handle it offered.
    pub fn mark_ready(&mut self, pool: Arc<P>) -> bool {
        if self.lifecycle == Lifecycle::Closed {
            return false;
        }
        self.lifecycle = Lifecycle::Ready;
        self.pool = Some(pool);
        true
    }

    /// Enter the terminal phase, surrendering the live handle so the caller
    /// can close it gracefully.
    pub fn mark_closed(&mut self) -> Option<Arc<P>> {
        self.lifecycle = Lifecycle::Closed;
        self.pool.take()
    }
}

impl<P> Default for SharedState<P> {
    fn default() -> Self {
        Self::new()
    }
}
