//! Liveness monitoring for the session's pool handle.
//!
//! One monitor task runs per open pool. It probes on a fixed interval,
//! reports death to the supervisor at most once, and then exits; recovery
//! is entirely the supervisor's job.

mod monitor;

pub(crate) use monitor::HealthMonitor;
