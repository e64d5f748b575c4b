//! Resilient session keeper for a pooled Postgres connection.
//!
//! A [`Session`] owns one logical database target. A background supervisor
//! opens the connection pool, a per-pool monitor pings it on an interval,
//! and whenever the pool dies the supervisor replaces it with a fresh one.
//! Callers borrow connections through [`Session::acquire`] and experience
//! outages as waiting, not as errors; the only error they ever see is the
//! one raised once [`Session::close`] has been called.
//!
//! ```rust,no_run
//! use argus::Session;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = argus::load_config("argus.toml")?;
//! let session = Session::new(&config);
//!
//! let conn = session.acquire().await?;
//! // run queries on `conn`; it returns to the pool on drop
//! # Ok(())
//! # }
//! ```

pub mod config;
mod health;
mod pool;
mod session;

pub use config::{
    load_config, Config, ConfigError, DatabaseConfig, HealthCheckConfig, RetryConfig,
};
pub use pool::{AdapterError, PgPoolAdapter, PoolAdapter};
pub use session::{Session, SessionError};
