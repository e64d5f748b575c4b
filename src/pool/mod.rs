mod adapter;
mod postgres;

pub use adapter::{AdapterError, PoolAdapter};
pub use postgres::PgPoolAdapter;
