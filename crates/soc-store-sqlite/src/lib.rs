//! SQLite backend for the SOC occupation store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! connection thread without blocking the async runtime. Full-text search
//! uses an FTS5 table maintained by the writer in the same transaction as
//! the data it indexes.

mod encode;
mod schema;
mod store;
mod writer;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
