//! Core types and pipeline stages for the SOC occupation importer.
//!
//! This crate is deliberately free of database and file-format dependencies.
//! Raw rows go in, normalized and consolidated records come out; persistence
//! is reached only through the [`store::OccupationStore`] trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod code;
pub mod consolidate;
pub mod error;
pub mod hierarchy;
pub mod occupation;
pub mod pipeline;
pub mod search;
pub mod sector;
pub mod store;

pub use code::{OccupationCode, normalize};
pub use error::{Error, ImportError, Result, RowFailure};
