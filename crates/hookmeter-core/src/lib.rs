//! Core types and logic for the Hookmeter match tracker.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! implement [`store::MatchStore`]; the aggregation engine, insight generator,
//! entry wizard and JSON transfer all work against that trait.

pub mod catalog;
pub mod error;
pub mod insights;
pub mod record;
pub mod stats;
pub mod store;
pub mod transfer;
pub mod wizard;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
