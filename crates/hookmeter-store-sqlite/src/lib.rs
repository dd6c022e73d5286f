//! SQLite backend for the Hookmeter match tracker.
//!
//! A single synchronous [`rusqlite::Connection`] per store; the tracker runs
//! one command per process on the main thread.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
