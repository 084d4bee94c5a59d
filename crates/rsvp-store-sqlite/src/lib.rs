//! SQLite backend for the RSVP system.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every statement goes through that one
//! connection, and every unique key in the schema is a real constraint, so
//! concurrent inserts for the same key cannot both succeed.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
