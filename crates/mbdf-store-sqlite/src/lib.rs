//! SQLite backend for the MBDF election engine.
//!
//! One [`SqliteStore`] implements all three of the core's consumed
//! interfaces (`ElectionStore`, `RoomDirectory`, `AuditSink`). Wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{AuditRecord, SqliteStore};
