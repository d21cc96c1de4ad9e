//! Storage abstraction and implementations for RepForge.
//!
//! This crate provides the persistence facade used by the session and
//! progression engines, with in-memory, JSON-file and SQLite backends.

#![warn(missing_docs)]

pub mod trait_;
pub mod history;
pub mod memory_storage;
pub mod json_storage;
#[cfg(feature = "sqlite")]
pub mod sqlite_storage;

pub use trait_::{Storage, StorageError, Result};
pub use memory_storage::MemoryStorage;
pub use json_storage::JsonStorage;
#[cfg(feature = "sqlite")]
pub use sqlite_storage::SqliteStorage;
