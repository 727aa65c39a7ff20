//! SQLite-backed store for versioned cache generations.
//!
//! This module provides the persistent request/response cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Versioned generations, at most one of which is current
//! - Exact-match lookup by normalized request (method + URL)
//! - Whole-entry replacement on put
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CachedEntry, GenerationHandle, StoredRequest};
