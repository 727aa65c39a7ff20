//! Core types and shared functionality for the offline map cache.
//!
//! This crate provides:
//! - Versioned cache generation store with SQLite backend
//! - Resource category classification for selective purge
//! - Unified error types
//! - Worker configuration

pub mod cache;
pub mod category;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedEntry, GenerationHandle, StoredRequest};
pub use category::{CategoryMap, ResourceCategory};
pub use config::WorkerConfig;
pub use error::Error;
