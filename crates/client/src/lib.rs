//! Network client for the offline map cache.
//!
//! This crate provides the HTTP fetch pipeline used to fill cache misses
//! and to refresh cached entries in the background.

pub mod fetch;

pub use fetch::{FetchConfig, FetchedResource, Fetcher, HttpFetcher};
pub use fetch::url::{UrlError, canonicalize};
