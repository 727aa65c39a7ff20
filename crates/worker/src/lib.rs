//! The offline cache worker: lifecycle management, cache-first fetch
//! interception, and the client command channel.
//!
//! The binary in `main.rs` wires this to a stdio command transport; the
//! library surface lets tests drive each handler with synthetic events.

pub mod commands;
pub mod lifecycle;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod mock;

pub use commands::{Command, Reply, ReplyKind};
pub use worker::CacheWorker;
