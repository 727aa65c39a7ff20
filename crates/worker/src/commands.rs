//! Client command channel message types.
//!
//! The foreground page talks to the worker with small JSON command
//! objects; each command is consumed exactly once and answered at most
//! once. An unrecognized command is ignored with no reply and no error,
//! a deliberate permissive default carried over from the original
//! protocol.

use serde::{Deserialize, Serialize};

/// Commands accepted over the message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Command {
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "getVersionInfo")]
    GetVersionInfo,
    #[serde(rename = "clearCache")]
    ClearCache,
    #[serde(rename = "clearCacheTiles")]
    ClearCacheTiles,
    #[serde(rename = "clearCacheCode")]
    ClearCacheCode,
}

impl Command {
    /// Parse a raw message, returning None for anything unrecognized.
    pub fn parse(message: &serde_json::Value) -> Option<Command> {
        serde_json::from_value(message.clone()).ok()
    }
}

/// Reply payload kinds, serialized into the `command` field of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Pong,
    VersionInfo,
    CacheCleared,
}

/// A reply sent back over the message channel's reply port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub version: String,
    pub command: ReplyKind,
}

impl Reply {
    pub fn new(version: &str, command: ReplyKind) -> Self {
        Self { version: version.to_string(), command }
    }
}
