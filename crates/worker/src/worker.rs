//! The long-lived cache worker service.
//!
//! One `CacheWorker` is constructed per process with explicit
//! `activate`, `handle_fetch`, and `handle_message` handler methods, so
//! each event kind can be driven directly with synthetic events.

use std::sync::Arc;

use mapcache_core::{CacheDb, CachedEntry, Error, GenerationHandle, ResourceCategory, WorkerConfig};
use mapcache_client::{Fetcher, canonicalize};
use tokio::task::JoinHandle;

use crate::commands::{Command, Reply, ReplyKind};
use crate::{lifecycle, strategy};

/// The offline cache worker.
///
/// Owns the command dispatch for its lifetime; the cache store itself
/// outlives the worker and is reached only through `CacheDb`.
pub struct CacheWorker<F> {
    config: WorkerConfig,
    db: CacheDb,
    fetcher: Arc<F>,
}

impl<F: Fetcher + 'static> CacheWorker<F> {
    pub fn new(config: WorkerConfig, db: CacheDb, fetcher: Arc<F>) -> Self {
        Self { config, db, fetcher }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Open the current generation, creating it if absent.
    ///
    /// Opened per event, mirroring how every fetch re-opens the named
    /// cache: after a `clearCache` the next event recreates it.
    async fn current_generation(&self) -> Result<GenerationHandle, Error> {
        self.db.open_generation(&self.config.cache_name()).await
    }

    /// Activation handler.
    ///
    /// Prunes stale generations to completion before returning, so no
    /// fetch is handled while superseded generations linger. When
    /// configured, the background refresh task is spawned afterwards
    /// and deliberately not awaited; the returned handle is for callers
    /// that want to observe its completion.
    pub async fn activate(&self) -> Result<Option<JoinHandle<()>>, Error> {
        lifecycle::prune(&self.db, &self.config).await?;
        let generation = self.current_generation().await?;

        if !self.config.refresh_on_activate {
            return Ok(None);
        }

        let db = self.db.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let task = tokio::spawn(async move {
            lifecycle::refresh(&db, &generation, fetcher.as_ref()).await;
        });
        Ok(Some(task))
    }

    /// Fetch interception handler: cache-first with network fallback.
    ///
    /// The requested URL is canonicalized before lookup so differently
    /// spelled requests for the same resource share one entry. A
    /// network failure on a miss propagates to the caller as a failed
    /// resource load; no offline fallback is synthesized.
    pub async fn handle_fetch(&self, method: &str, url: &str) -> Result<CachedEntry, Error> {
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let generation = self.current_generation().await?;
        strategy::cache_first(&self.db, &generation, self.fetcher.as_ref(), method, &url).await
    }

    /// Message handler: dispatch one command, reply at most once.
    ///
    /// Unrecognized or malformed commands are ignored without a reply
    /// or an error; store failures while executing a recognized command
    /// propagate.
    pub async fn handle_message(&self, message: &serde_json::Value) -> Result<Option<Reply>, Error> {
        let Some(command) = Command::parse(message) else {
            tracing::debug!(%message, "ignoring unrecognized command");
            return Ok(None);
        };

        let reply = match command {
            Command::Ping => Reply::new(self.version(), ReplyKind::Pong),
            Command::GetVersionInfo => Reply::new(self.version(), ReplyKind::VersionInfo),
            Command::ClearCache => {
                self.db.delete_generation(&self.config.cache_name()).await?;
                Reply::new(self.version(), ReplyKind::CacheCleared)
            }
            Command::ClearCacheTiles => {
                self.purge(ResourceCategory::Tile).await?;
                Reply::new(self.version(), ReplyKind::CacheCleared)
            }
            Command::ClearCacheCode => {
                self.purge(ResourceCategory::Code).await?;
                Reply::new(self.version(), ReplyKind::CacheCleared)
            }
        };
        Ok(Some(reply))
    }

    /// Handle one raw line from the command transport.
    ///
    /// Returns the serialized reply, if any. Malformed lines are
    /// ignored and a store failure while executing a command is logged
    /// and answered with nothing; neither ends the command loop. Only
    /// an activation-time store failure is fatal to the worker.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let message: serde_json::Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed command line");
                return None;
            }
        };

        match self.handle_message(&message).await {
            Ok(reply) => reply.and_then(|r| serde_json::to_string(&r).ok()),
            Err(e) => {
                tracing::warn!(error = %e, "command failed");
                None
            }
        }
    }

    async fn purge(&self, category: ResourceCategory) -> Result<u64, Error> {
        let generation = self.current_generation().await?;
        lifecycle::purge_category(&self.db, &generation, &self.config, category).await
    }
}
