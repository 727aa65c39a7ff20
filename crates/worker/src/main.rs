//! Cache worker entry point.
//!
//! Boots the offline cache worker and serves the client command channel
//! over stdio: one JSON command object per input line, one JSON reply per
//! output line. Logging goes to stderr to keep stdout clean for replies.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use mapcache_client::{FetchConfig, HttpFetcher};
use mapcache_core::{CacheDb, WorkerConfig};

use mapcache_worker::CacheWorker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load()?;
    tracing::info!(cache = %config.cache_name(), "starting cache worker");

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = HttpFetcher::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let worker = CacheWorker::new(config, db, Arc::new(fetcher));
    worker.activate().await?;

    // Bad input and failed commands are logged inside `handle_line`;
    // only losing stdin ends the loop.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(reply) = worker.handle_line(&line).await {
            println!("{reply}");
        }
    }

    Ok(())
}
