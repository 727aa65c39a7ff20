//! Cache lifecycle management: activation pruning, background refresh,
//! and selective purge.

use mapcache_core::{CacheDb, Error, GenerationHandle, ResourceCategory, WorkerConfig};
use mapcache_client::Fetcher;
use url::Url;

use crate::strategy::entry_from_resource;

/// Delete every generation that is not the current one.
///
/// A generation is stale if its name appears in the configured stale
/// list or simply differs from the current generation name. Deleting a
/// missing generation is a no-op. Per-generation failures are logged
/// and skipped so one bad row does not abort activation.
///
/// Returns the names that were actually removed.
pub async fn prune(db: &CacheDb, config: &WorkerConfig) -> Result<Vec<String>, Error> {
    let current = config.cache_name();

    let mut removed = Vec::new();
    for name in db.list_generations().await? {
        if name == current {
            continue;
        }
        match db.delete_generation(&name).await {
            Ok(true) => {
                tracing::info!(generation = %name, "pruned stale cache generation");
                removed.push(name);
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(generation = %name, error = %e, "failed to prune generation");
            }
        }
    }
    Ok(removed)
}

/// Re-fetch every entry currently stored in the generation.
///
/// Each entry is refreshed independently: a failed re-fetch is logged
/// and swallowed, never retried, and does not stop the rest of the
/// batch. Entries whose URL no longer parses are skipped the same way.
pub async fn refresh<F: Fetcher>(db: &CacheDb, generation: &GenerationHandle, fetcher: &F) {
    let keys = match db.keys(generation).await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::warn!(error = %e, "background refresh could not enumerate cache keys");
            return;
        }
    };

    tracing::info!(entries = keys.len(), "background refresh started");

    let mut refreshed = 0usize;
    for request in keys {
        let url = match Url::parse(&request.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "skipping unparseable cached URL");
                continue;
            }
        };

        match fetcher.fetch(&url).await {
            Ok(resource) => {
                let entry = entry_from_resource(&request.method, &url, &resource);
                if let Err(e) = db.put_entry(generation, &entry).await {
                    tracing::warn!(url = %url, error = %e, "failed to store refreshed entry");
                } else {
                    refreshed += 1;
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to refresh entry");
            }
        }
    }

    tracing::info!(refreshed, "background refresh finished");
}

/// Delete every entry in the generation whose URL classifies into the
/// given category. Unclassified entries are untouched.
///
/// Returns the number of entries removed.
pub async fn purge_category(
    db: &CacheDb, generation: &GenerationHandle, config: &WorkerConfig, category: ResourceCategory,
) -> Result<u64, Error> {
    let mut deleted = 0u64;
    for request in db.keys(generation).await? {
        if config.categories.classify(&request.url) == Some(category)
            && db.delete_entry(generation, &request.method, &request.url).await?
        {
            deleted += 1;
        }
    }
    tracing::info!(?category, deleted, "selective purge complete");
    Ok(deleted)
}
