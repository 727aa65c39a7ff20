//! Cache-first fetch interception strategy.
//!
//! Every intercepted request resolves to either CacheHit (serve the
//! stored entry, no network) or CacheMiss (fetch, store, return). A
//! network failure on a miss propagates to the caller; no offline
//! fallback response is synthesized.

use mapcache_core::{CacheDb, CachedEntry, Error, GenerationHandle};
use mapcache_client::{FetchedResource, Fetcher};
use url::Url;

/// Build a storable entry from a fetched resource.
///
/// The entry is keyed by the requested (canonical) URL, not the
/// post-redirect URL, so later lookups for the same request hit.
pub fn entry_from_resource(method: &str, requested_url: &Url, resource: &FetchedResource) -> CachedEntry {
    CachedEntry {
        method: method.to_ascii_uppercase(),
        url: requested_url.to_string(),
        status: resource.status.as_u16(),
        content_type: resource.content_type.clone(),
        headers_json: resource.headers_json(),
        body: resource.bytes.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Serve a request cache-first from the given generation.
///
/// Two concurrent misses for the same URL may both fetch and both
/// store; last write wins and no deduplication is attempted.
pub async fn cache_first<F: Fetcher>(
    db: &CacheDb, generation: &GenerationHandle, fetcher: &F, method: &str, url: &Url,
) -> Result<CachedEntry, Error> {
    if let Some(hit) = db.get_entry(generation, method, url.as_str()).await? {
        tracing::debug!(url = %url, "cache hit");
        return Ok(hit);
    }

    tracing::debug!(url = %url, "cache miss, fetching");
    let resource = fetcher.fetch(url).await?;
    let entry = entry_from_resource(method, url, &resource);
    db.put_entry(generation, &entry).await?;

    Ok(entry)
}
