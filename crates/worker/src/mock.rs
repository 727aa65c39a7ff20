//! Counting mock fetcher for handler tests.

use async_trait::async_trait;
use bytes::Bytes;
use mapcache_core::Error;
use mapcache_client::fetch::HttpStatus;
use mapcache_client::{FetchedResource, Fetcher};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// In-memory fetcher that counts every network call and can be told to
/// fail specific URLs.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a successful response body for a URL.
    pub fn insert(&self, url: &str, body: &[u8]) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_vec());
    }

    /// Make fetches of this URL fail.
    pub fn fail(&self, url: &str) {
        self.failures.lock().unwrap().insert(url.to_string());
    }

    /// Number of fetch calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failures.lock().unwrap().contains(url.as_str()) {
            return Err(Error::HttpError(format!("mock failure for {url}")));
        }

        let body = self
            .responses
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::HttpError(format!("status 404 for {url}")))?;

        Ok(FetchedResource {
            url: url.clone(),
            status: HttpStatus::OK,
            content_type: None,
            bytes: Bytes::from(body),
            headers: BTreeMap::new(),
            fetch_ms: 0,
        })
    }
}
