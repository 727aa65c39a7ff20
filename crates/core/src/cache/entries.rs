//! Generation and entry CRUD operations.
//!
//! The store adapter owns the on-disk cache generations. A generation is
//! one version-tagged key/response store; entries map a normalized request
//! (method + URL) to the most recently stored response.

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to one opened cache generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationHandle {
    name: String,
}

impl GenerationHandle {
    /// The generation identifier, e.g. `kmz_viewer-cache-v1.0.1`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A normalized request stored in a generation, as returned by key
/// enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRequest {
    pub method: String,
    pub url: String,
}

/// A cached response entry.
///
/// Bodies are fully buffered; the stored copy and any copy handed back to
/// a caller are independent, so there is no single-read stream to guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheDb {
    /// Open a generation, creating it if absent.
    ///
    /// Idempotent: opening an existing generation returns a handle to it
    /// unchanged. Storage errors propagate.
    pub async fn open_generation(&self, name: &str) -> Result<GenerationHandle, Error> {
        let name = name.to_string();
        let stored = name.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![stored, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        Ok(GenerationHandle { name })
    }

    /// Enumerate all generation names present in the store.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an entire generation and every entry in it.
    ///
    /// Deleting a generation that does not exist is a no-op; returns
    /// whether a generation row was removed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Store an entry, replacing any previous entry for the same request.
    ///
    /// Replacement is whole-row: an entry is never partially updated.
    pub async fn put_entry(&self, handle: &GenerationHandle, entry: &CachedEntry) -> Result<(), Error> {
        let generation = handle.name.clone();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let key = compute_entry_key(&entry.method, &entry.url);
                conn.execute(
                    "INSERT OR REPLACE INTO entries (
                        generation, entry_key, method, url, status,
                        content_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        generation,
                        key,
                        entry.method.to_ascii_uppercase(),
                        entry.url,
                        entry.status,
                        entry.content_type,
                        entry.headers_json,
                        entry.body,
                        entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Exact-match lookup by normalized request.
    ///
    /// Returns None if the generation holds no entry for the request.
    pub async fn get_entry(
        &self, handle: &GenerationHandle, method: &str, url: &str,
    ) -> Result<Option<CachedEntry>, Error> {
        let generation = handle.name.clone();
        let key = compute_entry_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE generation = ?1 AND entry_key = ?2",
                )?;

                let result = stmt.query_row(params![generation, key], |row| {
                    Ok(CachedEntry {
                        method: row.get(0)?,
                        url: row.get(1)?,
                        status: row.get(2)?,
                        content_type: row.get(3)?,
                        headers_json: row.get(4)?,
                        body: row.get(5)?,
                        stored_at: row.get(6)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Enumerate every stored request in a generation.
    ///
    /// Used by the background refresh task and selective purge.
    pub async fn keys(&self, handle: &GenerationHandle) -> Result<Vec<StoredRequest>, Error> {
        let generation = handle.name.clone();
        self.conn
            .call(move |conn| -> Result<Vec<StoredRequest>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url FROM entries WHERE generation = ?1 ORDER BY url",
                )?;
                let requests = stmt
                    .query_map(params![generation], |row| {
                        Ok(StoredRequest { method: row.get(0)?, url: row.get(1)? })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(requests)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a single entry; returns whether it existed.
    pub async fn delete_entry(&self, handle: &GenerationHandle, method: &str, url: &str) -> Result<bool, Error> {
        let generation = handle.name.clone();
        let key = compute_entry_key(method, url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE generation = ?1 AND entry_key = ?2",
                    params![generation, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Count of entries in a generation.
    pub async fn entry_count(&self, handle: &GenerationHandle) -> Result<u64, Error> {
        let generation = handle.name.clone();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE generation = ?1",
                    params![generation],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_entry(url: &str) -> CachedEntry {
        CachedEntry {
            method: "GET".to_string(),
            url: url.to_string(),
            status: 200,
            content_type: Some("image/png".to_string()),
            headers_json: None,
            body: b"tile bytes".to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_open_generation_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        let second = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(db.list_generations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        let entry = make_test_entry("https://a.tile.opentopomap.org/11/608/736.png");

        db.put_entry(&generation, &entry).await.unwrap();

        let retrieved = db
            .get_entry(&generation, "GET", &entry.url)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved.url, entry.url);
        assert_eq!(retrieved.body, entry.body);
        assert_eq!(retrieved.status, 200);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        let result = db
            .get_entry(&generation, "GET", "https://example.com/absent.png")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        let url = "https://example.com/app.js";

        let mut entry = make_test_entry(url);
        entry.content_type = Some("text/javascript".to_string());
        db.put_entry(&generation, &entry).await.unwrap();

        let replacement = CachedEntry {
            method: "GET".to_string(),
            url: url.to_string(),
            status: 200,
            content_type: None,
            headers_json: None,
            body: b"updated".to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        };
        db.put_entry(&generation, &replacement).await.unwrap();

        let retrieved = db.get_entry(&generation, "GET", url).await.unwrap().unwrap();
        assert_eq!(retrieved.body, b"updated");
        assert_eq!(retrieved.content_type, None);
        assert_eq!(db.entry_count(&generation).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_entries_isolated_per_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        let v2 = db.open_generation("kmz_viewer-cache-v2").await.unwrap();
        let entry = make_test_entry("https://example.com/tile.png");

        db.put_entry(&v1, &entry).await.unwrap();

        assert!(db.get_entry(&v1, "GET", &entry.url).await.unwrap().is_some());
        assert!(db.get_entry(&v2, "GET", &entry.url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_generation_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        db.put_entry(&generation, &make_test_entry("https://example.com/a.png"))
            .await
            .unwrap();

        assert!(db.delete_generation("kmz_viewer-cache-v1").await.unwrap());
        assert!(db.list_generations().await.unwrap().is_empty());

        // Reopening yields an empty generation.
        let reopened = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        assert_eq!(db.entry_count(&reopened).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_generation_is_noop() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.delete_generation("kmz_viewer-cache-v0").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_enumeration() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        db.put_entry(&generation, &make_test_entry("https://example.com/a.png"))
            .await
            .unwrap();
        db.put_entry(&generation, &make_test_entry("https://example.com/b.js"))
            .await
            .unwrap();

        let keys = db.keys(&generation).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.method == "GET"));
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("kmz_viewer-cache-v1").await.unwrap();
        let entry = make_test_entry("https://example.com/a.png");
        db.put_entry(&generation, &entry).await.unwrap();

        assert!(db.delete_entry(&generation, "GET", &entry.url).await.unwrap());
        assert!(!db.delete_entry(&generation, "GET", &entry.url).await.unwrap());
        assert!(db.get_entry(&generation, "GET", &entry.url).await.unwrap().is_none());
    }
}
