// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed, TTL-bounded response cache.
//!
//! Each entry is one JSON file under the cache root, named by the SHA-256
//! fingerprint of the request content. Entries expire by wall-clock age:
//! an entry is valid while `now - created_at <= ttl`. Expired entries are
//! deleted lazily on read and by the `clean_expired` sweep.
//!
//! Per-call I/O errors are returned to the caller, which treats them as a
//! cache miss. Only failure to create the backing directory is fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use tollgate_core::TollgateError;

/// One cached response on disk.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Fingerprint this entry was stored under.
    hash: String,
    /// The generated payload, stored verbatim.
    response: String,
    /// RFC 3339 creation timestamp (UTC).
    created_at: String,
}

/// Compute the deterministic cache key for arbitrary content.
///
/// SHA-256 hex digest: always 64 lowercase hex characters.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File-backed response cache addressed by content fingerprint.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    /// Open a cache rooted at `root`, creating the directory if needed.
    ///
    /// Runs a best-effort expiry sweep; sweep failures are logged, not fatal.
    pub async fn open(root: PathBuf, ttl: Duration) -> Result<Self, TollgateError> {
        fs::create_dir_all(&root)
            .await
            .map_err(TollgateError::storage)?;
        let cache = Self { root, ttl };
        if let Err(e) = cache.clean_expired().await {
            warn!(error = %e, "initial cache sweep failed");
        }
        Ok(cache)
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Look up a fingerprint.
    ///
    /// Returns `Ok(None)` when the entry is absent or expired; an expired
    /// entry is deleted as a side effect of the read. `Err` is reserved for
    /// I/O and deserialization failures.
    pub async fn get(&self, key: &str) -> Result<Option<String>, TollgateError> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TollgateError::storage(e)),
        };

        let entry: CacheEntry =
            serde_json::from_slice(&bytes).map_err(TollgateError::storage)?;

        if self.is_expired(&entry.created_at) {
            if let Err(e) = fs::remove_file(&path).await {
                debug!(key, error = %e, "failed to remove expired cache entry");
            }
            return Ok(None);
        }

        debug!(key, "cache hit");
        Ok(Some(entry.response))
    }

    /// Store a payload under a fingerprint. Last write wins.
    pub async fn set(&self, key: &str, response: &str) -> Result<(), TollgateError> {
        let entry = CacheEntry {
            hash: key.to_string(),
            response: response.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let bytes = serde_json::to_vec(&entry).map_err(TollgateError::storage)?;
        fs::write(self.entry_path(key), bytes)
            .await
            .map_err(TollgateError::storage)?;
        debug!(key, "cache entry stored");
        Ok(())
    }

    /// Sweep the store, deleting entries older than the TTL.
    ///
    /// Entries that cannot be parsed are removed too: they can never be
    /// served again.
    pub async fn clean_expired(&self) -> Result<(), TollgateError> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(TollgateError::storage)?;
        while let Some(item) = dir.next_entry().await.map_err(TollgateError::storage)? {
            let path = item.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let stale = match fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                    Ok(entry) => self.is_expired(&entry.created_at),
                    Err(_) => true,
                },
                Err(_) => false,
            };
            if stale {
                if let Err(e) = fs::remove_file(&path).await {
                    debug!(?path, error = %e, "failed to remove stale cache entry");
                }
            }
        }
        Ok(())
    }

    /// Delete the entire store unconditionally.
    pub async fn clean(&self) -> Result<(), TollgateError> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(TollgateError::storage)?;
        while let Some(item) = dir.next_entry().await.map_err(TollgateError::storage)? {
            let path = item.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            fs::remove_file(&path).await.map_err(TollgateError::storage)?;
        }
        Ok(())
    }

    /// An entry is valid while `now - created_at <= ttl`.
    fn is_expired(&self, created_at: &str) -> bool {
        let Ok(created) = DateTime::parse_from_rfc3339(created_at) else {
            return true;
        };
        let age = Utc::now().signed_duration_since(created.with_timezone(&Utc));
        match age.to_std() {
            Ok(age) => age > self.ttl,
            // Negative age means a clock running behind the writer; keep it.
            Err(_) => false,
        }
    }
}
