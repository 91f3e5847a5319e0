// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::errors::CacheError;
use crate::observability::messages::{cache::*, StructuredLog};

/// How long an entry of a scope stays live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    Never,
    After(Duration),
}

impl Expiration {
    fn is_expired(&self, stored_at: f64, now: f64) -> bool {
        match self {
            Expiration::Never => false,
            Expiration::After(window) => now - stored_at > window.as_secs_f64(),
        }
    }
}

/// One cached value with the time (seconds since the epoch) it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: f64,
    pub value: Value,
}

type Scopes = BTreeMap<String, BTreeMap<String, CacheEntry>>;

#[derive(Debug)]
struct CacheInner {
    path: Option<PathBuf>,
    scopes: RwLock<Scopes>,
    flushed: AtomicBool,
}

/// Process-wide memoization store, shared by cloning the handle.
///
/// The store is loaded once from a single YAML file and written back once by
/// [`flush`](CacheHandle::flush). The file maps scope name to argument key to
/// `{timestamp, value}` and may be deleted at any time.
#[derive(Debug, Clone)]
pub struct CacheHandle {
    inner: Arc<CacheInner>,
}

impl CacheHandle {
    /// Cache that is never persisted.
    pub fn in_memory() -> Self {
        Self::with_scopes(None, Scopes::new())
    }

    /// Load the cache from `path`.
    ///
    /// A missing file is a cold start. An unreadable or corrupt file is logged
    /// and also treated as a cold start; it is overwritten on flush.
    pub fn bind_to_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let scopes = match load_scopes(&path) {
            Ok(Some(scopes)) => {
                CacheLoaded {
                    path: &path,
                    scope_count: scopes.len(),
                    entry_count: count_entries(&scopes),
                }
                .log();
                scopes
            }
            Ok(None) => Scopes::new(),
            Err(error) => {
                CacheLoadFailed {
                    path: &path,
                    error: &error,
                }
                .log();
                Scopes::new()
            }
        };
        Self::with_scopes(Some(path), scopes)
    }

    fn with_scopes(path: Option<PathBuf>, scopes: Scopes) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                path,
                scopes: RwLock::new(scopes),
                flushed: AtomicBool::new(false),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Live value stored under `(scope, key)`.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, scope: &str, key: &str, expiration: Expiration) -> Option<Value> {
        let now = now_seconds();
        {
            let scopes = self.inner.scopes.read().unwrap_or_else(PoisonError::into_inner);
            let entry = scopes.get(scope)?.get(key)?;
            if !expiration.is_expired(entry.timestamp, now) {
                return Some(entry.value.clone());
            }
        }

        let mut scopes = self.inner.scopes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = scopes.get_mut(scope) {
            let expired = entries
                .get(key)
                .map_or(false, |entry| expiration.is_expired(entry.timestamp, now));
            if expired {
                entries.remove(key);
            }
        }
        None
    }

    pub fn put(&self, scope: &str, key: &str, value: Value) {
        let entry = CacheEntry {
            timestamp: now_seconds(),
            value,
        };
        self.inner
            .scopes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), entry);
    }

    /// Drop every scope whose name starts with `prefix`. Returns the number of scopes removed.
    pub fn erase_by_prefix(&self, prefix: &str) -> usize {
        let mut scopes = self.inner.scopes.write().unwrap_or_else(PoisonError::into_inner);
        let before = scopes.len();
        scopes.retain(|scope, _| !scope.starts_with(prefix));
        let erased = before - scopes.len();
        CacheScopesErased {
            prefix,
            scope_count: erased,
        }
        .log();
        erased
    }

    pub fn scope_names(&self) -> Vec<String> {
        self.inner
            .scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        count_entries(&self.inner.scopes.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Write the cache back to its file.
    ///
    /// Only the first call writes; later calls and in-memory caches are no-ops.
    /// Failures are logged and swallowed.
    pub fn flush(&self) {
        if let Err(error) = self.try_flush() {
            if let Some(path) = self.path() {
                CacheFlushFailed { path, error: &error }.log();
            }
        }
    }

    /// Like [`flush`](Self::flush), but reports the failure. Returns `false`
    /// when nothing was written.
    pub fn try_flush(&self) -> Result<bool, CacheError> {
        let Some(path) = self.path() else {
            return Ok(false);
        };
        if self.inner.flushed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        let scopes = self.inner.scopes.read().unwrap_or_else(PoisonError::into_inner);
        let content = serde_yaml::to_string(&*scopes)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| CacheError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        CacheFlushed {
            path,
            entry_count: count_entries(&scopes),
        }
        .log();
        Ok(true)
    }
}

fn load_scopes(path: &Path) -> Result<Option<Scopes>, CacheError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CacheError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn count_entries(scopes: &Scopes) -> usize {
    scopes.values().map(BTreeMap::len).sum()
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_get_and_expiration() {
        let cache = CacheHandle::in_memory();
        cache.put("basic.fetch_one", "https://a.example/", json!({"status": 200}));
        assert_eq!(
            cache.get("basic.fetch_one", "https://a.example/", Expiration::Never),
            Some(json!({"status": 200}))
        );
        assert_eq!(cache.get("basic.fetch_one", "https://b.example/", Expiration::Never), None);

        // a zero window expires as soon as the clock moves
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(
            cache.get("basic.fetch_one", "https://a.example/", Expiration::After(Duration::ZERO)),
            None
        );
        // the expired entry is gone for good
        assert_eq!(cache.get("basic.fetch_one", "https://a.example/", Expiration::Never), None);
    }

    #[test]
    fn test_erase_by_prefix() {
        let cache = CacheHandle::in_memory();
        cache.put("tls.grade", "k", json!(1));
        cache.put("tls.cert", "k", json!(2));
        cache.put("timing.get", "k", json!(3));

        assert_eq!(cache.erase_by_prefix("tls."), 2);
        assert_eq!(cache.scope_names(), vec!["timing.get"]);
    }

    #[test]
    fn test_flush_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("fleet.yaml");

        let cache = CacheHandle::bind_to_file(&path);
        assert_eq!(cache.entry_count(), 0);
        cache.put("dns.lookup", "a.example", json!(["192.0.2.1"]));
        assert!(cache.try_flush().unwrap());
        // second flush is a no-op
        cache.put("dns.lookup", "b.example", json!([]));
        assert!(!cache.try_flush().unwrap());

        let reloaded = CacheHandle::bind_to_file(&path);
        assert_eq!(reloaded.entry_count(), 1);
        assert_eq!(
            reloaded.get("dns.lookup", "a.example", Expiration::Never),
            Some(json!(["192.0.2.1"]))
        );
    }

    #[test]
    fn test_corrupt_file_is_a_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.yaml");
        std::fs::write(&path, "scope: [this is: not: a cache").unwrap();

        let cache = CacheHandle::bind_to_file(&path);
        assert_eq!(cache.entry_count(), 0);
        cache.put("s", "k", json!(true));
        assert!(cache.try_flush().unwrap());
        assert_eq!(CacheHandle::bind_to_file(&path).entry_count(), 1);
    }

    #[test]
    fn test_in_memory_flush_writes_nothing() {
        let cache = CacheHandle::in_memory();
        cache.put("s", "k", json!(1));
        assert!(!cache.try_flush().unwrap());
        cache.flush();
    }
}
