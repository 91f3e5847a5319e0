// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the memoization cache.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// The cache file was loaded.
///
/// # Example
/// ```
/// use fleet_stats::observability::messages::cache::CacheLoaded;
/// use std::path::Path;
///
/// let msg = CacheLoaded {
///     path: Path::new("cache.yaml"),
///     scope_count: 3,
///     entry_count: 240,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CacheLoaded<'a> {
    pub path: &'a Path,
    pub scope_count: usize,
    pub entry_count: usize,
}

impl Display for CacheLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded cache {}: {} scopes, {} entries",
            self.path.display(),
            self.scope_count,
            self.entry_count
        )
    }
}

impl StructuredLog for CacheLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            scope_count = self.scope_count,
            entry_count = self.entry_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("cache_load", span_name = name, path = %self.path.display())
    }
}

/// The cache file could not be used; the run starts with an empty cache.
///
/// # Log Level
/// `warn!` - degraded, not fatal
pub struct CacheLoadFailed<'a> {
    pub path: &'a Path,
    pub error: &'a dyn std::error::Error,
}

impl Display for CacheLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring cache {}, starting empty: {}",
            self.path.display(),
            self.error
        )
    }
}

impl StructuredLog for CacheLoadFailed<'_> {
    fn log(&self) {
        tracing::warn!(path = %self.path.display(), error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("cache_load_failed", span_name = name, path = %self.path.display())
    }
}

/// The cache was written back to disk.
pub struct CacheFlushed<'a> {
    pub path: &'a Path,
    pub entry_count: usize,
}

impl Display for CacheFlushed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Saved {} cache entries to {}", self.entry_count, self.path.display())
    }
}

impl StructuredLog for CacheFlushed<'_> {
    fn log(&self) {
        tracing::info!(path = %self.path.display(), entry_count = self.entry_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("cache_flush", span_name = name, path = %self.path.display())
    }
}

/// Writing the cache back to disk failed.
///
/// # Log Level
/// `error!` - the next run starts cold
pub struct CacheFlushFailed<'a> {
    pub path: &'a Path,
    pub error: &'a dyn std::error::Error,
}

impl Display for CacheFlushFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to save cache {}: {}", self.path.display(), self.error)
    }
}

impl StructuredLog for CacheFlushFailed<'_> {
    fn log(&self) {
        tracing::error!(path = %self.path.display(), error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("cache_flush_failed", span_name = name, path = %self.path.display())
    }
}

/// Scopes were erased to force a refresh.
pub struct CacheScopesErased<'a> {
    pub prefix: &'a str,
    pub scope_count: usize,
}

impl Display for CacheScopesErased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Erased {} cache scopes matching '{}'",
            self.scope_count, self.prefix
        )
    }
}

impl StructuredLog for CacheScopesErased<'_> {
    fn log(&self) {
        tracing::info!(prefix = self.prefix, scope_count = self.scope_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("cache_erase", span_name = name, prefix = self.prefix)
    }
}

/// A cached value was served or recomputed.
///
/// # Log Level
/// `trace!` - one per memoized call
pub struct CacheLookup<'a> {
    pub scope: &'a str,
    pub key: &'a str,
    pub hit: bool,
}

impl Display for CacheLookup<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let outcome = if self.hit { "hit" } else { "miss" };
        write!(f, "Cache {} for {}[{}]", outcome, self.scope, self.key)
    }
}

impl StructuredLog for CacheLookup<'_> {
    fn log(&self) {
        tracing::trace!(scope = self.scope, key = self.key, hit = self.hit, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("cache_lookup", span_name = name, scope = self.scope)
    }
}

/// A value could not be converted to or from its cached JSON form.
///
/// A value that cannot be decoded counts as a miss; one that cannot be encoded
/// is not stored.
pub struct CacheValueSkipped<'a> {
    pub key: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CacheValueSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping cache value [{}]: {}", self.key, self.error)
    }
}

impl StructuredLog for CacheValueSkipped<'_> {
    fn log(&self) {
        tracing::warn!(key = self.key, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("cache_value_skipped", span_name = name, key = self.key)
    }
}
