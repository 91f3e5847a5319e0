// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::storage::{CacheHandle, Expiration};
use crate::errors::CacheError;
use crate::observability::messages::{
    cache::{CacheLookup, CacheValueSkipped},
    StructuredLog,
};

type KeyFn<A> = Arc<dyn Fn(&A) -> Option<String> + Send + Sync>;
type ValidateFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Memoizes one function in one cache scope.
///
/// Values are stored as JSON and decoded again on every hit, so callers always
/// receive an independent copy. Only `Ok` results accepted by the validity
/// predicate are stored. A key function returning `None` bypasses the cache
/// for that call.
pub struct Memoizer<A, T> {
    cache: CacheHandle,
    scope: String,
    expiration: Expiration,
    key_fn: KeyFn<A>,
    validate: ValidateFn<T>,
    _marker: PhantomData<fn(A) -> T>,
}

impl<A, T> Clone for Memoizer<A, T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            scope: self.scope.clone(),
            expiration: self.expiration,
            key_fn: self.key_fn.clone(),
            validate: self.validate.clone(),
            _marker: PhantomData,
        }
    }
}

impl<A, T> Memoizer<A, T>
where
    A: Serialize + 'static,
    T: 'static,
{
    /// Memoizer keyed by the JSON encoding of the arguments.
    pub fn new(cache: CacheHandle, scope: impl Into<String>, expiration: Expiration) -> Self {
        Self::with_key(cache, scope, expiration, |args: &A| serde_json::to_string(args).ok())
    }
}

impl<A: 'static, T: 'static> Memoizer<A, T> {
    pub fn with_key<K>(cache: CacheHandle, scope: impl Into<String>, expiration: Expiration, key_fn: K) -> Self
    where
        K: Fn(&A) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            cache,
            scope: scope.into(),
            expiration,
            key_fn: Arc::new(key_fn),
            validate: Arc::new(|_: &T| true),
            _marker: PhantomData,
        }
    }

    /// Only store results accepted by `validate`.
    pub fn validate_with<V>(mut self, validate: V) -> Self
    where
        V: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.validate = Arc::new(validate);
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn expiration(&self) -> Expiration {
        self.expiration
    }
}

impl<A, T> Memoizer<A, T>
where
    T: Serialize + DeserializeOwned,
{
    fn value_error(&self, source: serde_json::Error) -> CacheError {
        CacheError::Value {
            scope: self.scope.clone(),
            source,
        }
    }

    fn lookup(&self, key: &str) -> Option<T> {
        let hit = self
            .cache
            .get(&self.scope, key, self.expiration)
            .and_then(|value| match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(source) => {
                    CacheValueSkipped {
                        key,
                        error: &self.value_error(source),
                    }
                    .log();
                    None
                }
            });
        CacheLookup {
            scope: &self.scope,
            key,
            hit: hit.is_some(),
        }
        .log();
        hit
    }

    fn store(&self, key: &str, value: &T) {
        if !(self.validate)(value) {
            return;
        }
        match serde_json::to_value(value) {
            Ok(json) => self.cache.put(&self.scope, key, json),
            Err(source) => CacheValueSkipped {
                key,
                error: &self.value_error(source),
            }
            .log(),
        }
    }

    /// Return the live cached value for `args`, or run `compute` and cache its result.
    pub async fn get_or_compute<F, Fut, E>(&self, args: A, compute: F) -> Result<T, E>
    where
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = (self.key_fn)(&args);
        if let Some(cached) = key.as_deref().and_then(|key| self.lookup(key)) {
            return Ok(cached);
        }

        let value = compute(args).await?;
        if let Some(key) = key.as_deref() {
            self.store(key, &value);
        }
        Ok(value)
    }

    /// Like [`get_or_compute`](Self::get_or_compute) for a blocking function,
    /// which runs on the blocking worker pool.
    pub async fn get_or_compute_blocking<F>(&self, args: A, compute: F) -> anyhow::Result<T>
    where
        A: Send + 'static,
        T: Send + 'static,
        F: FnOnce(A) -> anyhow::Result<T> + Send + 'static,
    {
        self.get_or_compute(args, |args| async move {
            tokio::task::spawn_blocking(move || compute(args)).await?
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let memo: Memoizer<(String, u16), Value> =
            Memoizer::new(CacheHandle::in_memory(), "basic.fetch_one", Expiration::Never);
        let calls = counting();

        for _ in 0..2 {
            let calls = calls.clone();
            let value = memo
                .get_or_compute(("https://a.example/".to_string(), 443), |(url, port)| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(json!({"url": url, "port": port}))
                })
                .await
                .unwrap();
            assert_eq!(value["port"], json!(443));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_recomputed() {
        let memo: Memoizer<&str, u32> = Memoizer::new(
            CacheHandle::in_memory(),
            "dns.lookup",
            Expiration::After(Duration::from_millis(20)),
        );
        let calls = counting();
        let compute = |calls: Arc<AtomicUsize>| {
            move |_: &str| async move { Ok::<_, anyhow::Error>(calls.fetch_add(1, Ordering::SeqCst) as u32) }
        };

        assert_eq!(memo.get_or_compute("a", compute(calls.clone())).await.unwrap(), 0);
        assert_eq!(memo.get_or_compute("a", compute(calls.clone())).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(memo.get_or_compute("a", compute(calls.clone())).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_results_are_not_stored() {
        let memo: Memoizer<&str, Value> = Memoizer::new(CacheHandle::in_memory(), "basic.fetch_one", Expiration::Never)
            .validate_with(|v: &Value| v.get("error").is_none());
        let calls = counting();

        for _ in 0..3 {
            let calls = calls.clone();
            memo.get_or_compute("https://down.example/", |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(json!({"error": "Connection refused"}))
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_stored() {
        let cache = CacheHandle::in_memory();
        let memo: Memoizer<&str, u8> = Memoizer::new(cache.clone(), "s", Expiration::Never);
        let err = memo
            .get_or_compute("k", |_| async { Err::<u8, _>(anyhow::anyhow!("boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_cached_value_is_recomputed() {
        let cache = CacheHandle::in_memory();
        let key = serde_json::to_string("a.example").unwrap();
        cache.put("dns.ttl", &key, json!("not a number"));
        let memo: Memoizer<&str, u32> = Memoizer::new(cache.clone(), "dns.ttl", Expiration::Never);
        let calls = counting();

        let counted = calls.clone();
        let ttl = memo
            .get_or_compute("a.example", |_| async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(300)
            })
            .await
            .unwrap();

        assert_eq!(ttl, 300);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("dns.ttl", &key, Expiration::Never), Some(json!(300)));
    }

    #[test]
    fn test_value_error_names_the_scope() {
        let memo: Memoizer<&str, u32> = Memoizer::new(CacheHandle::in_memory(), "dns.ttl", Expiration::Never);
        let source = serde_json::from_value::<u32>(json!("x")).unwrap_err();
        let message = memo.value_error(source).to_string();
        assert!(message.starts_with("failed to convert cached value for scope 'dns.ttl'"));
    }

    #[tokio::test]
    async fn test_cached_value_is_an_independent_copy() {
        let memo: Memoizer<&str, Value> = Memoizer::new(CacheHandle::in_memory(), "s", Expiration::Never);
        let mut first = memo
            .get_or_compute("k", |_| async { Ok::<_, anyhow::Error>(json!({"tags": ["a"]})) })
            .await
            .unwrap();
        first["tags"] = json!(["mutated"]);

        let second = memo
            .get_or_compute("k", |_| async { Ok::<_, anyhow::Error>(json!(null)) })
            .await
            .unwrap();
        assert_eq!(second, json!({"tags": ["a"]}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_compute_runs_once() {
        let memo: Memoizer<String, String> = Memoizer::with_key(
            CacheHandle::in_memory(),
            "dns.reverse",
            Expiration::Never,
            |host: &String| Some(host.to_ascii_lowercase()),
        );
        let calls = counting();

        for host in ["A.example", "a.example"] {
            let calls = calls.clone();
            let name = memo
                .get_or_compute_blocking(host.to_string(), move |host| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("ptr.{}", host.to_ascii_lowercase()))
                })
                .await
                .unwrap();
            assert_eq!(name, "ptr.a.example");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
