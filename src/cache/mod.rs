//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Time limited cache for derived data

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;
use tracing::warn;

pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration);

    fn default_ttl(&self) -> Duration;

    fn set(&self, key: &str, value: Value) {
        self.set_with_ttl(key, value, self.default_ttl())
    }
}

pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Value)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        MemoryCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((expires, value)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                trace!("Cache entry {} expired", key);
                entries.remove(key);
                None
            },
            None => None,
        }
    }

    fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(String::from(key), (Instant::now() + ttl, value));
            },
            Err(_) => warn!("Cache lock poisoned, not caching {}", key),
        }
    }

    fn default_ttl(&self) -> Duration {
        self.ttl
    }
}

/// Return the cached value for `key`, or compute, cache and return it
///
/// With `force_refresh` the cached value is ignored and replaced.
pub async fn memoize<T, F>(cache: &dyn Cache, key: &str, force_refresh: bool, compute: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: Future<Output = Result<T>>,
{
    if !force_refresh {
        if let Some(value) = cache.get(key) {
            match serde_json::from_value(value) {
                Ok(v) => return Ok(v),
                Err(e) => warn!("Dropping unreadable cache entry {}: {}", key, e),
            }
        }
    }

    let fresh = compute.await?;
    let value = serde_json::to_value(&fresh).with_context(|| format!("Serializing cache entry {}", key))?;
    cache.set(key, value);
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_entries_expire() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("a", Value::from(1));
        cache.set_with_ttl("b", Value::from(2), Duration::from_secs(0));

        assert_eq!(cache.get("a"), Some(Value::from(1)));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), None);
    }

    #[tokio::test]
    async fn test_memoize() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(vec![String::from("x")])
        };

        let first: Vec<String> = memoize(&cache, "k", false, compute()).await.unwrap();
        let second: Vec<String> = memoize(&cache, "k", false, compute()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let _: Vec<String> = memoize(&cache, "k", true, compute()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let failed: Result<u32> = memoize(&cache, "k", false, async { Err(anyhow::anyhow!("down")) }).await;
        assert!(failed.is_err());
        assert_eq!(cache.get("k"), None);
    }
}
