//! Cache-first fetching
//!
//! The `Fetcher` answers "give me the content for key K" from the request cache
//! when it can, and otherwise runs a caller-supplied resolver and stores the result.

use chrono::Utc;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{CacheEntry, CachePolicy, CachedValue, EntryKind, RequestCache};
use crate::net::{FetchError, Transport};

/// Cache-first fetcher over a `RequestCache`
///
/// Every miss triggers a full load-modify-save of the cache file. That cycle runs
/// under an in-process lock so concurrent tasks sharing one `Fetcher` cannot lose
/// each other's writes. Separate processes sharing the same file are not
/// coordinated.
#[derive(Debug)]
pub struct Fetcher {
    cache: RequestCache,
    policy: CachePolicy,
    lock: Mutex<()>,
}

impl Fetcher {
    /// Creates a fetcher that never expires cached entries
    pub fn new(cache: RequestCache) -> Self {
        Self {
            cache,
            policy: CachePolicy::default(),
            lock: Mutex::new(()),
        }
    }

    /// Replaces the cache policy
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(&self) -> &RequestCache {
        &self.cache
    }

    /// Returns the content stored under `key`, resolving and caching it on a miss
    ///
    /// # Arguments
    /// * `key` - Request identity (a page URL or a postal code)
    /// * `resolver` - Performs the live call; only invoked on a miss
    ///
    /// # Returns
    /// * `Ok(CachedValue)` - Cached or freshly resolved content
    /// * `Err(FetchError)` - The resolver failed (cache left untouched) or the
    ///   cache file could not be written
    pub async fn fetch<F, Fut>(&self, key: &str, resolver: F) -> Result<CachedValue, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedValue, FetchError>>,
    {
        {
            let _guard = self.lock.lock().await;
            let store = self.cache.load();
            if let Some(entry) = store.get(key) {
                if self.policy.is_fresh(entry, Utc::now()) {
                    debug!(key, "using cache");
                    return Ok(entry.value.clone());
                }
                debug!(key, "cache entry expired");
            }
        }

        info!(key, "fetching");
        let value = resolver().await?;

        let _guard = self.lock.lock().await;
        let mut store = self.cache.load();
        store.insert(key, CacheEntry::new(value.clone()));
        self.cache.save(&store)?;
        Ok(value)
    }

    /// Fetches a page, keyed by its URL
    pub async fn fetch_html(
        &self,
        url: &str,
        transport: &dyn Transport,
    ) -> Result<String, FetchError> {
        let value = self
            .fetch(url, || async move {
                transport.get_text(url).await.map(CachedValue::Html)
            })
            .await?;

        value.into_html().ok_or_else(|| FetchError::UnexpectedKind {
            key: url.to_string(),
            expected: EntryKind::Html,
        })
    }

    /// Fetches a decoded JSON document stored under `key`
    pub async fn fetch_json<F, Fut>(
        &self,
        key: &str,
        resolver: F,
    ) -> Result<serde_json::Value, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, FetchError>>,
    {
        let value = self
            .fetch(key, move || async move { resolver().await.map(CachedValue::Json) })
            .await?;

        value.into_json().ok_or_else(|| FetchError::UnexpectedKind {
            key: key.to_string(),
            expected: EntryKind::Json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::net::testing::FakeTransport;
    use chrono::Duration;
    use futures::future::join_all;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const PAGE_URL: &str = "https://www.nps.gov/isro/index.htm";

    fn create_test_fetcher() -> (Fetcher, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fetcher = Fetcher::new(RequestCache::with_path(temp_dir.path().join("cache.json")));
        (fetcher, temp_dir)
    }

    #[tokio::test]
    async fn test_miss_resolves_and_persists() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let transport = FakeTransport::new().with_page(PAGE_URL, "<html>isro</html>");

        let body = fetcher.fetch_html(PAGE_URL, &transport).await.unwrap();

        assert_eq!(body, "<html>isro</html>");
        assert_eq!(transport.calls(), 1);
        let stored = fetcher.cache().load();
        assert_eq!(
            stored.get(PAGE_URL).map(|e| e.value.clone()),
            Some(CachedValue::Html("<html>isro</html>".to_string()))
        );
    }

    #[tokio::test]
    async fn test_hit_skips_resolver_and_returns_identical_content() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let transport = FakeTransport::new().with_page(PAGE_URL, "<p>caf\u{e9} \u{2013} ok</p>");

        let first = fetcher.fetch_html(PAGE_URL, &transport).await.unwrap();
        let second = fetcher.fetch_html(PAGE_URL, &transport).await.unwrap();

        assert_eq!(transport.calls(), 1, "Second fetch should be served from cache");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[tokio::test]
    async fn test_resolver_failure_leaves_cache_untouched() {
        let (fetcher, _temp_dir) = create_test_fetcher();

        let result = fetcher
            .fetch(PAGE_URL, || async {
                Err(FetchError::Status {
                    url: PAGE_URL.to_string(),
                    status: StatusCode::BAD_GATEWAY,
                })
            })
            .await;

        assert!(matches!(result, Err(FetchError::Status { .. })));
        assert!(!fetcher.cache().load().contains_key(PAGE_URL));
    }

    #[tokio::test]
    async fn test_corrupt_cache_behaves_as_cold_cache() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        std::fs::write(fetcher.cache().path(), "not json at all").unwrap();
        let transport = FakeTransport::new().with_page(PAGE_URL, "<html></html>");

        let body = fetcher.fetch_html(PAGE_URL, &transport).await;

        assert!(body.is_ok(), "Corrupt cache must not raise");
        assert_eq!(transport.calls(), 1);
        assert_eq!(fetcher.cache().load().len(), 1);
    }

    #[tokio::test]
    async fn test_json_values_are_cached_as_structures() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = fetcher
                .fetch_json("49931", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({ "searchResults": [] }))
                })
                .await
                .unwrap();
            assert_eq!(value, json!({ "searchResults": [] }));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stored = fetcher.cache().load();
        assert_eq!(stored.get("49931").map(|e| e.value.kind()), Some(EntryKind::Json));
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_reported() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let mut store = CacheStore::new();
        store.insert(PAGE_URL, CacheEntry::new(CachedValue::Json(json!([]))));
        fetcher.cache().save(&store).unwrap();
        let transport = FakeTransport::new();

        let result = fetcher.fetch_html(PAGE_URL, &transport).await;

        assert!(matches!(
            result,
            Err(FetchError::UnexpectedKind {
                expected: EntryKind::Html,
                ..
            })
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched_under_ttl_policy() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let fetcher = fetcher.with_policy(CachePolicy::Ttl(Duration::hours(1)));
        let mut store = CacheStore::new();
        store.insert(
            PAGE_URL,
            CacheEntry {
                value: CachedValue::Html("old".to_string()),
                cached_at: Utc::now() - Duration::hours(2),
            },
        );
        fetcher.cache().save(&store).unwrap();
        let transport = FakeTransport::new().with_page(PAGE_URL, "new");

        let body = fetcher.fetch_html(PAGE_URL, &transport).await.unwrap();

        assert_eq!(body, "new");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_do_not_lose_updates() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let urls: Vec<String> = (0..8)
            .map(|i| format!("https://www.nps.gov/site{}/index.htm", i))
            .collect();
        let transport = urls
            .iter()
            .fold(FakeTransport::new(), |t, url| t.with_page(url, url));

        let fetches = urls.iter().map(|url| fetcher.fetch_html(url, &transport));
        let results = join_all(fetches).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(fetcher.cache().load().len(), urls.len());
    }
}
