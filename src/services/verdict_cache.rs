// In-memory verdict cache with lazy TTL expiry

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::models::verdict::{CachedVerdict, Verdict};

#[derive(Debug, Clone)]
struct CacheEntry {
    verdict: Verdict,
    stored_at: Instant,
}

/// Process-local verdict store shared by all in-flight requests.
///
/// Entries are only removed when a read finds them expired; there is no
/// capacity bound or background sweep. Concurrent writes to one key are
/// last-write-wins.
pub struct VerdictCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl VerdictCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired verdict for `url`, with its age. Expired slots are evicted here.
    pub async fn get(&self, url: &str) -> Option<CachedVerdict> {
        let key = normalize_cache_key(url);

        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                None => return None,
                Some(entry) => {
                    let age = entry.stored_at.elapsed();
                    if age < self.ttl {
                        return Some(CachedVerdict {
                            verdict: entry.verdict.clone(),
                            age,
                        });
                    }
                },
            }
        }

        // Re-check under the write lock; another request may have refreshed the slot
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&key) {
            let age = entry.stored_at.elapsed();
            if age < self.ttl {
                return Some(CachedVerdict {
                    verdict: entry.verdict.clone(),
                    age,
                });
            }
            entries.remove(&key);
            debug!("Evicted expired cache entry for {}", key);
        }

        None
    }

    pub async fn put(&self, url: &str, verdict: Verdict) {
        let key = normalize_cache_key(url);
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                verdict,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored slots, expired ones included until they are read
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Cache key: scheme, lowercase host, non-default port, then path, query and
/// fragment verbatim. Unparseable input is used as-is.
pub fn normalize_cache_key(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };

    let mut key = format!(
        "{}://{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or_default().to_lowercase()
    );

    // `port()` is already None when it equals the scheme default
    if let Some(port) = parsed.port() {
        key.push_str(&format!(":{}", port));
    }

    key.push_str(parsed.path());

    if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
        key.push('?');
        key.push_str(query);
    }
    if let Some(fragment) = parsed.fragment().filter(|f| !f.is_empty()) {
        key.push('#');
        key.push_str(fragment);
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(url: &str) -> Verdict {
        Verdict::no_threat(url, 1, true, Some(200))
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(
            normalize_cache_key("HTTPS://Example.COM:443/a"),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_cache_key("http://example.com:80/"),
            "http://example.com/"
        );
        assert_eq!(
            normalize_cache_key("https://example.com:8443/a?x=1#top"),
            "https://example.com:8443/a?x=1#top"
        );
        assert_eq!(normalize_cache_key("https://example.com"), "https://example.com/");
        assert_ne!(
            normalize_cache_key("https://example.com/a"),
            normalize_cache_key("https://example.com/A")
        );
        assert_eq!(normalize_cache_key("not a url"), "not a url");
    }

    #[tokio::test]
    async fn test_put_then_get_returns_same_verdict() {
        let cache = VerdictCache::new(Duration::from_secs(300));
        let stored = verdict("https://example.com/a");

        cache.put("https://example.com/a", stored.clone()).await;
        let hit = cache.get("https://example.com/a").await.unwrap();

        assert_eq!(hit.verdict, stored);
    }

    #[tokio::test]
    async fn test_equivalent_urls_share_a_slot() {
        let cache = VerdictCache::new(Duration::from_secs(300));

        cache
            .put("https://Example.com:443/a", verdict("https://Example.com:443/a"))
            .await;

        assert!(cache.get("https://example.com/a").await.is_some());
        assert!(cache.get("https://example.com/A").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache = VerdictCache::new(Duration::from_secs(300));
        cache.put("https://example.com", verdict("https://example.com")).await;
        cache.put("https://other.com", verdict("https://other.com")).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        let hit = cache.get("https://example.com").await.unwrap();
        assert_eq!(hit.age, Duration::from_secs(299));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.len().await, 2);
        assert!(cache.get("https://example.com").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_resets_age() {
        let cache = VerdictCache::new(Duration::from_secs(300));
        cache.put("https://example.com", verdict("https://example.com")).await;

        tokio::time::advance(Duration::from_secs(200)).await;
        let replacement = Verdict::unreachable("https://example.com", 1);
        cache.put("https://example.com", replacement.clone()).await;

        tokio::time::advance(Duration::from_secs(200)).await;
        let hit = cache.get("https://example.com").await.unwrap();
        assert_eq!(hit.verdict, replacement);
        assert_eq!(hit.age, Duration::from_secs(200));
    }
}
