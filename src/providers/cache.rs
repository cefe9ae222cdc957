use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use serde_json::Value;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// ArticleCache
///
/// Look-aside store for rendered public feed pages. A miss is never an error;
/// callers fall through to the repository.
#[async_trait]
pub trait ArticleCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value, ttl: Duration);
    /// Drops every entry. Called whenever moderation or authoring changes what the feed shows.
    async fn clear(&self);
}

pub type CacheState = Arc<dyn ArticleCache>;

/// Key for one page of the home feed.
pub fn home_feed_key(page: u32, limit: u32) -> String {
    format!("home_articles:{page}:{limit}")
}

#[derive(Clone)]
struct Entry {
    value: Arc<Value>,
    ttl: Duration,
}

/// Each entry carries its own TTL, reset on overwrite.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// MokaArticleCache
///
/// In-process `ArticleCache` on `moka`'s async cache.
#[derive(Clone)]
pub struct MokaArticleCache {
    inner: Cache<String, Entry>,
}

impl MokaArticleCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

impl Default for MokaArticleCache {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[async_trait]
impl ArticleCache for MokaArticleCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await.map(|entry| entry.value.as_ref().clone())
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let entry = Entry {
            value: Arc::new(value),
            ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
    }

    async fn clear(&self) {
        self.inner.invalidate_all();
    }
}
