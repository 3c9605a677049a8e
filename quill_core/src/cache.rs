use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::entity::prelude::PostModel;
use crate::service::feeds::Page;

/// Read-through cache for feed pages, keyed by (view name, page number).
///
/// Entries hold a fully built [`Page`], so readers can see a stale feed for
/// up to the TTL but never a torn one. Writers on the post path call
/// [`FeedCache::invalidate`] to drop a view's pages eagerly.
#[derive(Clone)]
pub struct FeedCache {
    entries: Arc<RwLock<HashMap<(&'static str, u64), CacheEntry>>>,
    ttl: Duration,
}

struct CacheEntry {
    page: Page<PostModel>,
    stored_at: Instant,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, view: &'static str, number: u64) -> Option<Page<PostModel>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&(view, number))?;

        if entry.stored_at.elapsed() > self.ttl {
            debug!(view, number, "feed cache expired");
            return None;
        }

        debug!(view, number, "feed cache hit");
        Some(entry.page.clone())
    }

    pub async fn put(&self, view: &'static str, number: u64, page: Page<PostModel>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            (view, number),
            CacheEntry {
                page,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every cached page of a view.
    pub async fn invalidate(&self, view: &'static str) {
        let mut entries = self.entries.write().await;
        entries.retain(|(cached_view, _), _| *cached_view != view);
        debug!(view, "feed cache invalidated");
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(number: u64) -> Page<PostModel> {
        Page {
            number,
            items: vec![],
            total_items: 0,
            total_pages: 0,
        }
    }

    #[tokio::test]
    async fn test_get_returns_stored_page() {
        let cache = FeedCache::new(Duration::from_secs(60));

        cache.put("index", 1, page_of(1)).await;

        let hit = cache.get("index", 1).await;
        assert_eq!(hit.map(|p| p.number), Some(1));
        assert!(cache.get("index", 2).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_misses() {
        let cache = FeedCache::new(Duration::from_millis(0));

        cache.put("index", 1, page_of(1)).await;

        assert!(cache.get("index", 1).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_drops_only_the_view() {
        let cache = FeedCache::new(Duration::from_secs(60));

        cache.put("index", 1, page_of(1)).await;
        cache.put("index", 2, page_of(2)).await;
        cache.put("group:test", 1, page_of(1)).await;

        cache.invalidate("index").await;

        assert!(cache.get("index", 1).await.is_none());
        assert!(cache.get("index", 2).await.is_none());
        assert!(cache.get("group:test", 1).await.is_some());
        assert_eq!(cache.len().await, 1);
    }
}
