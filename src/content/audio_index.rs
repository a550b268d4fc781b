//! Session-lifetime memoization of per-chapter audio indexes.
//!
//! A chapter id that is absent from the map has never been attempted. A
//! failed fetch is stored as [`CachedIndex::Unavailable`] so it is not
//! retried for the rest of the session. Nothing is ever evicted.

use crate::content::types::AudioIndex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum CachedIndex {
    Available(Arc<AudioIndex>),
    Unavailable,
}

impl CachedIndex {
    pub fn index(&self) -> Option<Arc<AudioIndex>> {
        match self {
            CachedIndex::Available(idx) => Some(Arc::clone(idx)),
            CachedIndex::Unavailable => None,
        }
    }
}

/// Cloneable handle; all clones share one map.
#[derive(Debug, Clone, Default)]
pub struct AudioIndexCache {
    entries: Arc<Mutex<HashMap<u16, CachedIndex>>>,
}

impl AudioIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the chapter was never attempted.
    pub async fn lookup(&self, chapter: u16) -> Option<CachedIndex> {
        self.entries.lock().await.get(&chapter).cloned()
    }

    /// Return the stored entry, or run `fetch` once and store whatever it yields.
    ///
    /// The lock is not held across `fetch`; two concurrent first requests for
    /// the same chapter may both fetch, and the later store wins with an
    /// equivalent value.
    pub async fn get_or_fetch<F, Fut>(&self, chapter: u16, fetch: F) -> Option<Arc<AudioIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<AudioIndex>>,
    {
        if let Some(hit) = self.lookup(chapter).await {
            tracing::debug!(chapter, available = hit.index().is_some(), "Audio index cache hit");
            return hit.index();
        }

        let entry = match fetch().await {
            Some(idx) => CachedIndex::Available(Arc::new(idx)),
            None => CachedIndex::Unavailable,
        };
        let result = entry.index();
        self.entries.lock().await.insert(chapter, entry);
        result
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn failure_is_cached_as_unavailable() {
        let cache = AudioIndexCache::new();
        let calls = AtomicUsize::new(0);

        assert_eq!(cache.lookup(9).await, None);
        for _ in 0..2 {
            let got = cache
                .get_or_fetch(9, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    None
                })
                .await;
            assert!(got.is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.lookup(9).await, Some(CachedIndex::Unavailable));
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let cache = AudioIndexCache::new();
        let other = cache.clone();
        cache
            .get_or_fetch(1, || async { Some(AudioIndex::default()) })
            .await;
        let refetched = AtomicUsize::new(0);
        let second = other
            .get_or_fetch(1, || async {
                refetched.fetch_add(1, Ordering::SeqCst);
                None
            })
            .await;
        assert!(second.is_some());
        assert_eq!(refetched.load(Ordering::SeqCst), 0);
        assert_eq!(other.len().await, 1);
    }
}
