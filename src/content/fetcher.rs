//! Remote content retrieval.
//!
//! Every failure (network, non-success status, malformed body) collapses to
//! `None` after being logged. Each call is a single attempt; the only
//! fallback is the Arabic-only chapter endpoint when the translated one fails.

use crate::content::audio_index::AudioIndexCache;
use crate::content::endpoints::Endpoints;
use crate::content::types::{
    AudioIndex, ChapterDetail, ChapterLoad, ChapterSummary, ContentError, http_client,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Anything that can resolve a URL to a JSON document.
pub trait JsonSource: Send + Sync {
    fn fetch_json(&self, url: &str) -> impl Future<Output = Option<Value>> + Send;
}

/// [`JsonSource`] over HTTP using the shared client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl Default for HttpSource {
    fn default() -> Self {
        Self {
            client: http_client().clone(),
        }
    }
}

impl HttpSource {
    async fn try_fetch(&self, url: &str) -> Result<Value, ContentError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ContentError::Status(resp.status()));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl JsonSource for HttpSource {
    async fn fetch_json(&self, url: &str) -> Option<Value> {
        match self.try_fetch(url).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(url, error = %e, "Fetch failed");
                None
            }
        }
    }
}

/// Typed access to the chapter, index and audio endpoints.
pub struct ContentFetcher<S> {
    source: S,
    endpoints: Endpoints,
    audio_cache: AudioIndexCache,
}

impl<S: JsonSource> ContentFetcher<S> {
    pub fn new(source: S, endpoints: Endpoints, audio_cache: AudioIndexCache) -> Self {
        Self {
            source,
            endpoints,
            audio_cache,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn fetch_typed<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let value = self.source.fetch_json(url).await?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(url, error = %e, "Unexpected payload shape");
                None
            }
        }
    }

    pub async fn chapter_index(&self) -> Option<Vec<ChapterSummary>> {
        let mut list: Vec<ChapterSummary> =
            self.fetch_typed(&self.endpoints.chapter_index_url()).await?;
        list.sort_by_key(|c| c.id);
        Some(list)
    }

    /// Translated endpoint first, then the Arabic-only endpoint once.
    pub async fn chapter(&self, id: u16, translation: &str) -> Option<ChapterLoad> {
        let url = self.endpoints.chapter_url(id, Some(translation));
        if let Some(detail) = self.fetch_typed::<ChapterDetail>(&url).await {
            return Some(ChapterLoad {
                detail,
                translated: true,
            });
        }

        tracing::info!(chapter = id, translation, "Translated chapter unavailable, using Arabic-only");
        let url = self.endpoints.chapter_url(id, None);
        let detail = self.fetch_typed::<ChapterDetail>(&url).await?;
        Some(ChapterLoad {
            detail,
            translated: false,
        })
    }

    pub async fn audio_index(&self, id: u16) -> Option<Arc<AudioIndex>> {
        let url = self.endpoints.audio_index_url(id);
        self.audio_cache
            .get_or_fetch(id, || async {
                let value = self.source.fetch_json(&url).await?;
                AudioIndex::from_value(&value)
            })
            .await
    }

    /// Chapter detail plus its audio index. The audio index is not requested
    /// when the chapter itself could not be loaded.
    pub async fn chapter_with_audio(
        &self,
        id: u16,
        translation: &str,
    ) -> Option<(ChapterLoad, Option<Arc<AudioIndex>>)> {
        let load = self.chapter(id, translation).await?;
        let audio = self.audio_index(id).await;
        Some((load, audio))
    }
}
