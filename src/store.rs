//! Local persisted state.
//!
//! A flat string-to-string key/value file, written as pretty JSON after every
//! mutation. Structured values (`bookmarks`, `lastBookmark`) are themselves
//! JSON-encoded strings; the theme and translation codes are stored as plain
//! text.
//!
//! # Keys
//!
//! - `bookmarks`: `{"<chapter>-<verse>": {"surahId", "verseId", "text", "timestamp"}}`
//! - `lastBookmark`: `{"surahId", "verseId"?}`
//! - `quran_theme`: `light` | `dark`
//! - `quran_translation`: translation code such as `en` or `ur`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

pub const KEY_BOOKMARKS: &str = "bookmarks";
pub const KEY_LAST_POSITION: &str = "lastBookmark";
pub const KEY_THEME: &str = "quran_theme";
pub const KEY_TRANSLATION: &str = "quran_translation";

pub const DEFAULT_TRANSLATION: &str = "en";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "surahId")]
    pub chapter: u16,
    #[serde(rename = "verseId")]
    pub verse: u16,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Bookmark {
    pub fn key(chapter: u16, verse: u16) -> String {
        format!("{chapter}-{verse}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPosition {
    #[serde(rename = "surahId")]
    pub chapter: u16,
    #[serde(rename = "verseId", default, skip_serializing_if = "Option::is_none")]
    pub verse: Option<u16>,
}

/// The persisted key/value map plus its backing file.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
    bookmarks: HashMap<String, Bookmark>,
}

impl LocalStore {
    /// Load from `path`. A missing or unreadable file yields an empty store.
    pub async fn open(path: PathBuf) -> Self {
        let items = match load_items(&path).await {
            Ok(items) => {
                tracing::info!(path = %path.display(), entries = items.len(), "Loaded local state");
                items
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Creating new local state");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load local state, starting empty");
                BTreeMap::new()
            }
        };
        let bookmarks = items
            .get(KEY_BOOKMARKS)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        Self {
            path,
            items,
            bookmarks,
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Set a raw value and persist. Write failures are logged, the in-memory
    /// copy stays authoritative for the session.
    pub async fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
        if let Err(e) = save_items(&self.items, &self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to save local state");
        }
    }

    pub fn theme(&self) -> Theme {
        self.get_item(KEY_THEME).and_then(Theme::parse).unwrap_or_default()
    }

    pub async fn set_theme(&mut self, theme: Theme) {
        self.set_item(KEY_THEME, theme.as_str().to_string()).await;
    }

    pub fn translation(&self) -> String {
        self.get_item(KEY_TRANSLATION)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TRANSLATION)
            .to_string()
    }

    pub async fn set_translation(&mut self, code: &str) {
        self.set_item(KEY_TRANSLATION, code.to_string()).await;
    }

    pub fn last_position(&self) -> Option<LastPosition> {
        let raw = self.get_item(KEY_LAST_POSITION)?;
        match serde_json::from_str(raw) {
            Ok(pos) => Some(pos),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable last position");
                None
            }
        }
    }

    pub async fn save_last_position(&mut self, chapter: u16, verse: Option<u16>) {
        let pos = LastPosition { chapter, verse };
        match serde_json::to_string(&pos) {
            Ok(raw) => self.set_item(KEY_LAST_POSITION, raw).await,
            Err(e) => tracing::warn!(error = %e, "Failed to encode last position"),
        }
    }

    pub fn is_bookmarked(&self, chapter: u16, verse: u16) -> bool {
        self.bookmarks.contains_key(&Bookmark::key(chapter, verse))
    }

    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len()
    }

    /// Newest first.
    pub fn sorted_bookmarks(&self) -> Vec<Bookmark> {
        let mut list: Vec<Bookmark> = self.bookmarks.values().cloned().collect();
        list.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(a.chapter.cmp(&b.chapter))
                .then(a.verse.cmp(&b.verse))
        });
        list
    }

    /// Add or remove the bookmark for a verse, persist, and record the verse
    /// as the last position. Returns whether the verse is now bookmarked.
    pub async fn toggle_bookmark(&mut self, chapter: u16, verse: u16, text: &str) -> bool {
        let key = Bookmark::key(chapter, verse);
        let now_bookmarked = if self.bookmarks.remove(&key).is_some() {
            false
        } else {
            self.bookmarks.insert(
                key,
                Bookmark {
                    chapter,
                    verse,
                    text: text.to_string(),
                    timestamp: chrono::Utc::now().timestamp_millis(),
                },
            );
            true
        };
        match serde_json::to_string(&self.bookmarks) {
            Ok(raw) => self.set_item(KEY_BOOKMARKS, raw).await,
            Err(e) => tracing::warn!(error = %e, "Failed to encode bookmarks"),
        }
        self.save_last_position(chapter, Some(verse)).await;
        now_bookmarked
    }
}

async fn load_items(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
    let contents = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

async fn save_items(items: &BTreeMap<String, String>, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(items)?;
    fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn toggle_on_then_off_leaves_no_residue() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("state.json")).await;
        store.toggle_bookmark(1, 1, "first").await;
        let before = store.sorted_bookmarks();

        assert!(store.toggle_bookmark(2, 5, "verse").await);
        assert!(store.is_bookmarked(2, 5));
        assert!(!store.toggle_bookmark(2, 5, "verse").await);

        assert_eq!(store.sorted_bookmarks(), before);
        assert!(!store.is_bookmarked(2, 5));

        let reopened = LocalStore::open(store.path().to_path_buf()).await;
        assert_eq!(reopened.sorted_bookmarks(), before);
    }

    #[tokio::test]
    async fn bookmarks_sorted_newest_first_and_keyed_by_verse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let raw = serde_json::json!({
            "1-1": {"surahId": 1, "verseId": 1, "text": "a", "timestamp": 10},
            "2-3": {"surahId": 2, "verseId": 3, "text": "b", "timestamp": 30},
            "1-7": {"surahId": 1, "verseId": 7, "text": "c", "timestamp": 20}
        });
        let mut seed = LocalStore::open(path.clone()).await;
        seed.set_item(KEY_BOOKMARKS, raw.to_string()).await;

        let store = LocalStore::open(path).await;
        let order: Vec<String> = store
            .sorted_bookmarks()
            .iter()
            .map(|b| Bookmark::key(b.chapter, b.verse))
            .collect();
        assert_eq!(order, vec!["2-3", "1-7", "1-1"]);
    }

    #[tokio::test]
    async fn last_position_and_preferences_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = LocalStore::open(path.clone()).await;
        assert_eq!(store.theme(), Theme::Dark);
        assert_eq!(store.translation(), "en");
        assert_eq!(store.last_position(), None);

        store.set_theme(Theme::Light).await;
        store.set_translation("ur").await;
        store.save_last_position(18, None).await;

        let store = LocalStore::open(path.clone()).await;
        assert_eq!(store.theme(), Theme::Light);
        assert_eq!(store.translation(), "ur");
        assert_eq!(store.last_position(), Some(LastPosition { chapter: 18, verse: None }));
        assert_eq!(store.get_item(KEY_THEME), Some("light"));
        assert_eq!(store.get_item(KEY_LAST_POSITION), Some(r#"{"surahId":18}"#));
    }

    #[tokio::test]
    async fn bookmark_toggle_records_last_position() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("state.json")).await;
        store.toggle_bookmark(36, 12, "text").await;
        assert_eq!(store.last_position(), Some(LastPosition { chapter: 36, verse: Some(12) }));
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        let store = LocalStore::open(path).await;
        assert_eq!(store.bookmark_count(), 0);
        assert_eq!(store.theme(), Theme::Dark);
    }
}
