use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Highest chapter id in the corpus.
pub const LAST_CHAPTER: u16 = 114;

// Shared HTTP client with reasonable defaults for timeouts
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("noor/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client")
});

pub(crate) fn http_client() -> &'static Client {
    &HTTP_CLIENT
}

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revelation {
    Meccan,
    Medinan,
}

impl std::fmt::Display for Revelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revelation::Meccan => f.write_str("meccan"),
            Revelation::Medinan => f.write_str("medinan"),
        }
    }
}

/// One entry of the chapter index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChapterSummary {
    pub id: u16,
    pub name: String,
    pub transliteration: String,
    #[serde(rename = "type")]
    pub kind: Revelation,
}

impl ChapterSummary {
    /// Case-insensitive match on name or transliteration, or an exact id match.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.transliteration.to_lowercase().contains(&term)
            || self.id.to_string() == term
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Verse {
    pub id: u16,
    pub text: String,
    #[serde(default)]
    pub transliteration: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub translations: Option<HashMap<String, String>>,
}

impl Verse {
    /// Translation text for the active code, if the payload carried one.
    pub fn translation_for(&self, code: &str) -> Option<&str> {
        self.translation
            .as_deref()
            .or_else(|| self.translations.as_ref()?.get(code).map(String::as_str))
            .filter(|t| !t.is_empty())
    }

    pub fn transliteration(&self) -> Option<&str> {
        self.transliteration.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChapterDetail {
    pub id: u16,
    pub name: String,
    pub transliteration: String,
    #[serde(rename = "total_verses")]
    pub total_verse_count: u16,
    pub verses: Vec<Verse>,
}

impl ChapterDetail {
    pub fn title(&self) -> String {
        format!(
            "{}. {} ({}) — {} verses",
            self.id, self.name, self.transliteration, self.total_verse_count
        )
    }
}

/// A chapter together with which endpoint served it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterLoad {
    pub detail: ChapterDetail,
    /// False when the translation endpoint failed and the Arabic-only one was used.
    pub translated: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AudioEntry {
    #[serde(default)]
    pub file: Option<String>,
}

/// Per-chapter recitation directory keyed by `verse_<n>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioIndex {
    entries: HashMap<String, AudioEntry>,
}

impl AudioIndex {
    pub fn key(verse: u16) -> String {
        format!("verse_{verse}")
    }

    /// Accepts the upstream `{"verse": {...}}` envelope or a bare mapping.
    /// Entries that are not objects are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = match value.get("verse") {
            Some(inner) => inner.as_object()?,
            None => value.as_object()?,
        };
        let entries = map
            .iter()
            .filter(|(k, _)| k.starts_with("verse_"))
            .filter_map(|(k, v)| {
                serde_json::from_value::<AudioEntry>(v.clone())
                    .ok()
                    .map(|e| (k.clone(), e))
            })
            .collect();
        Some(Self { entries })
    }

    /// Filename of the recitation for `verse`, when present.
    pub fn file_for(&self, verse: u16) -> Option<&str> {
        self.entries
            .get(&Self::key(verse))?
            .file
            .as_deref()
            .filter(|f| !f.is_empty())
    }
}
