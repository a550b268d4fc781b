// content/mod.rs - remote chapter text, chapter index and audio index access
pub mod audio_index;
pub mod endpoints;
pub mod fetcher;
pub mod types;

pub use audio_index::AudioIndexCache;
pub use endpoints::Endpoints;
pub use fetcher::{ContentFetcher, HttpSource, JsonSource};
pub use types::{AudioIndex, ChapterDetail, ChapterLoad, ChapterSummary, LAST_CHAPTER, Verse};
