// state.rs: Reader view model (chapter list, chapter panel, playback labels)

use crate::content::{AudioIndex, ChapterLoad, ChapterSummary, Endpoints, LAST_CHAPTER, Verse};
use crate::playback::{ControlId, ControlSurface};
use crate::store::Theme;
use std::collections::HashMap;
use std::sync::Arc;

pub const TRANSLATIONS: &[&str] = &["en", "ur", "bn", "es", "fr", "id", "ru", "sv", "tr", "zh"];

/// Playing/not-playing label of every rendered playback control.
#[derive(Debug, Default)]
pub struct ControlBoard {
    playing: HashMap<ControlId, bool>,
}

impl ControlSurface for ControlBoard {
    fn set_playing(&mut self, control: ControlId, playing: bool) {
        self.playing.insert(control, playing);
    }
}

impl ControlBoard {
    pub fn is_playing(&self, control: ControlId) -> bool {
        self.playing.get(&control).copied().unwrap_or(false)
    }

    pub fn label(&self, control: ControlId) -> &'static str {
        if self.is_playing(control) { "⏸ Pause" } else { "▶ Play" }
    }

    fn clear(&mut self) {
        self.playing.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Failed,
    Ready,
}

impl ListStatus {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ListStatus::Loading => Some("Loading surah list..."),
            ListStatus::Failed => Some("Failed to load surah list."),
            ListStatus::Ready => None,
        }
    }
}

/// Play control wired for one verse: present only when the audio index
/// names a file for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseControl {
    pub control: ControlId,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct LoadedChapter {
    pub load: ChapterLoad,
    pub controls: Vec<Option<VerseControl>>,
}

impl LoadedChapter {
    /// Build one optional control per verse from the audio index.
    pub fn new(load: ChapterLoad, audio: Option<&AudioIndex>, endpoints: &Endpoints) -> Self {
        let chapter = load.detail.id;
        let controls = load
            .detail
            .verses
            .iter()
            .map(|verse| {
                let file = audio?.file_for(verse.id)?;
                Some(VerseControl {
                    control: ControlId {
                        chapter,
                        verse: verse.id,
                    },
                    url: endpoints.audio_file_url(chapter, file),
                })
            })
            .collect();
        Self { load, controls }
    }

    pub fn id(&self) -> u16 {
        self.load.detail.id
    }

    pub fn verses(&self) -> &[Verse] {
        &self.load.detail.verses
    }

    pub fn position_of(&self, verse: u16) -> Option<usize> {
        self.verses().iter().position(|v| v.id == verse)
    }
}

#[derive(Debug, Clone)]
pub enum ChapterPanel {
    Empty,
    Loading(u16),
    Failed(u16),
    Loaded(Box<LoadedChapter>),
}

impl ChapterPanel {
    pub fn chapter_id(&self) -> Option<u16> {
        match self {
            ChapterPanel::Empty => None,
            ChapterPanel::Loading(id) | ChapterPanel::Failed(id) => Some(*id),
            ChapterPanel::Loaded(c) => Some(c.id()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Search,
    Chapter,
}

/// Outstanding chapter request; a result is applied only while its
/// generation is still the newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub chapter: u16,
}

pub struct AppState {
    pub chapters: Vec<ChapterSummary>,
    pub list_status: ListStatus,
    pub search: String,
    pub sidebar_cursor: usize,
    pub show_bookmarks: bool,
    pub bookmark_cursor: usize,
    pub chapter: ChapterPanel,
    pub verse_cursor: usize,
    pub generation: u64,
    /// Verse to focus once the pending chapter renders.
    pub pending_focus: Option<u16>,
    pub translation: String,
    pub theme: Theme,
    pub drawer_open: bool,
    pub focus: Focus,
    pub status: Option<String>,
    pub board: ControlBoard,
    pub should_exit: bool,
}

impl AppState {
    pub fn new(translation: String, theme: Theme) -> Self {
        Self {
            chapters: Vec::new(),
            list_status: ListStatus::Loading,
            search: String::new(),
            sidebar_cursor: 0,
            show_bookmarks: false,
            bookmark_cursor: 0,
            chapter: ChapterPanel::Empty,
            verse_cursor: 0,
            generation: 0,
            pending_focus: None,
            translation,
            theme,
            drawer_open: false,
            focus: Focus::Chapter,
            status: None,
            board: ControlBoard::default(),
            should_exit: false,
        }
    }

    pub fn filtered_chapters(&self) -> Vec<&ChapterSummary> {
        self.chapters.iter().filter(|c| c.matches(&self.search)).collect()
    }

    pub fn set_chapters(&mut self, list: Option<Vec<ChapterSummary>>) {
        match list {
            Some(list) => {
                self.chapters = list;
                self.list_status = ListStatus::Ready;
            }
            None => self.list_status = ListStatus::Failed,
        }
        self.clamp_sidebar();
    }

    pub fn set_search(&mut self, term: String) {
        self.search = term;
        self.sidebar_cursor = 0;
    }

    pub fn clamp_sidebar(&mut self) {
        let len = self.filtered_chapters().len();
        self.sidebar_cursor = self.sidebar_cursor.min(len.saturating_sub(1));
    }

    pub fn selected_chapter(&self) -> Option<u16> {
        self.filtered_chapters().get(self.sidebar_cursor).map(|c| c.id)
    }

    pub fn chapter_name(&self, id: u16) -> String {
        self.chapters
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Surah {id}"))
    }

    /// Start a new chapter request, superseding any in flight.
    pub fn begin_chapter_load(&mut self, chapter: u16, focus: Option<u16>) -> LoadTicket {
        self.generation += 1;
        self.chapter = ChapterPanel::Loading(chapter);
        self.pending_focus = focus;
        self.verse_cursor = 0;
        self.board.clear();
        LoadTicket {
            generation: self.generation,
            chapter,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply a chapter result. Returns false when the ticket is stale.
    pub fn accept_chapter(
        &mut self,
        ticket: LoadTicket,
        result: Option<(ChapterLoad, Option<Arc<AudioIndex>>)>,
        endpoints: &Endpoints,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.chapter = match result {
            Some((load, audio)) => {
                ChapterPanel::Loaded(Box::new(LoadedChapter::new(load, audio.as_deref(), endpoints)))
            }
            None => ChapterPanel::Failed(ticket.chapter),
        };
        true
    }

    /// Move the verse cursor to `verse` in the loaded chapter.
    pub fn focus_verse(&mut self, verse: u16) -> bool {
        let ChapterPanel::Loaded(c) = &self.chapter else {
            return false;
        };
        match c.position_of(verse) {
            Some(idx) => {
                self.verse_cursor = idx;
                true
            }
            None => false,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedChapter> {
        match &self.chapter {
            ChapterPanel::Loaded(c) => Some(c),
            _ => None,
        }
    }

    pub fn focused_verse(&self) -> Option<(&Verse, Option<&VerseControl>)> {
        let c = self.loaded()?;
        let verse = c.verses().get(self.verse_cursor)?;
        let control = c.controls.get(self.verse_cursor).and_then(Option::as_ref);
        Some((verse, control))
    }

    pub fn move_verse(&mut self, delta: isize) {
        let len = self.loaded().map(|c| c.verses().len()).unwrap_or(0);
        self.verse_cursor = step(self.verse_cursor, delta, len);
    }

    pub fn move_sidebar(&mut self, delta: isize, bookmark_len: usize) {
        if self.show_bookmarks {
            self.bookmark_cursor = step(self.bookmark_cursor, delta, bookmark_len);
        } else {
            let len = self.filtered_chapters().len();
            self.sidebar_cursor = step(self.sidebar_cursor, delta, len);
        }
    }

    /// Neighbouring chapter id, clamped to the corpus.
    pub fn neighbour(&self, forward: bool) -> Option<u16> {
        let id = self.chapter.chapter_id()?;
        match forward {
            true if id < LAST_CHAPTER => Some(id + 1),
            false if id > 1 => Some(id - 1),
            _ => None,
        }
    }

    pub fn next_translation(&self) -> &'static str {
        let pos = TRANSLATIONS.iter().position(|t| *t == self.translation);
        match pos {
            Some(i) => TRANSLATIONS[(i + 1) % TRANSLATIONS.len()],
            None => TRANSLATIONS[0],
        }
    }
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ChapterDetail;
    use serde_json::json;

    fn load(id: u16, verses: u16) -> ChapterLoad {
        let verses: Vec<_> = (1..=verses).map(|v| json!({"id": v, "text": "نص"})).collect();
        let detail: ChapterDetail = serde_json::from_value(json!({
            "id": id,
            "name": "الفاتحة",
            "transliteration": "Al-Fatihah",
            "total_verses": verses.len(),
            "verses": verses
        }))
        .unwrap();
        ChapterLoad {
            detail,
            translated: true,
        }
    }

    fn summaries() -> Option<Vec<ChapterSummary>> {
        serde_json::from_value(json!([
            {"id": 1, "name": "الفاتحة", "transliteration": "Al-Fatihah", "type": "meccan"},
            {"id": 2, "name": "البقرة", "transliteration": "Al-Baqarah", "type": "medinan"},
            {"id": 3, "name": "آل عمران", "transliteration": "Ali 'Imran", "type": "medinan"}
        ]))
        .ok()
    }

    #[test]
    fn stale_chapter_result_is_discarded() {
        let ep = Endpoints::new("t", "a");
        let mut state = AppState::new("en".into(), Theme::Dark);
        let old = state.begin_chapter_load(1, None);
        let new = state.begin_chapter_load(2, None);

        assert!(!state.accept_chapter(old, Some((load(1, 7), None)), &ep));
        assert!(matches!(state.chapter, ChapterPanel::Loading(2)));

        assert!(state.accept_chapter(new, None, &ep));
        assert!(matches!(state.chapter, ChapterPanel::Failed(2)));
    }

    #[test]
    fn controls_only_for_verses_with_audio_files() {
        let ep = Endpoints::new("t", "https://audio.test");
        let index = AudioIndex::from_value(&json!({"verse": {"verse_1": {"file": "001001.mp3"}, "verse_3": {}}}));
        let chapter = LoadedChapter::new(load(1, 3), index.as_ref(), &ep);

        let first = chapter.controls[0].as_ref().unwrap();
        assert_eq!(first.url, "https://audio.test/audio/001/001001.mp3");
        assert_eq!(first.control, ControlId { chapter: 1, verse: 1 });
        assert!(chapter.controls[1].is_none());
        assert!(chapter.controls[2].is_none());

        let silent = LoadedChapter::new(load(1, 3), None, &ep);
        assert!(silent.controls.iter().all(Option::is_none));
    }

    #[test]
    fn search_filters_and_resets_cursor() {
        let mut state = AppState::new("en".into(), Theme::Dark);
        state.set_chapters(summaries());
        state.sidebar_cursor = 2;

        state.set_search("baq".into());
        assert_eq!(state.sidebar_cursor, 0);
        assert_eq!(state.selected_chapter(), Some(2));

        state.set_search("3".into());
        assert_eq!(state.selected_chapter(), Some(3));

        state.set_search("zzz".into());
        assert!(state.filtered_chapters().is_empty());
        assert_eq!(state.selected_chapter(), None);
    }

    #[test]
    fn failed_list_keeps_status() {
        let mut state = AppState::new("en".into(), Theme::Dark);
        state.set_chapters(None);
        assert_eq!(state.list_status.message(), Some("Failed to load surah list."));
        assert_eq!(state.chapter_name(4), "Surah 4");
    }

    #[test]
    fn neighbours_clamp_to_corpus() {
        let ep = Endpoints::default();
        let mut state = AppState::new("en".into(), Theme::Dark);
        let t = state.begin_chapter_load(1, None);
        state.accept_chapter(t, Some((load(1, 1), None)), &ep);
        assert_eq!(state.neighbour(false), None);
        assert_eq!(state.neighbour(true), Some(2));

        state.begin_chapter_load(LAST_CHAPTER, None);
        assert_eq!(state.neighbour(true), None);
        assert_eq!(state.neighbour(false), Some(113));
    }

    #[test]
    fn focus_and_cursor_movement() {
        let ep = Endpoints::default();
        let mut state = AppState::new("en".into(), Theme::Dark);
        let t = state.begin_chapter_load(1, Some(5));
        state.accept_chapter(t, Some((load(1, 7), None)), &ep);

        assert!(state.focus_verse(5));
        assert_eq!(state.focused_verse().map(|(v, _)| v.id), Some(5));
        assert!(!state.focus_verse(99));

        state.move_verse(10);
        assert_eq!(state.verse_cursor, 6);
        state.move_verse(-100);
        assert_eq!(state.verse_cursor, 0);
    }

    #[test]
    fn translation_cycles() {
        let mut state = AppState::new("zh".into(), Theme::Dark);
        assert_eq!(state.next_translation(), "en");
        state.translation = "xx".into();
        assert_eq!(state.next_translation(), "en");
        state.translation = "en".into();
        assert_eq!(state.next_translation(), "ur");
    }
}
