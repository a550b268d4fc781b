//! Application events and the reader controller that applies them.
//!
//! Loaders run as tokio tasks and report back through an unbounded channel;
//! the UI loop feeds every [`AppEvent`] and every user [`Action`] into
//! [`Reader`], which owns the view model, the local store and the playback
//! coordinator. Chapter results carry the [`LoadTicket`] they were issued
//! with, so a response that arrives after the user navigated elsewhere is
//! dropped instead of rendered.

use crate::content::{AudioIndex, ChapterLoad, ChapterSummary, ContentFetcher, JsonSource};
use crate::playback::{AudioBackend, MediaEvent, PlaybackCoordinator};
use crate::share::{self, SharePayload};
use crate::state::{AppState, Focus, LoadTicket};
use crate::store::LocalStore;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug)]
pub enum AppEvent {
    ChapterList(Option<Vec<ChapterSummary>>),
    Chapter {
        ticket: LoadTicket,
        result: Option<(ChapterLoad, Option<Arc<AudioIndex>>)>,
    },
    Media(MediaEvent),
    Alert(&'static str),
}

/// User intents, decoupled from key bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Move(isize),
    Select,
    NextChapter,
    PrevChapter,
    Play,
    ToggleBookmark,
    Share,
    ToggleBookmarksPanel,
    ToggleTheme,
    CycleTranslation,
    Refresh,
    ToggleDrawer,
    SwitchPane,
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    EndSearch,
}

pub struct Reader<S, B> {
    pub state: AppState,
    pub store: LocalStore,
    fetcher: Arc<ContentFetcher<S>>,
    coordinator: PlaybackCoordinator<B>,
    events: UnboundedSender<AppEvent>,
    share_command: Option<String>,
}

impl<S, B> Reader<S, B>
where
    S: JsonSource + 'static,
    B: AudioBackend,
{
    pub fn new(
        state: AppState,
        store: LocalStore,
        fetcher: Arc<ContentFetcher<S>>,
        backend: B,
        events: UnboundedSender<AppEvent>,
        share_command: Option<String>,
    ) -> Self {
        Self {
            state,
            store,
            fetcher,
            coordinator: PlaybackCoordinator::new(backend),
            events,
            share_command,
        }
    }

    #[cfg(test)]
    pub(crate) fn coordinator(&self) -> &PlaybackCoordinator<B> {
        &self.coordinator
    }

    /// Initial list load, then the last viewed chapter (or the first one).
    pub fn start(&mut self) {
        self.refresh_list();
        let chapter = self.store.last_position().map_or(1, |p| p.chapter);
        tracing::info!(chapter, "Resuming reader");
        self.open_chapter(chapter, None);
    }

    pub fn refresh_list(&mut self) {
        self.state.list_status = crate::state::ListStatus::Loading;
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let list = fetcher.chapter_index().await;
            let _ = tx.send(AppEvent::ChapterList(list));
        });
    }

    /// Stop playback and request `chapter`; `focus` names a verse to bring
    /// into view once it renders.
    pub fn open_chapter(&mut self, chapter: u16, focus: Option<u16>) {
        self.coordinator.stop(&mut self.state.board);
        let ticket = self.state.begin_chapter_load(chapter, focus);
        tracing::debug!(chapter, generation = ticket.generation, "Loading chapter");

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.events.clone();
        let translation = self.state.translation.clone();
        tokio::spawn(async move {
            let result = fetcher.chapter_with_audio(chapter, &translation).await;
            let _ = tx.send(AppEvent::Chapter { ticket, result });
        });
    }

    pub async fn process_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ChapterList(list) => {
                if list.is_none() {
                    tracing::warn!("Chapter list unavailable");
                }
                self.state.set_chapters(list);
            }
            AppEvent::Chapter { ticket, result } => self.handle_chapter(ticket, result).await,
            AppEvent::Media(ev) => self.coordinator.handle_media_event(ev, &mut self.state.board),
            AppEvent::Alert(msg) => self.state.status = Some(msg.to_string()),
        }
    }

    async fn handle_chapter(
        &mut self,
        ticket: LoadTicket,
        result: Option<(ChapterLoad, Option<Arc<AudioIndex>>)>,
    ) {
        let loaded = result.is_some();
        if !self
            .state
            .accept_chapter(ticket, result, self.fetcher.endpoints())
        {
            tracing::debug!(
                chapter = ticket.chapter,
                generation = ticket.generation,
                "Discarding stale chapter response"
            );
            return;
        }
        if !loaded {
            tracing::warn!(chapter = ticket.chapter, "Chapter unavailable");
            return;
        }

        let requested = self.state.pending_focus.take();
        let remembered = self
            .store
            .last_position()
            .filter(|p| p.chapter == ticket.chapter)
            .and_then(|p| p.verse);
        if let Some(verse) = requested.or(remembered) {
            self.state.focus_verse(verse);
        }
        self.store.save_last_position(ticket.chapter, requested).await;
    }

    pub async fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.coordinator.stop(&mut self.state.board);
                self.state.should_exit = true;
            }
            Action::Move(delta) => match self.state.focus {
                Focus::Chapter => self.state.move_verse(delta),
                Focus::Sidebar | Focus::Search => {
                    let n = self.store.bookmark_count();
                    self.state.move_sidebar(delta, n);
                }
            },
            Action::Select => self.select(),
            Action::NextChapter | Action::PrevChapter => {
                if let Some(id) = self.state.neighbour(action == Action::NextChapter) {
                    self.open_chapter(id, None);
                }
            }
            Action::Play => {
                if let Some((_, Some(control))) = self.state.focused_verse() {
                    let control = control.clone();
                    self.coordinator
                        .activate(&control.url, control.control, &mut self.state.board);
                }
            }
            Action::ToggleBookmark => {
                let Some(chapter) = self.state.loaded().map(|c| c.id()) else {
                    return;
                };
                if let Some((verse, _)) = self.state.focused_verse() {
                    let (id, text) = (verse.id, verse.text.clone());
                    let now = self.store.toggle_bookmark(chapter, id, &text).await;
                    self.state.status = Some(
                        if now { "Bookmark saved" } else { "Bookmark removed" }.to_string(),
                    );
                }
            }
            Action::Share => self.share_focused(),
            Action::ToggleBookmarksPanel => {
                self.state.show_bookmarks = !self.state.show_bookmarks;
                self.state.bookmark_cursor = 0;
                if self.state.show_bookmarks {
                    self.state.focus = Focus::Sidebar;
                    self.state.drawer_open = true;
                }
            }
            Action::ToggleTheme => {
                self.state.theme = self.state.theme.toggled();
                self.store.set_theme(self.state.theme).await;
            }
            Action::CycleTranslation => {
                let next = self.state.next_translation().to_string();
                self.store.set_translation(&next).await;
                self.state.translation = next;
                self.state.status = Some(format!("Translation: {}", self.state.translation));
                if let Some(id) = self.state.chapter.chapter_id() {
                    self.open_chapter(id, None);
                }
            }
            Action::Refresh => self.refresh_list(),
            Action::ToggleDrawer => {
                self.state.drawer_open = !self.state.drawer_open;
                self.state.focus = if self.state.drawer_open { Focus::Sidebar } else { Focus::Chapter };
            }
            Action::SwitchPane => {
                self.state.focus = match self.state.focus {
                    Focus::Chapter => Focus::Sidebar,
                    Focus::Sidebar | Focus::Search => Focus::Chapter,
                };
            }
            Action::StartSearch => {
                self.state.show_bookmarks = false;
                self.state.drawer_open = true;
                self.state.focus = Focus::Search;
            }
            Action::SearchInput(ch) => {
                let mut term = self.state.search.clone();
                term.push(ch);
                self.state.set_search(term);
            }
            Action::SearchBackspace => {
                let mut term = self.state.search.clone();
                term.pop();
                self.state.set_search(term);
            }
            Action::EndSearch => self.state.focus = Focus::Sidebar,
        }
    }

    fn select(&mut self) {
        match self.state.focus {
            Focus::Chapter => {}
            Focus::Search | Focus::Sidebar if self.state.show_bookmarks => {
                let list = self.store.sorted_bookmarks();
                if let Some(bm) = list.get(self.state.bookmark_cursor) {
                    self.state.show_bookmarks = false;
                    self.open_chapter(bm.chapter, Some(bm.verse));
                    self.close_drawer();
                }
            }
            Focus::Search | Focus::Sidebar => {
                if let Some(id) = self.state.selected_chapter() {
                    self.open_chapter(id, None);
                    self.close_drawer();
                }
            }
        }
    }

    fn close_drawer(&mut self) {
        self.state.drawer_open = false;
        self.state.focus = Focus::Chapter;
    }

    fn share_focused(&mut self) {
        let Some(chapter) = self.state.loaded() else {
            return;
        };
        let detail = &chapter.load.detail;
        let Some((verse, _)) = self.state.focused_verse() else {
            return;
        };
        let payload = SharePayload::verse(
            detail.id,
            verse.id,
            &verse.text,
            &detail.name,
            &detail.transliteration,
        );
        let command = self.share_command.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = share::deliver(&payload, command.as_deref()).await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, "Share failed");
            }
            let _ = tx.send(AppEvent::Alert(share::alert(&result, command.is_some())));
        });
    }
}
