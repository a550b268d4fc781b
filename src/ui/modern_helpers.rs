use crate::state::{AppState, ChapterPanel, Focus, LoadedChapter};
use crate::store::{Bookmark, LocalStore};
use crate::text_utils::{pad_centered, wrap_text, wrap_with_prefix};
use crate::ui::styles::ReaderStyles;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Terminals at least this wide show the sidebar next to the chapter.
pub const WIDE_LAYOUT: u16 = 90;
const SIDEBAR_WIDTH: u16 = 34;

pub fn draw(f: &mut Frame, state: &AppState, store: &LocalStore, styles: &ReaderStyles) {
    let area = f.area();
    f.render_widget(Block::default().style(styles.base), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let (main, status) = (rows[0], rows[1]);

    if main.width >= WIDE_LAYOUT {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(main);
        draw_sidebar(f, cols[0], state, store, styles);
        draw_chapter(f, cols[1], state, store, styles);
    } else {
        draw_chapter(f, main, state, store, styles);
        if state.drawer_open {
            let drawer = Rect {
                width: SIDEBAR_WIDTH.min(main.width),
                ..main
            };
            f.render_widget(Clear, drawer);
            draw_sidebar(f, drawer, state, store, styles);
        }
    }

    draw_status(f, status, state, styles);
}

fn draw_sidebar(f: &mut Frame, area: Rect, state: &AppState, store: &LocalStore, styles: &ReaderStyles) {
    let title = if state.show_bookmarks { "Saved Bookmarks" } else { "Surahs" };
    let border = if state.focus == Focus::Chapter { styles.border } else { styles.focused_card };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title, styles.title))
        .style(styles.base);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    if !state.show_bookmarks {
        let cursor = if state.focus == Focus::Search { "_" } else { "" };
        let search = if state.search.is_empty() && state.focus != Focus::Search {
            Span::styled("/ Search surah...", styles.muted)
        } else {
            Span::raw(format!("/ {}{cursor}", state.search))
        };
        lines.push(Line::from(search));
        lines.push(Line::from(""));
    }

    let (entries, selected) = if state.show_bookmarks {
        (bookmark_lines(state, &store.sorted_bookmarks(), styles), state.bookmark_cursor)
    } else {
        (chapter_list_lines(state, styles), state.sidebar_cursor)
    };

    // Each entry is two rows; keep the selected one on screen.
    let room = (inner.height as usize).saturating_sub(lines.len()) / 2;
    let skip = (selected + 1).saturating_sub(room.max(1));
    for entry in entries.into_iter().skip(skip) {
        lines.extend(entry);
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn chapter_list_lines(state: &AppState, styles: &ReaderStyles) -> Vec<Vec<Line<'static>>> {
    if let Some(msg) = state.list_status.message() {
        return vec![vec![Line::from(Span::styled(msg, styles.muted))]];
    }
    let filtered = state.filtered_chapters();
    if filtered.is_empty() {
        return vec![vec![Line::from(Span::styled("No surah found.", styles.muted))]];
    }
    filtered
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let selected = i == state.sidebar_cursor && state.focus != Focus::Chapter;
            let current = state.chapter.chapter_id() == Some(c.id);
            let head = if selected {
                styles.selected
            } else if current {
                styles.title
            } else {
                styles.base
            };
            vec![
                Line::from(Span::styled(format!("{}. {}", c.id, c.name), head)),
                Line::from(Span::styled(
                    format!("   {} - {}", c.transliteration, c.kind),
                    styles.muted,
                )),
            ]
        })
        .collect()
}

fn bookmark_lines(state: &AppState, bookmarks: &[Bookmark], styles: &ReaderStyles) -> Vec<Vec<Line<'static>>> {
    if bookmarks.is_empty() {
        return vec![vec![Line::from(Span::styled("No saved bookmarks.", styles.muted))]];
    }
    bookmarks
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let head = if i == state.bookmark_cursor && state.focus != Focus::Chapter {
                styles.selected
            } else {
                styles.bookmark
            };
            let snippet: String = b.text.chars().take(28).collect();
            vec![
                Line::from(Span::styled(
                    format!("{} · Ayah {}", state.chapter_name(b.chapter), b.verse),
                    head,
                )),
                Line::from(Span::styled(format!("   {snippet}"), styles.muted)),
            ]
        })
        .collect()
}

fn draw_chapter(f: &mut Frame, area: Rect, state: &AppState, store: &LocalStore, styles: &ReaderStyles) {
    let border = if state.focus == Focus::Chapter { styles.focused_card } else { styles.border };
    let block = Block::default().borders(Borders::ALL).border_style(border).style(styles.base);
    let inner = block.inner(area);

    let message = match &state.chapter {
        ChapterPanel::Empty => None,
        ChapterPanel::Loading(id) => Some(format!("Loading Surah {id}...")),
        ChapterPanel::Failed(id) => Some(format!("Failed to load Surah {id}.")),
        ChapterPanel::Loaded(chapter) => {
            let block = block.title(Span::styled(chapter.load.detail.title(), styles.title));
            f.render_widget(block, area);
            let rendered = chapter_lines(chapter, state, store, styles, inner.width as usize);
            let offset = scroll_offset(rendered.focused_row, inner.height as usize);
            f.render_widget(Paragraph::new(rendered.lines).scroll((offset as u16, 0)), inner);
            return;
        }
    };
    f.render_widget(block, area);
    if let Some(msg) = message {
        let mut lines: Vec<Line> = vec![Line::from(""); (inner.height / 2) as usize];
        lines.push(Line::from(Span::styled(pad_centered(&msg, inner.width as usize), styles.muted)));
        f.render_widget(Paragraph::new(lines), inner);
    }
}

/// Rendered verse cards plus the row where the focused card begins.
pub struct ChapterLines {
    pub lines: Vec<Line<'static>>,
    pub focused_row: usize,
}

pub fn chapter_lines(
    chapter: &LoadedChapter,
    state: &AppState,
    store: &LocalStore,
    styles: &ReaderStyles,
    width: usize,
) -> ChapterLines {
    let width = width.max(10);
    let mut lines = Vec::new();
    let mut focused_row = 0;
    let chapter_id = chapter.id();

    if !chapter.load.translated {
        lines.push(Line::from(Span::styled(
            format!("Translation '{}' unavailable; showing Arabic only.", state.translation),
            styles.muted,
        )));
        lines.push(Line::from(""));
    }

    for (idx, verse) in chapter.verses().iter().enumerate() {
        let focused = idx == state.verse_cursor;
        if focused {
            focused_row = lines.len();
        }
        let marker = if focused { "▌" } else { " " };
        let marker_style = if focused { styles.focused_card } else { styles.base };

        let prefix = format!("({}) ", verse.id);
        for row in wrap_with_prefix(&prefix, &verse.text, width - 1) {
            lines.push(Line::from(vec![
                Span::styled(marker, marker_style),
                Span::styled(row, styles.arabic),
            ]));
        }
        if let Some(t) = verse.transliteration() {
            for row in wrap_text(t, width - 1) {
                lines.push(Line::from(vec![
                    Span::styled(marker, marker_style),
                    Span::styled(row, styles.transliteration),
                ]));
            }
        }
        if let Some(t) = verse.translation_for(&state.translation) {
            for row in wrap_text(t, width - 1) {
                lines.push(Line::from(vec![
                    Span::styled(marker, marker_style),
                    Span::styled(row, styles.translation),
                ]));
            }
        }

        let mut controls = vec![Span::styled(marker, marker_style)];
        if let Some(Some(vc)) = chapter.controls.get(idx) {
            let playing = state.board.is_playing(vc.control);
            let style = if playing { styles.control_playing } else { styles.control };
            controls.push(Span::styled(format!("[{}]", state.board.label(vc.control)), style));
            controls.push(Span::raw(" "));
        }
        let bookmark = if store.is_bookmarked(chapter_id, verse.id) {
            Span::styled("★ Bookmarked", styles.bookmark)
        } else {
            Span::styled("☆ Bookmark", styles.muted)
        };
        controls.push(bookmark);
        lines.push(Line::from(controls));
        lines.push(Line::from(""));
    }

    ChapterLines { lines, focused_row }
}

/// Keep the focused card in the upper third of the viewport.
pub fn scroll_offset(focused_row: usize, height: usize) -> usize {
    focused_row.saturating_sub(height / 3)
}

fn draw_status(f: &mut Frame, area: Rect, state: &AppState, styles: &ReaderStyles) {
    let text = match &state.status {
        Some(msg) => msg.clone(),
        None => format!(
            "q quit  / search  n/p surah  Space play  b bookmark  s share  B bookmarks  t theme  T lang [{}]",
            state.translation
        ),
    };
    f.render_widget(Paragraph::new(Line::from(text)).style(styles.status), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{AudioIndex, ChapterLoad, Endpoints};
    use crate::playback::{ControlId, ControlSurface};
    use crate::store::Theme;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;

    fn loaded_state() -> AppState {
        let detail = serde_json::from_value(json!({
            "id": 1, "name": "الفاتحة", "transliteration": "Al-Fatihah", "total_verses": 2,
            "verses": [
                {"id": 1, "text": "بِسْمِ", "transliteration": "Bismillah", "translation": "In the name of God"},
                {"id": 2, "text": "ٱلْحَمْدُ", "translation": "All praise"}
            ]
        }))
        .unwrap();
        let load = ChapterLoad { detail, translated: true };
        let index = AudioIndex::from_value(&json!({"verse": {"verse_1": {"file": "001001.mp3"}}}));
        let mut state = AppState::new("en".into(), Theme::Dark);
        let ticket = state.begin_chapter_load(1, None);
        state.accept_chapter(ticket, Some((load, index.map(std::sync::Arc::new))), &Endpoints::default());
        state
    }

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[tokio::test]
    async fn cards_show_controls_only_with_audio() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("s.json")).await;
        store.toggle_bookmark(1, 2, "ٱلْحَمْدُ").await;
        let mut state = loaded_state();
        state.board.set_playing(ControlId { chapter: 1, verse: 1 }, true);
        state.verse_cursor = 1;

        let styles = ReaderStyles::for_theme(Theme::Dark);
        let chapter = state.loaded().unwrap();
        let out = chapter_lines(chapter, &state, &store, &styles, 60);
        let text = text_of(&out.lines);

        assert_eq!(text[0], " (1) بِسْمِ");
        assert!(text.contains(&" [⏸ Pause] ☆ Bookmark".to_string()));
        assert!(text.contains(&"▌★ Bookmarked".to_string()));
        assert_eq!(text[out.focused_row], "▌(2) ٱلْحَمْدُ");
    }

    #[tokio::test]
    async fn narrow_terminal_hides_sidebar_until_drawer_opens() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("s.json")).await;
        let mut state = loaded_state();
        let styles = ReaderStyles::for_theme(Theme::Light);

        let mut term = Terminal::new(TestBackend::new(60, 20)).unwrap();
        term.draw(|f| draw(f, &state, &store, &styles)).unwrap();
        let screen = format!("{:?}", term.backend().buffer());
        assert!(!screen.contains("Surahs"));

        state.drawer_open = true;
        state.focus = Focus::Sidebar;
        term.draw(|f| draw(f, &state, &store, &styles)).unwrap();
        let screen = format!("{:?}", term.backend().buffer());
        assert!(screen.contains("Surahs"));
        assert!(screen.contains("Loading surah list..."));
    }

    #[test]
    fn scroll_keeps_focus_in_upper_third() {
        assert_eq!(scroll_offset(5, 30), 0);
        assert_eq!(scroll_offset(40, 30), 30);
    }
}
