//! Full-screen reader.
//!
//! The event loop uses `tokio::select!` to handle:
//! - Loader results (chapter list, chapter detail with audio index, share alerts)
//! - Media events from the audio thread
//! - Keyboard input forwarded from a dedicated polling thread

use crate::content::{ContentFetcher, JsonSource};
use crate::event::{Action, AppEvent, Reader};
use crate::playback::{AudioBackend, MediaEvent, RodioBackend};
use crate::state::{AppState, Focus};
use crate::store::LocalStore;
use crate::ui::modern_helpers;
use crate::ui::styles::ReaderStyles;
use crossterm::{
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type Term = Terminal<CrosstermBackend<Stdout>>;

/// Run the reader until the user quits. Playback is stopped and the
/// terminal restored on every exit path.
pub async fn display_reader<S: JsonSource + 'static>(
    fetcher: Arc<ContentFetcher<S>>,
    store: LocalStore,
    state: AppState,
    share_command: Option<String>,
) -> Result<(), BoxError> {
    let (app_tx, app_rx) = mpsc::unbounded_channel();
    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let backend = RodioBackend::spawn(media_tx);
    let mut reader = Reader::new(state, store, fetcher, backend, app_tx, share_command);

    enable_raw_mode().map_err(to_boxed_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(to_boxed_err)?;
    let result = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(mut terminal) => run_loop(&mut terminal, &mut reader, app_rx, media_rx).await,
        Err(e) => Err(to_boxed_err(e)),
    };

    if !reader.state.should_exit {
        reader.apply(Action::Quit).await;
    }
    disable_raw_mode().map_err(to_boxed_err)?;
    execute!(io::stdout(), LeaveAlternateScreen).map_err(to_boxed_err)?;
    result
}

async fn run_loop<S, B>(
    terminal: &mut Term,
    reader: &mut Reader<S, B>,
    mut app_rx: mpsc::UnboundedReceiver<AppEvent>,
    mut media_rx: mpsc::UnboundedReceiver<MediaEvent>,
) -> Result<(), BoxError>
where
    S: JsonSource + 'static,
    B: AudioBackend,
{
    // Single background thread polls crossterm and forwards into the runtime;
    // try_send failing means the loop is gone and the thread should stop.
    let (input_tx, mut input_rx) = mpsc::channel(32);
    thread::spawn(move || {
        loop {
            match crossterm::event::poll(std::time::Duration::from_millis(100)) {
                Ok(true) => {
                    if let Ok(ev) = crossterm::event::read()
                        && input_tx.try_send(ev).is_err()
                    {
                        break;
                    }
                }
                Ok(false) => {
                    if input_tx.is_closed() {
                        break;
                    }
                }
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(100)),
            }
        }
    });

    reader.start();
    redraw(terminal, reader)?;

    while !reader.state.should_exit {
        tokio::select! {
            Some(event) = app_rx.recv() => {
                reader.process_event(event).await;
            }

            Some(event) = media_rx.recv() => {
                reader.process_event(AppEvent::Media(event)).await;
            }

            maybe_input = input_rx.recv() => {
                let Some(input) = maybe_input else {
                    reader.state.should_exit = true;
                    continue;
                };
                if let Event::Key(key) = input
                    && key.kind != KeyEventKind::Release
                {
                    reader.state.status = None;
                    if let Some(action) = map_key(key, reader.state.focus) {
                        reader.apply(action).await;
                    }
                }
            }
        }
        redraw(terminal, reader)?;
    }
    Ok(())
}

fn redraw<S, B>(terminal: &mut Term, reader: &Reader<S, B>) -> Result<(), BoxError> {
    let styles = ReaderStyles::for_theme(reader.state.theme);
    terminal
        .draw(|f| modern_helpers::draw(f, &reader.state, &reader.store, &styles))
        .map_err(to_boxed_err)?;
    Ok(())
}

/// Key bindings. While the search box has focus, printable keys edit the
/// search term instead of triggering commands.
pub fn map_key(key: KeyEvent, focus: Focus) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    let action = match (focus, key.code) {
        (Focus::Search, KeyCode::Char(ch)) => Action::SearchInput(ch),
        (Focus::Search, KeyCode::Backspace) => Action::SearchBackspace,
        (Focus::Search, KeyCode::Esc) => Action::EndSearch,
        (_, KeyCode::Char('q') | KeyCode::Esc) => Action::Quit,
        (_, KeyCode::Enter) => Action::Select,
        (_, KeyCode::Down | KeyCode::Char('j')) => Action::Move(1),
        (_, KeyCode::Up | KeyCode::Char('k')) => Action::Move(-1),
        (_, KeyCode::PageDown) => Action::Move(10),
        (_, KeyCode::PageUp) => Action::Move(-10),
        (_, KeyCode::Char('n') | KeyCode::Right) => Action::NextChapter,
        (_, KeyCode::Char('p') | KeyCode::Left) => Action::PrevChapter,
        (_, KeyCode::Char(' ')) => Action::Play,
        (_, KeyCode::Char('b')) => Action::ToggleBookmark,
        (_, KeyCode::Char('B')) => Action::ToggleBookmarksPanel,
        (_, KeyCode::Char('s')) => Action::Share,
        (_, KeyCode::Char('t')) => Action::ToggleTheme,
        (_, KeyCode::Char('T')) => Action::CycleTranslation,
        (_, KeyCode::Char('r')) => Action::Refresh,
        (_, KeyCode::Char('/')) => Action::StartSearch,
        (_, KeyCode::Tab) => Action::ToggleDrawer,
        (_, KeyCode::BackTab) => Action::SwitchPane,
        _ => return None,
    };
    Some(action)
}

fn to_boxed_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> BoxError {
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn search_focus_captures_letters() {
        assert_eq!(map_key(key(KeyCode::Char('q')), Focus::Search), Some(Action::SearchInput('q')));
        assert_eq!(map_key(key(KeyCode::Esc), Focus::Search), Some(Action::EndSearch));
        assert_eq!(map_key(key(KeyCode::Enter), Focus::Search), Some(Action::Select));
        assert_eq!(map_key(key(KeyCode::Down), Focus::Search), Some(Action::Move(1)));
    }

    #[test]
    fn reader_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('q')), Focus::Chapter), Some(Action::Quit));
        assert_eq!(map_key(key(KeyCode::Char(' ')), Focus::Chapter), Some(Action::Play));
        assert_eq!(map_key(key(KeyCode::Char('B')), Focus::Sidebar), Some(Action::ToggleBookmarksPanel));
        assert_eq!(map_key(key(KeyCode::F(5)), Focus::Chapter), None);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c, Focus::Search), Some(Action::Quit));
    }
}
