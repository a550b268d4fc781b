mod content;
mod event;
mod playback;
mod share;
mod state;
mod store;
mod text_utils;
mod ui;

use crate::content::endpoints::{DEFAULT_AUDIO_BASE, DEFAULT_TEXT_BASE};
use crate::content::{AudioIndexCache, ContentFetcher, Endpoints, HttpSource, LAST_CHAPTER};
use crate::state::AppState;
use crate::store::{LocalStore, Theme};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Application configuration from CLI
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about)]
pub struct Config {
    /// Print one surah to stdout and exit (default is the full-screen reader)
    #[arg(long, value_name = "ID", value_parser = clap::value_parser!(u16).range(1..=LAST_CHAPTER as i64))]
    print: Option<u16>,
    /// Translation code (en, ur, bn, es, fr, id, ru, sv, tr, zh). Remembered for next time.
    #[arg(long, value_name = "CODE")]
    translation: Option<String>,
    /// Colour scheme: light or dark. Remembered for next time.
    #[arg(long, value_parser = parse_theme)]
    theme: Option<Theme>,
    /// Path to the local state file (bookmarks, last position, settings)
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,
    /// Base URL of the chapter text host. Falls back to NOOR_TEXT_BASE.
    #[arg(long, value_name = "URL")]
    text_base: Option<String>,
    /// Base URL of the recitation audio host. Falls back to NOOR_AUDIO_BASE.
    #[arg(long, value_name = "URL")]
    audio_base: Option<String>,
    /// Command that receives shared verse text on stdin (run via `sh -c`).
    /// Falls back to NOOR_SHARE_COMMAND; without one, text goes to the clipboard.
    #[arg(long, value_name = "CMD")]
    share_command: Option<String>,
    /// Enable debug logging
    #[arg(long)]
    pub debug_log: bool,
    /// Write logs to this file. The reader defaults to `<data dir>/noor/noor.log`;
    /// `--print` logs to stderr unless this is given.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    Theme::parse(s).ok_or_else(|| format!("unknown theme '{s}' (expected light or dark)"))
}

fn env_fallbacks_if_empty(cli: &mut Config) {
    for (slot, var) in [
        (&mut cli.text_base, "NOOR_TEXT_BASE"),
        (&mut cli.audio_base, "NOOR_AUDIO_BASE"),
        (&mut cli.share_command, "NOOR_SHARE_COMMAND"),
    ] {
        if slot.is_none()
            && let Ok(v) = std::env::var(var)
            && !v.trim().is_empty()
        {
            *slot = Some(v.trim().to_string());
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("noor")
}

fn state_path(cfg: &Config) -> PathBuf {
    cfg.state_file.clone().unwrap_or_else(|| data_dir().join("state.json"))
}

/// Where logs go: `None` means stderr, which only `--print` may use since the
/// reader owns the terminal.
fn log_path(cfg: &Config) -> Option<PathBuf> {
    match (&cfg.log_file, cfg.print) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(_)) => None,
        (None, None) => Some(data_dir().join("noor.log")),
    }
}

fn init_tracing(cfg: &Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let default_level = if cfg.debug_log { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (to_file, to_stderr) = match log_path(cfg) {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (None, Some(fmt::layer().with_target(true).with_writer(std::io::stderr))),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(to_file)
        .with(to_stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut cfg = Config::parse();
    env_fallbacks_if_empty(&mut cfg);
    init_tracing(&cfg)?;

    let endpoints = Endpoints::new(
        cfg.text_base.as_deref().unwrap_or(DEFAULT_TEXT_BASE),
        cfg.audio_base.as_deref().unwrap_or(DEFAULT_AUDIO_BASE),
    );
    let fetcher = Arc::new(ContentFetcher::new(
        HttpSource::default(),
        endpoints,
        AudioIndexCache::new(),
    ));

    let mut store = LocalStore::open(state_path(&cfg)).await;
    if let Some(code) = cfg.translation.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        store.set_translation(code).await;
    }
    if let Some(theme) = cfg.theme {
        store.set_theme(theme).await;
    }

    let result = match cfg.print {
        Some(chapter) => {
            crate::ui::pipe::display_chapter_pipe(&*fetcher, chapter, &store.translation()).await
        }
        None => {
            let state = AppState::new(store.translation(), store.theme());
            crate::ui::modern::display_reader(fetcher, store, state, cfg.share_command.clone())
                .await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Exiting with error");
        eprintln!("{e}");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_parse() {
        let cfg = Config::try_parse_from([
            "noor", "--print", "112", "--theme", "LIGHT", "--translation", "ur", "--debug-log",
        ])
        .unwrap();
        assert_eq!(cfg.print, Some(112));
        assert_eq!(cfg.theme, Some(Theme::Light));
        assert_eq!(cfg.translation.as_deref(), Some("ur"));
        assert!(cfg.debug_log);

        assert!(Config::try_parse_from(["noor", "--print", "115"]).is_err());
        assert!(Config::try_parse_from(["noor", "--theme", "sepia"]).is_err());
    }

    #[test]
    fn explicit_state_file_wins() {
        let cfg = Config {
            state_file: Some(PathBuf::from("/tmp/x.json")),
            ..Config::default()
        };
        assert_eq!(state_path(&cfg), PathBuf::from("/tmp/x.json"));
        assert!(state_path(&Config::default()).ends_with("noor/state.json"));
    }

    #[test]
    fn reader_never_logs_to_the_terminal() {
        let reader = Config::default();
        assert!(log_path(&reader).is_some_and(|p| p.ends_with("noor/noor.log")));

        let print = Config::try_parse_from(["noor", "--print", "1"]).unwrap();
        assert_eq!(log_path(&print), None);

        let explicit = Config::try_parse_from(["noor", "--print", "1", "--log-file", "/tmp/n.log"]).unwrap();
        assert_eq!(log_path(&explicit), Some(PathBuf::from("/tmp/n.log")));
    }
}
