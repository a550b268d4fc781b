use crate::store::Theme;
use ratatui::style::{Color, Modifier, Style};

/// Styles for one colour scheme.
pub struct ReaderStyles {
    pub base: Style,
    pub border: Style,
    pub title: Style,
    pub arabic: Style,
    pub transliteration: Style,
    pub translation: Style,
    pub selected: Style,
    pub focused_card: Style,
    pub control: Style,
    pub control_playing: Style,
    pub bookmark: Style,
    pub muted: Style,
    pub status: Style,
}

impl ReaderStyles {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    fn dark() -> Self {
        let fg = Color::Gray;
        Self {
            base: Style::default().fg(fg).bg(Color::Black),
            border: Style::default().fg(Color::DarkGray),
            title: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            arabic: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            transliteration: Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            translation: Style::default().fg(fg),
            selected: Style::default().fg(Color::Black).bg(Color::Green),
            focused_card: Style::default().fg(Color::Green),
            control: Style::default().fg(Color::Yellow),
            control_playing: Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
            bookmark: Style::default().fg(Color::Yellow),
            muted: Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
            status: Style::default().fg(Color::Black).bg(Color::DarkGray),
        }
    }

    fn light() -> Self {
        let fg = Color::Black;
        Self {
            base: Style::default().fg(fg).bg(Color::White),
            border: Style::default().fg(Color::Gray),
            title: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            arabic: Style::default().fg(Color::Black).add_modifier(Modifier::BOLD),
            transliteration: Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
            translation: Style::default().fg(fg),
            selected: Style::default().fg(Color::White).bg(Color::Blue),
            focused_card: Style::default().fg(Color::Blue),
            control: Style::default().fg(Color::Red),
            control_playing: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            bookmark: Style::default().fg(Color::Red),
            muted: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            status: Style::default().fg(Color::White).bg(Color::Gray),
        }
    }
}
