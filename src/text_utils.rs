// src/text_utils.rs
// Text layout helpers shared by the terminal and pipe renderers

/// Centre a string within a given width.
pub fn pad_centered(text: &str, width: usize) -> String {
    let line_width = text.chars().count();
    let pad_left = width.saturating_sub(line_width) / 2;
    format!("{}{}", " ".repeat(pad_left), text)
}

/// Wrap text to a given width at word boundaries. Never returns an empty
/// vector, so every verse occupies at least one row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|l| l.into_owned())
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Wrap with a fixed prefix on the first line and matching indentation on
/// continuation lines, e.g. `(12) ` before a verse.
pub fn wrap_with_prefix(prefix: &str, text: &str, width: usize) -> Vec<String> {
    let indent = " ".repeat(prefix.chars().count());
    let opts = textwrap::Options::new(width.max(prefix.chars().count() + 1))
        .initial_indent(prefix)
        .subsequent_indent(&indent);
    let lines: Vec<String> = textwrap::wrap(text, opts)
        .into_iter()
        .map(|l| l.into_owned())
        .collect();
    if lines.is_empty() { vec![prefix.to_string()] } else { lines }
}
