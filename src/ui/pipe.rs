use crate::content::{ChapterLoad, ContentFetcher, JsonSource};
use crate::text_utils::{wrap_text, wrap_with_prefix};
use std::io::Write;

const PIPE_WIDTH: usize = 80;

/// Print one chapter to stdout (stdout only, for scripting).
pub async fn display_chapter_pipe<S: JsonSource>(
    fetcher: &ContentFetcher<S>,
    chapter: u16,
    translation: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(load) = fetcher.chapter(chapter, translation).await else {
        return Err(format!("Failed to load Surah {chapter}.").into());
    };
    let mut out = std::io::stdout().lock();
    for line in render_chapter(&load, translation, PIPE_WIDTH) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

pub fn render_chapter(load: &ChapterLoad, translation: &str, width: usize) -> Vec<String> {
    let mut lines = vec![load.detail.title(), String::new()];
    for verse in &load.detail.verses {
        let prefix = format!("({}) ", verse.id);
        lines.extend(wrap_with_prefix(&prefix, &verse.text, width));
        let indent = " ".repeat(prefix.chars().count());
        for extra in [verse.transliteration(), verse.translation_for(translation)]
            .into_iter()
            .flatten()
        {
            lines.extend(
                wrap_text(extra, width.saturating_sub(indent.len()))
                    .into_iter()
                    .map(|l| format!("{indent}{l}")),
            );
        }
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fetcher::tests::MapSource;
    use crate::content::{AudioIndexCache, Endpoints};
    use serde_json::json;

    #[test]
    fn prints_title_and_verse_blocks() {
        let load = ChapterLoad {
            detail: serde_json::from_value(json!({
                "id": 112, "name": "الإخلاص", "transliteration": "Al-Ikhlas", "total_verses": 1,
                "verses": [{"id": 1, "text": "قُلْ هُوَ ٱللَّهُ أَحَدٌ", "transliteration": "Qul huwa Allahu ahad",
                            "translation": "Say, He is Allah, the One"}]
            }))
            .unwrap(),
            translated: true,
        };
        let lines = render_chapter(&load, "en", 80);
        assert_eq!(lines[0], "112. الإخلاص (Al-Ikhlas) — 1 verses");
        assert_eq!(lines[2], "(1) قُلْ هُوَ ٱللَّهُ أَحَدٌ");
        assert_eq!(lines[3], "    Qul huwa Allahu ahad");
        assert_eq!(lines[4], "    Say, He is Allah, the One");
    }

    #[tokio::test]
    async fn missing_chapter_is_an_error() {
        let f = ContentFetcher::new(MapSource::default(), Endpoints::new("t", "a"), AudioIndexCache::new());
        let err = display_chapter_pipe(&f, 7, "en").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load Surah 7.");
    }
}
