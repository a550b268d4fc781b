//! URL construction for the text and audio content endpoints.

pub const DEFAULT_TEXT_BASE: &str = "https://cdn.jsdelivr.net/npm/quran-json@3.1.2/dist";
pub const DEFAULT_AUDIO_BASE: &str = "https://raw.githubusercontent.com/semarketir/quranjson/master/source";

/// Zero-pad a chapter id to three digits as the audio host expects.
pub fn pad3(id: u16) -> String {
    format!("{id:03}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    text_base: String,
    audio_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_BASE, DEFAULT_AUDIO_BASE)
    }
}

impl Endpoints {
    pub fn new(text_base: &str, audio_base: &str) -> Self {
        Self {
            text_base: text_base.trim_end_matches('/').to_string(),
            audio_base: audio_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn chapter_index_url(&self) -> String {
        format!("{}/chapters/index.json", self.text_base)
    }

    /// Translation-specific endpoint when `translation` is given, Arabic-only otherwise.
    pub fn chapter_url(&self, id: u16, translation: Option<&str>) -> String {
        match translation {
            Some(code) => format!(
                "{}/chapters/{}/{}.json",
                self.text_base,
                urlencoding::encode(code),
                id
            ),
            None => format!("{}/chapters/{}.json", self.text_base, id),
        }
    }

    pub fn audio_index_url(&self, id: u16) -> String {
        format!("{}/audio/{}/index.json", self.audio_base, pad3(id))
    }

    pub fn audio_file_url(&self, id: u16, file: &str) -> String {
        format!("{}/audio/{}/{}", self.audio_base, pad3(id), file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_upstream_urls() {
        let ep = Endpoints::new("https://text.test/dist/", "https://audio.test/source");
        assert_eq!(ep.chapter_index_url(), "https://text.test/dist/chapters/index.json");
        assert_eq!(ep.chapter_url(2, Some("en")), "https://text.test/dist/chapters/en/2.json");
        assert_eq!(ep.chapter_url(2, None), "https://text.test/dist/chapters/2.json");
        assert_eq!(ep.audio_index_url(7), "https://audio.test/source/audio/007/index.json");
        assert_eq!(
            ep.audio_file_url(114, "114001.mp3"),
            "https://audio.test/source/audio/114/114001.mp3"
        );
    }
}
