//! Sharing a verse: an external share command when configured, otherwise the
//! terminal clipboard via an OSC 52 escape sequence.

use crossterm::clipboard::CopyToClipboard;
use crossterm::execute;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("could not run share command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("share command exited with {0}")]
    Status(std::process::ExitStatus),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
}

impl SharePayload {
    pub fn verse(chapter: u16, verse: u16, text: &str, name: &str, transliteration: &str) -> Self {
        Self {
            title: format!("Surah {chapter} Ayah {verse}"),
            text: format!(
                "Surah {chapter} ({name} / {transliteration}), Ayah {verse}:\n\n{text}\n\n— Qur'an Viewer"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied,
}

/// Hand the payload to `command` (run through the shell, text on stdin,
/// title in `NOOR_SHARE_TITLE`) or copy it to the clipboard when no command
/// is configured.
pub async fn deliver(payload: &SharePayload, command: Option<&str>) -> Result<ShareOutcome, ShareError> {
    match command {
        Some(cmd) => {
            run_share_command(cmd, payload).await?;
            Ok(ShareOutcome::Shared)
        }
        None => {
            execute!(std::io::stdout(), CopyToClipboard::to_clipboard_from(payload.text.as_bytes()))
                .map_err(|e| ShareError::Clipboard(e.to_string()))?;
            Ok(ShareOutcome::Copied)
        }
    }
}

async fn run_share_command(cmd: &str, payload: &SharePayload) -> Result<(), ShareError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .env("NOOR_SHARE_TITLE", &payload.title)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take()
        && let Err(e) = stdin.write_all(payload.text.as_bytes()).await
        && e.kind() != std::io::ErrorKind::BrokenPipe
    {
        return Err(e.into());
    }
    let status = child.wait().await?;
    if !status.success() {
        return Err(ShareError::Status(status));
    }
    Ok(())
}

/// Status-line message for a share attempt.
pub fn alert(result: &Result<ShareOutcome, ShareError>, via_command: bool) -> &'static str {
    match result {
        Ok(ShareOutcome::Shared) => "Shared",
        Ok(ShareOutcome::Copied) => "Ayah text copied to clipboard",
        Err(_) if via_command => "Sharing canceled or failed",
        Err(_) => "Failed to copy ayah text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_share_text() {
        let p = SharePayload::verse(1, 2, "ٱلْحَمْدُ", "الفاتحة", "Al-Fatihah");
        assert_eq!(p.title, "Surah 1 Ayah 2");
        assert_eq!(
            p.text,
            "Surah 1 (الفاتحة / Al-Fatihah), Ayah 2:\n\nٱلْحَمْدُ\n\n— Qur'an Viewer"
        );
    }

    #[tokio::test]
    async fn share_command_receives_text_and_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("shared.txt");
        let payload = SharePayload::verse(2, 255, "text", "البقرة", "Al-Baqarah");

        let cmd = format!("cat > '{}'", out.display());
        let ok = deliver(&payload, Some(&cmd)).await;
        assert_eq!(alert(&ok, true), "Shared");
        assert_eq!(std::fs::read_to_string(&out).unwrap(), payload.text);

        let failed = deliver(&payload, Some("exit 3")).await;
        assert!(matches!(failed, Err(ShareError::Status(_))));
        assert_eq!(alert(&failed, true), "Sharing canceled or failed");
    }
}
