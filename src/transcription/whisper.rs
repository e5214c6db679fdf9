//! Local transcription via the `whisper` command-line tool.

use super::{looks_like_url, Transcriber};
use crate::error::{ReferatError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Runs OpenAI Whisper locally as a subprocess. Requires `whisper` on PATH.
pub struct WhisperTranscriber {
    model: String,
}

impl WhisperTranscriber {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self))]
    async fn transcribe(&self, audio_ref: &str, model: Option<&str>) -> Result<String> {
        if looks_like_url(audio_ref) {
            return Err(ReferatError::Validation(
                "The whisper provider only accepts local file paths".to_string(),
            ));
        }

        let path = Path::new(audio_ref);
        if !path.exists() {
            return Err(ReferatError::Validation(format!(
                "Audio file not found: {}",
                path.display()
            )));
        }

        let model = model.unwrap_or(&self.model);
        let output_dir = tempfile::tempdir()?;

        debug!("Running whisper with model {}", model);

        let output = Command::new("whisper")
            .arg(audio_ref)
            .arg("--model")
            .arg(model)
            .arg("--output_format")
            .arg("txt")
            .arg("--output_dir")
            .arg(output_dir.path())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReferatError::ToolNotFound("whisper".to_string())
                } else {
                    ReferatError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReferatError::Upstream(format!(
                "Whisper failed: {}",
                stderr.trim()
            )));
        }

        // Whisper names the output after the input file's stem.
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("transcript");
        let transcript_path = output_dir.path().join(format!("{}.txt", stem));
        let text = tokio::fs::read_to_string(&transcript_path)
            .await?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(ReferatError::Upstream(
                "Whisper returned an empty transcript".to_string(),
            ));
        }

        info!("Transcription completed ({} characters)", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_validation_error() {
        let transcriber = WhisperTranscriber::new("base");
        let err = transcriber
            .transcribe("/nonexistent/audio.wav", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReferatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_url_is_rejected() {
        let transcriber = WhisperTranscriber::new("base");
        let err = transcriber
            .transcribe("https://example.com/audio.mp3", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReferatError::Validation(_)));
    }
}
