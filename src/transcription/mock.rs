//! Deterministic transcription provider for tests.

use super::Transcriber;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Returns a placeholder transcript derived from the file name. No network,
/// no filesystem access.
pub struct MockTranscriber;

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio_ref: &str, _model: Option<&str>) -> Result<String> {
        let name = Path::new(audio_ref)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        Ok(format!("Mock transcript for {}", name))
    }
}
