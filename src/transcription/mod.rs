//! Speech-to-text transcription providers.
//!
//! A provider converts an audio reference (local path or fetchable URL) into
//! plain text. The concrete backend is selected by configuration; a
//! deterministic mock provider keeps the rest of the pipeline testable
//! without network access.

mod assemblyai;
mod mock;
mod whisper;

pub use assemblyai::AssemblyAiTranscriber;
pub use mock::MockTranscriber;
pub use whisper::WhisperTranscriber;

use crate::config::{Settings, TranscriptionProvider};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for transcription backends.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the referenced audio, optionally overriding the model.
    async fn transcribe(&self, audio_ref: &str, model: Option<&str>) -> Result<String>;
}

/// Create a transcriber from settings.
pub fn create_transcriber(settings: &Settings) -> Arc<dyn Transcriber> {
    if settings.transcription.mock {
        return Arc::new(MockTranscriber);
    }

    match settings.transcription.provider {
        TranscriptionProvider::AssemblyAi => {
            Arc::new(AssemblyAiTranscriber::new(&settings.transcription.assemblyai))
        }
        TranscriptionProvider::Whisper => {
            Arc::new(WhisperTranscriber::new(&settings.transcription.whisper_model))
        }
    }
}

/// Check whether an audio reference is a fetchable URL rather than a path.
pub(crate) fn looks_like_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
