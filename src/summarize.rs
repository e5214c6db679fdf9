//! Transcript summarization.
//!
//! Two backends: a Gemini-powered summarizer for real deployments and a
//! deterministic truncating summarizer for mock mode. Both reject empty
//! input up front so the pipeline fails before any network call.

use crate::config::Settings;
use crate::error::{ReferatError, Result};
use crate::gemini::GeminiClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Mock summaries are clipped to this many characters.
const MOCK_SUMMARY_MAX_CHARS: usize = 500;

/// Trait for summarization backends.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense a transcript into at most `max_sentences` sentences.
    async fn summarize(&self, transcript: &str, max_sentences: usize) -> Result<String>;
}

/// Create a summarizer from settings.
pub fn create_summarizer(settings: &Settings) -> Arc<dyn Summarizer> {
    if settings.summarization.mock {
        Arc::new(MockSummarizer)
    } else {
        Arc::new(GeminiSummarizer::new(GeminiClient::new(&settings.gemini)))
    }
}

fn require_transcript(transcript: &str) -> Result<&str> {
    let trimmed = transcript.trim();
    if trimmed.is_empty() {
        return Err(ReferatError::Validation("Transcript is empty".to_string()));
    }
    Ok(trimmed)
}

/// Deterministic summarizer: collapses whitespace and clips the transcript
/// head at a word boundary.
pub struct MockSummarizer;

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, transcript: &str, _max_sentences: usize) -> Result<String> {
        let trimmed = require_transcript(transcript)?;
        let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.len() <= MOCK_SUMMARY_MAX_CHARS {
            return Ok(collapsed);
        }

        let mut end = MOCK_SUMMARY_MAX_CHARS;
        while !collapsed.is_char_boundary(end) {
            end -= 1;
        }
        let head = &collapsed[..end];
        let clipped = match head.rfind(' ') {
            Some(idx) => &head[..idx],
            None => head,
        };
        Ok(format!("{}...", clipped))
    }
}

/// Gemini-backed summarizer.
pub struct GeminiSummarizer {
    client: GeminiClient,
}

impl GeminiSummarizer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    #[instrument(skip_all)]
    async fn summarize(&self, transcript: &str, max_sentences: usize) -> Result<String> {
        let trimmed = require_transcript(transcript)?;

        let system = format!(
            "You are a meeting assistant. Summarize the meeting transcript in \
             at most {} sentences. Focus on decisions, outcomes, and open \
             questions. Respond with the summary only, no preamble.",
            max_sentences
        );

        debug!("Summarizing {} characters", trimmed.len());
        self.client.generate(&system, trimmed, 0.2).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_transcript_is_rejected() {
        let err = MockSummarizer.summarize("   \n  ", 5).await.unwrap_err();
        assert!(matches!(err, ReferatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_short_transcript_passes_through() {
        let summary = MockSummarizer
            .summarize("Line one. Line two.", 5)
            .await
            .unwrap();
        assert!(summary.starts_with("Line one"));
        assert_eq!(summary, "Line one. Line two.");
    }

    #[tokio::test]
    async fn test_whitespace_is_collapsed() {
        let summary = MockSummarizer
            .summarize("alpha\n\n  beta\tgamma", 5)
            .await
            .unwrap();
        assert_eq!(summary, "alpha beta gamma");
    }

    #[tokio::test]
    async fn test_long_transcript_is_clipped_at_word_boundary() {
        let transcript = "word ".repeat(200);
        let summary = MockSummarizer.summarize(&transcript, 5).await.unwrap();
        assert!(summary.len() <= MOCK_SUMMARY_MAX_CHARS + 3);
        assert!(summary.ends_with("..."));
        assert!(!summary.trim_end_matches("...").ends_with(' '));
    }
}
