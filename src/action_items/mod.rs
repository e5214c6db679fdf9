//! Action item extraction.
//!
//! Extractors turn a transcript (and optionally its summary) into a list of
//! action item drafts. The generative backend asks Gemini for structured
//! JSON; the rule-based backend matches explicit ACTION/TODO markers and is
//! also the fallback when no Gemini credential is configured.

mod gemini;
mod rules;

pub use gemini::GenerativeExtractor;
pub use rules::RuleBasedExtractor;

use crate::config::Settings;
use crate::error::{ReferatError, Result};
use crate::gemini::GeminiClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An action item as extracted, before it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionItemDraft {
    pub description: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "pending".to_string()
}

impl ActionItemDraft {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            owner: None,
            due_date: None,
            status: default_status(),
        }
    }
}

/// Trait for action item extraction backends.
#[async_trait]
pub trait ActionItemExtractor: Send + Sync {
    /// Extract action items from a transcript, using the summary for extra
    /// context when available.
    async fn extract(
        &self,
        transcript: &str,
        summary: Option<&str>,
    ) -> Result<Vec<ActionItemDraft>>;
}

/// Create an extractor from settings.
pub fn create_extractor(settings: &Settings) -> Arc<dyn ActionItemExtractor> {
    if settings.action_items.mock {
        Arc::new(RuleBasedExtractor::new())
    } else {
        Arc::new(GenerativeExtractor::new(GeminiClient::new(
            &settings.gemini,
        )))
    }
}

/// Join summary and transcript into one extraction input, summary first.
fn combine(transcript: &str, summary: Option<&str>) -> Result<String> {
    let mut parts = Vec::new();
    if let Some(summary) = summary {
        if !summary.trim().is_empty() {
            parts.push(summary.trim());
        }
    }
    if !transcript.trim().is_empty() {
        parts.push(transcript.trim());
    }

    if parts.is_empty() {
        return Err(ReferatError::Validation(
            "Transcript or summary is required for action extraction".to_string(),
        ));
    }
    Ok(parts.join("\n"))
}
