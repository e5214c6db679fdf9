//! Gemini-backed action item extraction.

use super::{combine, ActionItemDraft, ActionItemExtractor, RuleBasedExtractor};
use crate::error::Result;
use crate::gemini::GeminiClient;
use async_trait::async_trait;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a meeting assistant that extracts action items. \
Respond with a JSON array only, no prose and no code fences. Each element is an \
object with keys: \"description\" (string, required), \"owner\" (string or null), \
\"due_date\" (string in YYYY-MM-DD format or null), \"status\" (string, default \
\"pending\"). Return [] if there are no action items.";

/// Asks Gemini for structured action items. Falls back to the rule-based
/// extractor when no Gemini credential is configured, so deployments without
/// an API key still get marker-based extraction.
pub struct GenerativeExtractor {
    client: GeminiClient,
    fallback: RuleBasedExtractor,
}

impl GenerativeExtractor {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            fallback: RuleBasedExtractor::new(),
        }
    }
}

#[async_trait]
impl ActionItemExtractor for GenerativeExtractor {
    async fn extract(
        &self,
        transcript: &str,
        summary: Option<&str>,
    ) -> Result<Vec<ActionItemDraft>> {
        let text = combine(transcript, summary)?;

        let response = match self.client.generate(SYSTEM_PROMPT, &text, 0.0).await {
            Ok(response) => response,
            Err(e) if e.is_capability() => {
                warn!("Gemini unavailable ({}), using rule-based extraction", e);
                return self.fallback.extract(transcript, summary).await;
            }
            Err(e) => return Err(e),
        };

        let items = parse_items(&response);
        debug!("Extracted {} action items", items.len());
        Ok(items)
    }
}

/// Parse the model response into drafts. Tolerates markdown code fences and
/// an `{"items": [...]}` wrapper; anything unparseable yields an empty list
/// rather than failing the pipeline.
fn parse_items(response: &str) -> Vec<ActionItemDraft> {
    let cleaned = strip_code_fences(response);

    let items: Vec<ActionItemDraft> = match serde_json::from_str(cleaned) {
        Ok(items) => items,
        Err(_) => serde_json::from_str::<serde_json::Value>(cleaned)
            .ok()
            .and_then(|v| v.get("items").cloned())
            .and_then(|items| serde_json::from_value(items).ok())
            .unwrap_or_default(),
    };

    items
        .into_iter()
        .filter(|item| !item.description.trim().is_empty())
        .collect()
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
