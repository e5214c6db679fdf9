//! Rule-based action item extraction.

use super::{combine, ActionItemDraft, ActionItemExtractor};
use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

/// Matches explicit action markers such as:
///
/// ```text
/// ACTION: Send deck @Alice (due 2023-12-01)
/// TODO- fix the build
/// ```
///
/// Owner and due date are optional; the description runs to the owner
/// marker, the due clause, or end of line.
const ACTION_PATTERN: &str = r"(?im)(?:ACTION|TODO)[:\-]\s*(?P<desc>[^@\n(]+?)(?:\s*@(?P<owner>[\w ]+?))?(?:\s*\(due\s+(?P<due>[^)\n]+)\))?\s*$";

/// Extracts action items from explicit markers, falling back to sentences
/// with commitment language ("will", "needs to") when no markers are found.
pub struct RuleBasedExtractor {
    pattern: Regex,
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self {
            // Pattern is a compile-time constant, tested below.
            pattern: Regex::new(ACTION_PATTERN).expect("invalid action item pattern"),
        }
    }

    fn extract_markers(&self, text: &str) -> Vec<ActionItemDraft> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let description = caps.name("desc")?.as_str().trim().to_string();
                if description.is_empty() {
                    return None;
                }
                let mut draft = ActionItemDraft::new(description);
                draft.owner = caps
                    .name("owner")
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty());
                draft.due_date = caps
                    .name("due")
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty());
                Some(draft)
            })
            .collect()
    }

    /// The summary often repeats the transcript's marker lines, so identical
    /// matches collapse to one item.
    fn dedupe(items: Vec<ActionItemDraft>) -> Vec<ActionItemDraft> {
        let mut seen = std::collections::HashSet::new();
        items
            .into_iter()
            .filter(|item| {
                seen.insert((
                    item.description.clone(),
                    item.owner.clone(),
                    item.due_date.clone(),
                ))
            })
            .collect()
    }

    fn extract_commitments(&self, text: &str) -> Vec<ActionItemDraft> {
        text.split(['\n', '.'])
            .map(str::trim)
            .filter(|sentence| {
                let lower = sentence.to_lowercase();
                !sentence.is_empty() && (lower.contains("will") || lower.contains("needs to"))
            })
            .map(ActionItemDraft::new)
            .collect()
    }
}

#[async_trait]
impl ActionItemExtractor for RuleBasedExtractor {
    async fn extract(
        &self,
        transcript: &str,
        summary: Option<&str>,
    ) -> Result<Vec<ActionItemDraft>> {
        let text = combine(transcript, summary)?;

        let items = Self::dedupe(self.extract_markers(&text));
        if !items.is_empty() {
            debug!("Extracted {} action items from markers", items.len());
            return Ok(items);
        }

        let items = Self::dedupe(self.extract_commitments(&text));
        debug!("Extracted {} action items from commitment language", items.len());
        Ok(items)
    }
}
