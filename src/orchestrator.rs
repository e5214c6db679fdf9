//! Pipeline coordination.
//!
//! The orchestrator wires the transcription, summarization, and extraction
//! components together and drives a meeting through them, committing each
//! stage's output to the store as soon as it is produced so a later failure
//! never loses earlier work.

use crate::action_items::{create_extractor, ActionItemDraft, ActionItemExtractor};
use crate::config::Settings;
use crate::error::{ReferatError, Result};
use crate::store::{MeetingStatus, MeetingStore, NewActionItem};
use crate::summarize::{create_summarizer, Summarizer};
use crate::transcription::{create_transcriber, Transcriber};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Transcripts shorter than this are rejected as unusable.
const MIN_TRANSCRIPT_CHARS: usize = 10;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcription,
    Summarization,
    Extraction,
}

/// What a stage failure does to the meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The meeting is marked failed and processing stops.
    Fatal,
    /// The failure is logged and processing continues.
    Warn,
}

impl Stage {
    /// Extraction is best-effort: a meeting with a transcript and summary is
    /// still useful without action items.
    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            Stage::Transcription => FailurePolicy::Fatal,
            Stage::Summarization => FailurePolicy::Fatal,
            Stage::Extraction => FailurePolicy::Warn,
        }
    }
}

/// Result of an ad-hoc follow-up run, not tied to a stored meeting.
#[derive(Debug, Clone)]
pub struct FollowUp {
    pub summary: String,
    pub action_items: Vec<ActionItemDraft>,
}

/// Coordinates the meeting-processing pipeline.
pub struct Orchestrator {
    settings: Settings,
    store: Arc<MeetingStore>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    extractor: Arc<dyn ActionItemExtractor>,
}

impl Orchestrator {
    /// Create an orchestrator with components selected by settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = Arc::new(MeetingStore::new(&settings.db_path())?);
        let transcriber = create_transcriber(&settings);
        let summarizer = create_summarizer(&settings);
        let extractor = create_extractor(&settings);
        Ok(Self::with_components(
            settings,
            store,
            transcriber,
            summarizer,
            extractor,
        ))
    }

    /// Create an orchestrator with explicit components, used by tests.
    pub fn with_components(
        settings: Settings,
        store: Arc<MeetingStore>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        extractor: Arc<dyn ActionItemExtractor>,
    ) -> Self {
        Self {
            settings,
            store,
            transcriber,
            summarizer,
            extractor,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<MeetingStore> {
        &self.store
    }

    pub fn transcriber(&self) -> &Arc<dyn Transcriber> {
        &self.transcriber
    }

    /// Run the full pipeline for a stored meeting. On failure the meeting is
    /// marked failed with the error message before the error is returned.
    #[instrument(skip(self))]
    pub async fn process_meeting(&self, meeting_id: i64) -> Result<i64> {
        let meeting = self
            .store
            .get_meeting(meeting_id)?
            .ok_or_else(|| ReferatError::NotFound(format!("Meeting {} not found", meeting_id)))?;

        let outcome = match self.store.mark_processing(meeting_id) {
            Ok(()) => {
                self.run_pipeline(meeting_id, meeting.transcript, meeting.audio_url)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            if let Err(store_err) = self.store.mark_failed(meeting_id, &e.to_string()) {
                warn!("Failed to record failure for meeting {}: {}", meeting_id, store_err);
            }
            return Err(e);
        }

        info!("Meeting {} processed", meeting_id);
        Ok(meeting_id)
    }

    async fn run_pipeline(
        &self,
        meeting_id: i64,
        transcript: Option<String>,
        audio_url: Option<String>,
    ) -> Result<()> {
        let mut transcript = transcript.unwrap_or_default();

        if transcript.trim().is_empty() {
            if let Some(audio_url) = audio_url {
                transcript = self
                    .transcriber
                    .transcribe(&audio_url, None)
                    .await
                    .map_err(|e| ReferatError::Transcription(e.to_string()))?;
                self.store.set_transcript(meeting_id, &transcript)?;
            }
        }

        if transcript.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
            return Err(ReferatError::Validation(
                "Transcript is too short or empty. Need at least 10 characters of meaningful content."
                    .to_string(),
            ));
        }

        let summary = self
            .summarizer
            .summarize(&transcript, self.settings.summarization.max_sentences)
            .await
            .map_err(|e| ReferatError::Summarization(e.to_string()))?;
        self.store.set_summary(meeting_id, &summary)?;

        match self.extractor.extract(&transcript, Some(&summary)).await {
            Ok(drafts) => {
                let items: Vec<NewActionItem> =
                    drafts.into_iter().map(draft_to_new_item).collect();
                self.store.replace_action_items(meeting_id, &items)?;
            }
            Err(e) => match Stage::Extraction.failure_policy() {
                FailurePolicy::Warn => {
                    warn!("Action item extraction failed for meeting {}: {}", meeting_id, e);
                }
                FailurePolicy::Fatal => return Err(ReferatError::ActionExtraction(e.to_string())),
            },
        }

        self.store.set_status(meeting_id, MeetingStatus::Done)?;
        Ok(())
    }

    /// Summarize a transcript and extract its action items without storing
    /// anything. Unlike `process_meeting`, there is no record to degrade
    /// gracefully onto, so stage failures propagate to the caller.
    #[instrument(skip_all)]
    pub async fn follow_up(&self, transcript: &str) -> Result<FollowUp> {
        let summary = self
            .summarizer
            .summarize(transcript, self.settings.summarization.max_sentences)
            .await
            .map_err(|e| ReferatError::Summarization(e.to_string()))?;

        let action_items = self
            .extractor
            .extract(transcript, Some(&summary))
            .await
            .map_err(|e| ReferatError::ActionExtraction(e.to_string()))?;

        Ok(FollowUp {
            summary,
            action_items,
        })
    }
}

/// Convert a draft into a storable item, dropping due dates that are not
/// ISO dates rather than failing the pipeline.
fn draft_to_new_item(draft: ActionItemDraft) -> NewActionItem {
    let due_date = draft.due_date.as_deref().and_then(|raw| {
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!("Ignoring unparseable due date: {:?}", raw);
                None
            }
        }
    });
    NewActionItem {
        description: draft.description,
        owner: draft.owner,
        due_date,
        status: draft.status,
    }
}
