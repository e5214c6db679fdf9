//! Meeting persistence.

mod sqlite;

pub use sqlite::MeetingStore;

use chrono::{DateTime, NaiveDate, Utc};

/// Lifecycle state of a meeting record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingStatus {
    /// Created, not yet picked up by a worker.
    Pending,
    /// A worker is running the pipeline.
    Processing,
    /// Pipeline finished; summary and action items are available.
    Done,
    /// Pipeline failed; `error_message` explains why.
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Pending => "pending",
            MeetingStatus::Processing => "processing",
            MeetingStatus::Done => "done",
            MeetingStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MeetingStatus::Pending),
            "processing" => Ok(MeetingStatus::Processing),
            "done" => Ok(MeetingStatus::Done),
            "failed" => Ok(MeetingStatus::Failed),
            _ => Err(format!("Unknown meeting status: {}", s)),
        }
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored meeting.
#[derive(Debug, Clone)]
pub struct Meeting {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub status: MeetingStatus,
    pub source_agent: Option<String>,
    pub error_message: Option<String>,
}

/// Fields for creating a meeting.
#[derive(Debug, Clone, Default)]
pub struct NewMeeting {
    pub title: String,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub source_agent: Option<String>,
}

/// A stored action item, attached to a meeting.
#[derive(Debug, Clone)]
pub struct ActionItem {
    pub id: i64,
    pub meeting_id: i64,
    pub description: String,
    pub owner: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
}

/// Fields for inserting an action item.
#[derive(Debug, Clone)]
pub struct NewActionItem {
    pub description: String,
    pub owner: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            MeetingStatus::Pending,
            MeetingStatus::Processing,
            MeetingStatus::Done,
            MeetingStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<MeetingStatus>().unwrap(), status);
        }
        assert!("archived".parse::<MeetingStatus>().is_err());
    }
}
