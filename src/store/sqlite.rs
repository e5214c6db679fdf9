//! SQLite-backed meeting store.

use super::{ActionItem, Meeting, MeetingStatus, NewActionItem, NewMeeting};
use crate::error::{ReferatError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistent store for meetings and their action items.
///
/// A single connection behind a mutex is enough here: writes are short and
/// the worker pool is small.
pub struct MeetingStore {
    conn: Mutex<Connection>,
}

impl MeetingStore {
    /// Open (or create) a store at the given path.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open an in-memory store, used by tests.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meetings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                audio_url TEXT,
                transcript TEXT,
                summary TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                source_agent TEXT,
                error_message TEXT
            );
            CREATE TABLE IF NOT EXISTS action_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                description TEXT NOT NULL,
                owner TEXT,
                due_date TEXT,
                status TEXT NOT NULL DEFAULT 'pending'
            );
            CREATE INDEX IF NOT EXISTS idx_action_items_meeting
                ON action_items(meeting_id);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ReferatError::Storage(format!("Database lock poisoned: {}", e)))
    }

    /// Insert a meeting in the pending state, returning its id.
    pub fn create_meeting(&self, new: &NewMeeting) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO meetings (title, created_at, audio_url, transcript, status, source_agent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.title,
                Utc::now().to_rfc3339(),
                new.audio_url,
                new.transcript,
                MeetingStatus::Pending.as_str(),
                new.source_agent,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Created meeting {}", id);
        Ok(id)
    }

    /// Fetch a meeting by id.
    pub fn get_meeting(&self, id: i64) -> Result<Option<Meeting>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at, audio_url, transcript, summary, status,
                    source_agent, error_message
             FROM meetings WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], row_to_meeting)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List meetings, newest first.
    pub fn list_meetings(&self, limit: usize) -> Result<Vec<Meeting>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at, audio_url, transcript, summary, status,
                    source_agent, error_message
             FROM meetings ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_meeting)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// Move a meeting into the processing state, clearing any prior error.
    pub fn mark_processing(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE meetings SET status = ?1, error_message = NULL WHERE id = ?2",
            params![MeetingStatus::Processing.as_str(), id],
        )?;
        Ok(())
    }

    /// Persist a transcript for a meeting.
    pub fn set_transcript(&self, id: i64, transcript: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE meetings SET transcript = ?1 WHERE id = ?2",
            params![transcript, id],
        )?;
        Ok(())
    }

    /// Persist a summary for a meeting.
    pub fn set_summary(&self, id: i64, summary: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE meetings SET summary = ?1 WHERE id = ?2",
            params![summary, id],
        )?;
        Ok(())
    }

    /// Set a meeting's status.
    pub fn set_status(&self, id: i64, status: MeetingStatus) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE meetings SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(())
    }

    /// Mark a meeting failed with an error message.
    pub fn mark_failed(&self, id: i64, message: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE meetings SET status = ?1, error_message = ?2 WHERE id = ?3",
            params![MeetingStatus::Failed.as_str(), message, id],
        )?;
        Ok(())
    }

    /// Replace a meeting's action items atomically.
    pub fn replace_action_items(&self, meeting_id: i64, items: &[NewActionItem]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM action_items WHERE meeting_id = ?1",
            params![meeting_id],
        )?;
        for item in items {
            tx.execute(
                "INSERT INTO action_items (meeting_id, description, owner, due_date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    meeting_id,
                    item.description,
                    item.owner,
                    item.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
                    item.status,
                ],
            )?;
        }
        tx.commit()?;
        debug!("Stored {} action items for meeting {}", items.len(), meeting_id);
        Ok(())
    }

    /// Fetch a meeting's action items in insertion order.
    pub fn action_items_for(&self, meeting_id: i64) -> Result<Vec<ActionItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, meeting_id, description, owner, due_date, status
             FROM action_items WHERE meeting_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![meeting_id], row_to_action_item)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// Delete a meeting and (via cascade) its action items. Returns whether
    /// a row was removed.
    pub fn delete_meeting(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM meetings WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
impl MeetingStore {
    /// Run arbitrary SQL against the store, for tests that need to inject
    /// failure conditions (e.g. triggers rejecting specific updates).
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }
}

fn row_to_meeting(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    let created_at: String = row.get(2)?;
    let status: String = row.get(6)?;
    Ok(Meeting {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        audio_url: row.get(3)?,
        transcript: row.get(4)?,
        summary: row.get(5)?,
        status: status.parse().unwrap_or(MeetingStatus::Pending),
        source_agent: row.get(7)?,
        error_message: row.get(8)?,
    })
}

fn row_to_action_item(row: &Row<'_>) -> rusqlite::Result<ActionItem> {
    let due_date: Option<String> = row.get(4)?;
    Ok(ActionItem {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        description: row.get(2)?,
        owner: row.get(3)?,
        due_date: due_date.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
        status: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_meeting(title: &str) -> NewMeeting {
        NewMeeting {
            title: title.to_string(),
            ..NewMeeting::default()
        }
    }

    #[test]
    fn test_create_and_get_meeting() {
        let store = MeetingStore::in_memory().unwrap();
        let id = store
            .create_meeting(&NewMeeting {
                title: "Weekly sync".to_string(),
                transcript: Some("We talked.".to_string()),
                source_agent: Some("supervisor".to_string()),
                ..NewMeeting::default()
            })
            .unwrap();

        let meeting = store.get_meeting(id).unwrap().unwrap();
        assert_eq!(meeting.title, "Weekly sync");
        assert_eq!(meeting.status, MeetingStatus::Pending);
        assert_eq!(meeting.transcript.as_deref(), Some("We talked."));
        assert_eq!(meeting.source_agent.as_deref(), Some("supervisor"));
        assert!(meeting.error_message.is_none());
    }

    #[test]
    fn test_get_missing_meeting() {
        let store = MeetingStore::in_memory().unwrap();
        assert!(store.get_meeting(42).unwrap().is_none());
    }

    #[test]
    fn test_status_transitions() {
        let store = MeetingStore::in_memory().unwrap();
        let id = store.create_meeting(&new_meeting("m")).unwrap();

        store.mark_failed(id, "boom").unwrap();
        let meeting = store.get_meeting(id).unwrap().unwrap();
        assert_eq!(meeting.status, MeetingStatus::Failed);
        assert_eq!(meeting.error_message.as_deref(), Some("boom"));

        // Re-processing clears the stale error message.
        store.mark_processing(id).unwrap();
        let meeting = store.get_meeting(id).unwrap().unwrap();
        assert_eq!(meeting.status, MeetingStatus::Processing);
        assert!(meeting.error_message.is_none());

        store.set_status(id, MeetingStatus::Done).unwrap();
        let meeting = store.get_meeting(id).unwrap().unwrap();
        assert_eq!(meeting.status, MeetingStatus::Done);
    }

    #[test]
    fn test_list_meetings_newest_first() {
        let store = MeetingStore::in_memory().unwrap();
        let first = store.create_meeting(&new_meeting("first")).unwrap();
        let second = store.create_meeting(&new_meeting("second")).unwrap();

        let meetings = store.list_meetings(10).unwrap();
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].id, second);
        assert_eq!(meetings[1].id, first);

        let limited = store.list_meetings(1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, second);
    }

    #[test]
    fn test_replace_action_items_is_idempotent() {
        let store = MeetingStore::in_memory().unwrap();
        let id = store.create_meeting(&new_meeting("m")).unwrap();

        let items = vec![
            NewActionItem {
                description: "Send deck".to_string(),
                owner: Some("Alice".to_string()),
                due_date: NaiveDate::from_ymd_opt(2023, 12, 1),
                status: "pending".to_string(),
            },
            NewActionItem {
                description: "Book venue".to_string(),
                owner: None,
                due_date: None,
                status: "pending".to_string(),
            },
        ];

        store.replace_action_items(id, &items).unwrap();
        store.replace_action_items(id, &items).unwrap();

        let stored = store.action_items_for(id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].description, "Send deck");
        assert_eq!(stored[0].owner.as_deref(), Some("Alice"));
        assert_eq!(stored[0].due_date, NaiveDate::from_ymd_opt(2023, 12, 1));
        assert!(stored[1].due_date.is_none());
    }

    #[test]
    fn test_delete_cascades_to_action_items() {
        let store = MeetingStore::in_memory().unwrap();
        let id = store.create_meeting(&new_meeting("m")).unwrap();
        store
            .replace_action_items(
                id,
                &[NewActionItem {
                    description: "cleanup".to_string(),
                    owner: None,
                    due_date: None,
                    status: "pending".to_string(),
                }],
            )
            .unwrap();

        assert!(store.delete_meeting(id).unwrap());
        assert!(store.get_meeting(id).unwrap().is_none());
        assert!(store.action_items_for(id).unwrap().is_empty());
        assert!(!store.delete_meeting(id).unwrap());
    }
}
