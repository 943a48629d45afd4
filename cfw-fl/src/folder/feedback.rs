//! Per-section reviewer feedback
//!
//! Feedback lives beside the document: reviewers attach notes to a
//! (folder, section) key without touching folder content or status. The
//! coordinator and audit-member channels are independent stores of the same
//! shape; at most one live entry exists per (folder, section, channel), and
//! a new save overwrites rather than appends.

use crate::error::Result;
use cfw_common::events::{EventBus, FeedbackChannel, FolderEvent};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

/// One live feedback entry for a (folder, section, channel) key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackEntry {
    /// Section key the notes attach to
    pub section: String,
    /// Free-text notes; empty means intentionally cleared
    pub notes: String,
    /// When the entry was last written; `None` for the empty placeholder
    pub saved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl FeedbackEntry {
    /// Placeholder returned when no entry exists for the key
    pub fn empty(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            notes: String::new(),
            saved_at: None,
        }
    }
}

/// Channel-scoped feedback store
///
/// Construct one per reviewer channel; both share the backing table, keyed
/// by channel.
#[derive(Clone)]
pub struct FeedbackStore {
    db: SqlitePool,
    events: EventBus,
    channel: FeedbackChannel,
}

impl FeedbackStore {
    /// Store scoped to coordinator-role reviewers
    pub fn coordinator(db: SqlitePool, events: EventBus) -> Self {
        Self {
            db,
            events,
            channel: FeedbackChannel::Coordinator,
        }
    }

    /// Store scoped to audit-member-role reviewers
    pub fn audit_member(db: SqlitePool, events: EventBus) -> Self {
        Self {
            db,
            events,
            channel: FeedbackChannel::AuditMember,
        }
    }

    /// The reviewer channel this store is scoped to
    pub fn channel(&self) -> FeedbackChannel {
        self.channel
    }

    /// Fetch the live entry for a key
    ///
    /// Degrades to the empty placeholder on read failure rather than
    /// blocking the page; losing a read is recoverable, the view just shows
    /// no notes until the next refresh.
    pub async fn get(&self, folder_id: Uuid, section: &str) -> FeedbackEntry {
        let row: std::result::Result<
            Option<(String, chrono::DateTime<chrono::Utc>)>,
            sqlx::Error,
        > = sqlx::query_as(
            "SELECT notes, saved_at FROM folder_feedback
             WHERE folder_guid = ? AND section = ? AND channel = ?",
        )
        .bind(folder_id.to_string())
        .bind(section)
        .bind(self.channel.as_str())
        .fetch_optional(&self.db)
        .await;

        match row {
            Ok(Some((notes, saved_at))) => FeedbackEntry {
                section: section.to_string(),
                notes,
                saved_at: Some(saved_at),
            },
            Ok(None) => FeedbackEntry::empty(section),
            Err(e) => {
                warn!(
                    folder_id = %folder_id,
                    section,
                    channel = %self.channel,
                    "feedback read failed, returning empty entry: {}", e
                );
                FeedbackEntry::empty(section)
            }
        }
    }

    /// Write the entry for a key, overwriting any prior entry
    ///
    /// The empty string is a valid value (it clears feedback) and must not
    /// be rejected; trimming is the caller's responsibility. Failures are
    /// surfaced synchronously, never retried or swallowed: losing written
    /// feedback has review-integrity consequences.
    pub async fn put(&self, folder_id: Uuid, section: &str, notes: &str) -> Result<FeedbackEntry> {
        let saved_at = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO folder_feedback (folder_guid, section, channel, notes, saved_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(folder_guid, section, channel)
            DO UPDATE SET notes = excluded.notes, saved_at = excluded.saved_at
            "#,
        )
        .bind(folder_id.to_string())
        .bind(section)
        .bind(self.channel.as_str())
        .bind(notes)
        .bind(saved_at)
        .execute(&self.db)
        .await?;

        // Other live views of the same key refresh from the store rather
        // than trusting local state
        self.events.emit_lossy(FolderEvent::FeedbackSaved {
            folder_id,
            section: section.to_string(),
            channel: self.channel,
            timestamp: saved_at,
        });

        Ok(FeedbackEntry {
            section: section.to_string(),
            notes: notes.to_string(),
            saved_at: Some(saved_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfw_common::db::init_memory_database;

    async fn setup() -> (SqlitePool, EventBus, Uuid) {
        let db = init_memory_database().await.unwrap();
        let folder_id = Uuid::new_v4();
        sqlx::query("INSERT INTO folders (guid, title) VALUES (?, ?)")
            .bind(folder_id.to_string())
            .bind("Signals and Systems")
            .execute(&db)
            .await
            .unwrap();
        (db, EventBus::new(16), folder_id)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (db, bus, folder_id) = setup().await;
        let store = FeedbackStore::coordinator(db, bus);

        store.put(folder_id, "COURSE_OUTLINE", "CLO mapping incomplete").await.unwrap();
        let entry = store.get(folder_id, "COURSE_OUTLINE").await;
        assert_eq!(entry.notes, "CLO mapping incomplete");
        assert!(entry.saved_at.is_some());
    }

    #[tokio::test]
    async fn test_overwrite_not_append() {
        let (db, bus, folder_id) = setup().await;
        let store = FeedbackStore::coordinator(db.clone(), bus);

        store.put(folder_id, "ASSIGNMENTS", "first pass").await.unwrap();
        store.put(folder_id, "ASSIGNMENTS", "second pass").await.unwrap();

        let entry = store.get(folder_id, "ASSIGNMENTS").await;
        assert_eq!(entry.notes, "second pass");

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM folder_feedback WHERE folder_guid = ? AND section = ?",
        )
        .bind(folder_id.to_string())
        .bind("ASSIGNMENTS")
        .fetch_one(&db)
        .await
        .unwrap();
        assert_eq!(count, 1, "one live entry per key");
    }

    #[tokio::test]
    async fn test_empty_string_clears_feedback() {
        let (db, bus, folder_id) = setup().await;
        let store = FeedbackStore::coordinator(db, bus);

        store.put(folder_id, "COURSE_OUTLINE", "needs work").await.unwrap();
        store.put(folder_id, "COURSE_OUTLINE", "").await.unwrap();

        let entry = store.get(folder_id, "COURSE_OUTLINE").await;
        assert_eq!(entry.notes, "");
        assert!(entry.saved_at.is_some(), "cleared entry is still a live entry");
    }

    #[tokio::test]
    async fn test_missing_entry_returns_empty_placeholder() {
        let (db, bus, folder_id) = setup().await;
        let store = FeedbackStore::audit_member(db, bus);

        let entry = store.get(folder_id, "NEVER_WRITTEN").await;
        assert_eq!(entry, FeedbackEntry::empty("NEVER_WRITTEN"));
    }

    #[tokio::test]
    async fn test_channels_are_independent() {
        let (db, bus, folder_id) = setup().await;
        let coordinator = FeedbackStore::coordinator(db.clone(), bus.clone());
        let audit = FeedbackStore::audit_member(db, bus);

        coordinator.put(folder_id, "COURSE_OUTLINE", "from coordinator").await.unwrap();
        audit.put(folder_id, "COURSE_OUTLINE", "from audit").await.unwrap();

        assert_eq!(coordinator.get(folder_id, "COURSE_OUTLINE").await.notes, "from coordinator");
        assert_eq!(audit.get(folder_id, "COURSE_OUTLINE").await.notes, "from audit");
    }

    #[tokio::test]
    async fn test_put_broadcasts_refresh_for_key() {
        let (db, bus, folder_id) = setup().await;
        let store = FeedbackStore::coordinator(db, bus.clone());
        let mut sub = bus.subscribe_section(folder_id, "COURSE_OUTLINE");

        store.put(folder_id, "COURSE_OUTLINE", "sync me").await.unwrap();

        let event = sub.recv().await.expect("bus open");
        match event {
            FolderEvent::FeedbackSaved { folder_id: id, section, channel, .. } => {
                assert_eq!(id, folder_id);
                assert_eq!(section, "COURSE_OUTLINE");
                assert_eq!(channel, FeedbackChannel::Coordinator);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_degrades_to_empty_on_storage_failure() {
        let (db, bus, folder_id) = setup().await;
        let store = FeedbackStore::coordinator(db.clone(), bus);
        store.put(folder_id, "COURSE_OUTLINE", "persisted").await.unwrap();

        db.close().await;

        let entry = store.get(folder_id, "COURSE_OUTLINE").await;
        assert_eq!(entry, FeedbackEntry::empty("COURSE_OUTLINE"));
    }

    #[tokio::test]
    async fn test_put_failure_is_surfaced() {
        let (db, bus, folder_id) = setup().await;
        let store = FeedbackStore::coordinator(db.clone(), bus);

        db.close().await;

        let result = store.put(folder_id, "COURSE_OUTLINE", "lost?").await;
        assert!(result.is_err(), "put must surface persistence failure");
    }
}
