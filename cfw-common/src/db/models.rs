//! Database models

use crate::events::FolderStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Row in the `folders` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderRecord {
    pub guid: String,
    pub title: String,
    pub status: FolderStatus,
    pub first_activity_completed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Row in the `folder_sections` table
///
/// `content` is an opaque JSON blob; the core never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRecord {
    pub folder_guid: String,
    pub section: String,
    pub content: serde_json::Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Row in the `folder_feedback` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub folder_guid: String,
    pub section: String,
    pub channel: String,
    pub notes: String,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

/// Row in the `folder_decisions` audit table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: i64,
    pub folder_guid: String,
    pub actor_role: String,
    pub action: String,
    pub from_status: String,
    pub to_status: String,
    pub notes: Option<String>,
    pub decided_at: chrono::DateTime<chrono::Utc>,
}
