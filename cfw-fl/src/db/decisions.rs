//! Review decision audit trail
//!
//! Every status transition is appended here with the acting role and any
//! decision notes. The trail is read-only history; nothing in the lifecycle
//! consults it to make decisions.

use crate::error::Result;
use cfw_common::db::DecisionRecord;
use cfw_common::events::{FolderStatus, ReviewerRole};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Append one decision row
pub async fn record_decision(
    db: &Pool<Sqlite>,
    folder_id: Uuid,
    actor: ReviewerRole,
    action: &str,
    from_status: FolderStatus,
    to_status: FolderStatus,
    notes: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO folder_decisions
            (folder_guid, actor_role, action, from_status, to_status, notes, decided_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(folder_id.to_string())
    .bind(actor.to_string())
    .bind(action)
    .bind(from_status.as_str())
    .bind(to_status.as_str())
    .bind(notes)
    .bind(chrono::Utc::now())
    .execute(db)
    .await?;

    Ok(())
}

/// List a folder's decision history, oldest first
pub async fn list_decisions(db: &Pool<Sqlite>, folder_id: Uuid) -> Result<Vec<DecisionRecord>> {
    let rows: Vec<(
        i64,
        String,
        String,
        String,
        String,
        String,
        Option<String>,
        chrono::DateTime<chrono::Utc>,
    )> = sqlx::query_as(
        "SELECT id, folder_guid, actor_role, action, from_status, to_status, notes, decided_at
         FROM folder_decisions WHERE folder_guid = ? ORDER BY id",
    )
    .bind(folder_id.to_string())
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, folder_guid, actor_role, action, from_status, to_status, notes, decided_at)| {
                DecisionRecord {
                    id,
                    folder_guid,
                    actor_role,
                    action,
                    from_status,
                    to_status,
                    notes,
                    decided_at,
                }
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfw_common::db::init_memory_database;

    #[tokio::test]
    async fn test_record_and_list_decisions() {
        let db = init_memory_database().await.unwrap();
        let folder = crate::db::folders::create_folder(&db, "Thermodynamics").await.unwrap();
        let folder_id = Uuid::parse_str(&folder.guid).unwrap();

        record_decision(
            &db,
            folder_id,
            ReviewerRole::Faculty,
            "submit",
            FolderStatus::Draft,
            FolderStatus::Submitted,
            None,
        )
        .await
        .unwrap();

        record_decision(
            &db,
            folder_id,
            ReviewerRole::Coordinator,
            "reject",
            FolderStatus::UnderReviewByCoordinator,
            FolderStatus::RejectedCoordinator,
            Some("missing CLO mapping"),
        )
        .await
        .unwrap();

        let history = list_decisions(&db, folder_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, "submit");
        assert_eq!(history[1].actor_role, "COORDINATOR");
        assert_eq!(history[1].notes.as_deref(), Some("missing CLO mapping"));
        assert_eq!(history[1].to_status, "REJECTED_COORDINATOR");
    }
}
