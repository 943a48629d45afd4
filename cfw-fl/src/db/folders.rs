//! Folder table access

use crate::error::{Error, Result};
use cfw_common::db::FolderRecord;
use cfw_common::events::FolderStatus;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

type FolderRow = (
    String,
    String,
    String,
    i64,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Utc>,
);

fn folder_from_row(row: FolderRow) -> Result<FolderRecord> {
    let status = FolderStatus::from_str(&row.2)
        .map_err(|e| Error::Internal(format!("Invalid status in folder row: {}", e)))?;

    Ok(FolderRecord {
        guid: row.0,
        title: row.1,
        status,
        first_activity_completed: row.3 != 0,
        created_at: row.4,
        updated_at: row.5,
    })
}

/// Create a folder in Draft
pub async fn create_folder(db: &Pool<Sqlite>, title: &str) -> Result<FolderRecord> {
    let guid = Uuid::new_v4();
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        INSERT INTO folders (guid, title, status, first_activity_completed, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(title)
    .bind(FolderStatus::Draft.as_str())
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(FolderRecord {
        guid: guid.to_string(),
        title: title.to_string(),
        status: FolderStatus::Draft,
        first_activity_completed: false,
        created_at: now,
        updated_at: now,
    })
}

/// Fetch a folder by id
pub async fn get_folder(db: &Pool<Sqlite>, folder_id: Uuid) -> Result<Option<FolderRecord>> {
    let row: Option<FolderRow> = sqlx::query_as(
        "SELECT guid, title, status, first_activity_completed, created_at, updated_at
         FROM folders WHERE guid = ?",
    )
    .bind(folder_id.to_string())
    .fetch_optional(db)
    .await?;

    row.map(folder_from_row).transpose()
}

/// List all folders, newest first
pub async fn list_folders(db: &Pool<Sqlite>) -> Result<Vec<FolderRecord>> {
    let rows: Vec<FolderRow> = sqlx::query_as(
        "SELECT guid, title, status, first_activity_completed, created_at, updated_at
         FROM folders ORDER BY created_at DESC",
    )
    .fetch_all(db)
    .await?;

    rows.into_iter().map(folder_from_row).collect()
}

/// Atomic status transition write
///
/// Fails with `FolderNotFound` if no row was updated.
pub async fn persist_status(
    db: &Pool<Sqlite>,
    folder_id: Uuid,
    new_status: FolderStatus,
) -> Result<()> {
    let result = sqlx::query("UPDATE folders SET status = ?, updated_at = ? WHERE guid = ?")
        .bind(new_status.as_str())
        .bind(chrono::Utc::now())
        .bind(folder_id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::FolderNotFound(folder_id));
    }
    Ok(())
}

/// Set the first-activity-completed flag; set once, never reset
pub async fn set_first_activity_completed(db: &Pool<Sqlite>, folder_id: Uuid) -> Result<()> {
    let result = sqlx::query(
        "UPDATE folders SET first_activity_completed = 1, updated_at = ? WHERE guid = ?",
    )
    .bind(chrono::Utc::now())
    .bind(folder_id.to_string())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::FolderNotFound(folder_id));
    }
    Ok(())
}
