//! Folder section content access
//!
//! Section content is an opaque JSON blob keyed by section name; the core
//! never interprets it. `SqlSectionStore` is the database-backed
//! implementation of the save coordinator's persistence seam.

use crate::error::{Error, Result};
use crate::folder::save::SectionStore;
use async_trait::async_trait;
use cfw_common::db::SectionRecord;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Write one section's content blob (insert or overwrite)
pub async fn upsert_section(
    db: &Pool<Sqlite>,
    folder_id: Uuid,
    section: &str,
    content: &serde_json::Value,
) -> Result<()> {
    let content_text = serde_json::to_string(content)
        .map_err(|e| Error::Internal(format!("Cannot serialize section content: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO folder_sections (folder_guid, section, content, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(folder_guid, section)
        DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at
        "#,
    )
    .bind(folder_id.to_string())
    .bind(section)
    .bind(content_text)
    .bind(chrono::Utc::now())
    .execute(db)
    .await?;

    Ok(())
}

/// Fetch one section, if present
pub async fn get_section(
    db: &Pool<Sqlite>,
    folder_id: Uuid,
    section: &str,
) -> Result<Option<SectionRecord>> {
    let row: Option<(String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
        "SELECT content, updated_at FROM folder_sections WHERE folder_guid = ? AND section = ?",
    )
    .bind(folder_id.to_string())
    .bind(section)
    .fetch_optional(db)
    .await?;

    row.map(|(content_text, updated_at)| {
        let content = serde_json::from_str(&content_text)
            .map_err(|e| Error::Internal(format!("Corrupt section content: {}", e)))?;
        Ok(SectionRecord {
            folder_guid: folder_id.to_string(),
            section: section.to_string(),
            content,
            updated_at,
        })
    })
    .transpose()
}

/// Fetch all sections of a folder
pub async fn get_sections(db: &Pool<Sqlite>, folder_id: Uuid) -> Result<Vec<SectionRecord>> {
    let rows: Vec<(String, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
        "SELECT section, content, updated_at FROM folder_sections
         WHERE folder_guid = ? ORDER BY section",
    )
    .bind(folder_id.to_string())
    .fetch_all(db)
    .await?;

    rows.into_iter()
        .map(|(section, content_text, updated_at)| {
            let content = serde_json::from_str(&content_text)
                .map_err(|e| Error::Internal(format!("Corrupt section content: {}", e)))?;
            Ok(SectionRecord {
                folder_guid: folder_id.to_string(),
                section,
                content,
                updated_at,
            })
        })
        .collect()
}

/// Database-backed section writer used by live save sessions
#[derive(Clone)]
pub struct SqlSectionStore {
    db: Pool<Sqlite>,
}

impl SqlSectionStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SectionStore for SqlSectionStore {
    async fn persist_section(
        &self,
        folder_id: Uuid,
        section: &str,
        content: &serde_json::Value,
    ) -> Result<()> {
        upsert_section(&self.db, folder_id, section, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfw_common::db::init_memory_database;

    async fn setup() -> (Pool<Sqlite>, Uuid) {
        let db = init_memory_database().await.unwrap();
        let folder = crate::db::folders::create_folder(&db, "Microprocessors").await.unwrap();
        let id = Uuid::parse_str(&folder.guid).unwrap();
        (db, id)
    }

    #[tokio::test]
    async fn test_upsert_and_get_section() {
        let (db, folder_id) = setup().await;

        let content = serde_json::json!({ "weeks": 16, "topics": ["pipelining"] });
        upsert_section(&db, folder_id, "COURSE_OUTLINE", &content).await.unwrap();

        let record = get_section(&db, folder_id, "COURSE_OUTLINE").await.unwrap().unwrap();
        assert_eq!(record.content, content);
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let (db, folder_id) = setup().await;

        upsert_section(&db, folder_id, "ASSIGNMENTS", &serde_json::json!({ "count": 1 }))
            .await
            .unwrap();
        upsert_section(&db, folder_id, "ASSIGNMENTS", &serde_json::json!({ "count": 2 }))
            .await
            .unwrap();

        let record = get_section(&db, folder_id, "ASSIGNMENTS").await.unwrap().unwrap();
        assert_eq!(record.content, serde_json::json!({ "count": 2 }));

        let sections = get_sections(&db, folder_id).await.unwrap();
        assert_eq!(sections.len(), 1);
    }

    #[tokio::test]
    async fn test_composite_section_keys() {
        let (db, folder_id) = setup().await;

        // Composite keys chosen by the caller are stored verbatim
        let key = "ASSIGNMENT_3_QUESTION_PAPER";
        upsert_section(&db, folder_id, key, &serde_json::json!({ "marks": 20 })).await.unwrap();

        let record = get_section(&db, folder_id, key).await.unwrap().unwrap();
        assert_eq!(record.section, key);
    }

    #[tokio::test]
    async fn test_missing_section_is_none() {
        let (db, folder_id) = setup().await;
        assert!(get_section(&db, folder_id, "NOT_THERE").await.unwrap().is_none());
    }
}
