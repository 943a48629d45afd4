//! Folder read and creation endpoints

use crate::api::{error_response, StatusResponse};
use crate::db;
use crate::error::Error;
use crate::folder::permission::{can_edit_in_context, ReviewContext};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cfw_common::events::{FolderEvent, FolderStatus, ReviewerRole};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Caller context supplied as query parameters on read endpoints
#[derive(Debug, Deserialize)]
pub struct ContextQuery {
    pub role: ReviewerRole,
    #[serde(default)]
    pub review_mode: bool,
    /// Deadline-derived flag computed by the surrounding system; accepted
    /// and threaded through, currently without effect on editability
    #[serde(default)]
    pub can_edit_for_final_submission: bool,
}

impl ContextQuery {
    pub fn context(&self) -> ReviewContext {
        ReviewContext {
            role: self.role,
            review_mode: self.review_mode,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FolderSummary {
    pub id: Uuid,
    pub title: String,
    pub status: FolderStatus,
    pub first_activity_completed: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub section: String,
    pub content: serde_json::Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct FolderViewResponse {
    pub id: Uuid,
    pub title: String,
    pub status: FolderStatus,
    pub first_activity_completed: bool,
    /// Editability computed for the caller's context
    pub can_edit: bool,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct DecisionView {
    pub actor_role: String,
    pub action: String,
    pub from_status: String,
    pub to_status: String,
    pub notes: Option<String>,
    pub decided_at: chrono::DateTime<chrono::Utc>,
}

fn summary_from_record(record: &cfw_common::db::FolderRecord) -> Result<FolderSummary, Error> {
    let id = Uuid::parse_str(&record.guid)
        .map_err(|e| Error::Internal(format!("Invalid folder UUID: {}", e)))?;
    Ok(FolderSummary {
        id,
        title: record.title.clone(),
        status: record.status,
        first_activity_completed: record.first_activity_completed,
        updated_at: record.updated_at,
    })
}

/// GET /api/folders - List all folders
pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<Json<Vec<FolderSummary>>, (StatusCode, Json<StatusResponse>)> {
    let records = db::folders::list_folders(&state.db).await.map_err(error_response)?;
    let summaries = records
        .iter()
        .map(summary_from_record)
        .collect::<Result<Vec<_>, _>>()
        .map_err(error_response)?;
    Ok(Json(summaries))
}

/// POST /api/folders - Create a folder in Draft
pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<FolderSummary>), (StatusCode, Json<StatusResponse>)> {
    if req.title.trim().is_empty() {
        return Err(error_response(Error::BadRequest("title must not be empty".to_string())));
    }

    let record = db::folders::create_folder(&state.db, req.title.trim())
        .await
        .map_err(error_response)?;
    let summary = summary_from_record(&record).map_err(error_response)?;

    info!(folder_id = %summary.id, "folder created");
    state.events.emit_lossy(FolderEvent::FolderCreated {
        folder_id: summary.id,
        timestamp: chrono::Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/folder/:id - Folder view with caller-specific editability
pub async fn get_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<Uuid>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<FolderViewResponse>, (StatusCode, Json<StatusResponse>)> {
    let folder = state.service.load_folder(folder_id).await.map_err(error_response)?;

    let can_edit = can_edit_in_context(
        folder.status,
        folder.first_activity_completed,
        query.can_edit_for_final_submission,
        &query.context(),
    );

    let sections = db::sections::get_sections(&state.db, folder_id)
        .await
        .map_err(error_response)?
        .into_iter()
        .map(|record| SectionView {
            section: record.section,
            content: record.content,
            updated_at: record.updated_at,
        })
        .collect();

    Ok(Json(FolderViewResponse {
        id: folder_id,
        title: folder.title,
        status: folder.status,
        first_activity_completed: folder.first_activity_completed,
        can_edit,
        sections,
    }))
}

/// GET /api/folder/:id/decisions - Review decision history
pub async fn get_decisions(
    State(state): State<AppState>,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<Vec<DecisionView>>, (StatusCode, Json<StatusResponse>)> {
    // 404 for unknown folders rather than an empty history
    state.service.load_folder(folder_id).await.map_err(error_response)?;

    let history = db::decisions::list_decisions(&state.db, folder_id)
        .await
        .map_err(error_response)?;

    Ok(Json(
        history
            .into_iter()
            .map(|record| DecisionView {
                actor_role: record.actor_role,
                action: record.action,
                from_status: record.from_status,
                to_status: record.to_status,
                notes: record.notes,
                decided_at: record.decided_at,
            })
            .collect(),
    ))
}
