//! Submission and review decision endpoints

use crate::api::{error_response, StatusResponse};
use crate::folder::permission::ReviewContext;
use crate::folder::service::Decision;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cfw_common::events::{FolderStatus, ReviewerRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body carrying only the caller context
#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub role: ReviewerRole,
    #[serde(default)]
    pub review_mode: bool,
}

impl ContextRequest {
    fn context(&self) -> ReviewContext {
        ReviewContext {
            role: self.role,
            review_mode: self.review_mode,
        }
    }
}

/// Body of a review decision
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub action: Decision,
    #[serde(default)]
    pub notes: Option<String>,
    pub role: ReviewerRole,
    #[serde(default)]
    pub review_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub status: FolderStatus,
}

/// POST /api/folder/:id/submit - Faculty submits an editable folder
pub async fn submit_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<Uuid>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<TransitionResponse>, (StatusCode, Json<StatusResponse>)> {
    let status = state
        .service
        .submit(folder_id, &req.context())
        .await
        .map_err(error_response)?;
    Ok(Json(TransitionResponse { status }))
}

/// POST /api/folder/:id/review - Stage owner picks the folder up
pub async fn begin_review(
    State(state): State<AppState>,
    Path(folder_id): Path<Uuid>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<TransitionResponse>, (StatusCode, Json<StatusResponse>)> {
    let status = state
        .service
        .begin_review(folder_id, &req.context())
        .await
        .map_err(error_response)?;
    Ok(Json(TransitionResponse { status }))
}

/// POST /api/folder/:id/decision - Approve or reject at the current stage
pub async fn decide(
    State(state): State<AppState>,
    Path(folder_id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<TransitionResponse>, (StatusCode, Json<StatusResponse>)> {
    let ctx = ReviewContext {
        role: req.role,
        review_mode: req.review_mode,
    };
    let status = state
        .service
        .decide(folder_id, req.action, req.notes.as_deref(), &ctx)
        .await
        .map_err(error_response)?;
    Ok(Json(TransitionResponse { status }))
}
