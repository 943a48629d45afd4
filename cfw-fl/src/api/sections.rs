//! Section editing endpoints
//!
//! These endpoints are the HTTP face of the save coordinator's triggers:
//! buffered edit (debounced), explicit flush, tab-hide suspend, teardown,
//! and the best-effort unload notice.

use crate::api::{error_response, StatusResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cfw_common::events::ReviewerRole;
use serde::Deserialize;
use uuid::Uuid;

use crate::folder::permission::ReviewContext;

/// Body of a buffered edit request
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    /// Opaque section content blob
    pub content: serde_json::Value,
    pub role: ReviewerRole,
    #[serde(default)]
    pub review_mode: bool,
    #[serde(default)]
    pub can_edit_for_final_submission: bool,
}

/// PUT /api/folder/:id/section/:section - Buffer an edit (debounced path)
pub async fn edit_section(
    State(state): State<AppState>,
    Path((folder_id, section)): Path<(Uuid, String)>,
    Json(req): Json<EditRequest>,
) -> Result<StatusCode, (StatusCode, Json<StatusResponse>)> {
    let ctx = ReviewContext {
        role: req.role,
        review_mode: req.review_mode,
    };

    state
        .service
        .attempt_edit(
            folder_id,
            &section,
            req.content,
            &ctx,
            req.can_edit_for_final_submission,
        )
        .await
        .map_err(error_response)?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/folder/:id/section/:section/flush - Explicit save trigger
///
/// Completes only after the save has finished; failures are surfaced so the
/// caller (e.g. a "Next" navigation) can decide whether to proceed.
pub async fn flush_section(
    State(state): State<AppState>,
    Path((folder_id, section)): Path<(Uuid, String)>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<StatusResponse>)> {
    state
        .service
        .flush_edit(folder_id, &section)
        .await
        .map_err(error_response)?;
    Ok(StatusResponse::ok())
}

/// POST /api/folder/:id/section/:section/suspend - Tab-hide trigger
///
/// Re-arms the debounce window for dirty content. Best-effort; not a forced
/// flush.
pub async fn suspend_section(
    State(state): State<AppState>,
    Path((folder_id, section)): Path<(Uuid, String)>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<StatusResponse>)> {
    state
        .service
        .suspend_edit(folder_id, &section)
        .await
        .map_err(error_response)?;
    Ok(StatusResponse::ok())
}

/// DELETE /api/folder/:id/section/:section - Editing context teardown
///
/// Performs one final save of dirty content before the session is dropped.
pub async fn close_section(
    State(state): State<AppState>,
    Path((folder_id, section)): Path<(Uuid, String)>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<StatusResponse>)> {
    state
        .service
        .close_edit(folder_id, &section)
        .await
        .map_err(error_response)?;
    Ok(StatusResponse::ok())
}

/// POST /api/folder/:id/section/:section/unload - Best-effort unload notice
///
/// Never blocks the client and guarantees nothing about persistence.
pub async fn unload_section(
    State(state): State<AppState>,
    Path((folder_id, section)): Path<(Uuid, String)>,
) -> Json<StatusResponse> {
    state.service.notify_unload(folder_id, &section).await;
    StatusResponse::ok()
}
