//! Reviewer feedback endpoints

use crate::api::{error_response, StatusResponse};
use crate::folder::feedback::{FeedbackEntry, FeedbackStore};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cfw_common::events::FeedbackChannel;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    pub channel: FeedbackChannel,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// Free-text notes; an empty string intentionally clears the entry
    pub notes: String,
}

fn store_for(state: &AppState, channel: FeedbackChannel) -> &FeedbackStore {
    match channel {
        FeedbackChannel::Coordinator => &state.coordinator_feedback,
        FeedbackChannel::AuditMember => &state.audit_feedback,
    }
}

/// GET /api/folder/:id/feedback/:section?channel= - Read the live entry
///
/// Returns the empty placeholder when no entry exists (or the read fails);
/// a feedback panel never blocks the page.
pub async fn get_feedback(
    State(state): State<AppState>,
    Path((folder_id, section)): Path<(Uuid, String)>,
    Query(query): Query<ChannelQuery>,
) -> Result<Json<FeedbackEntry>, (StatusCode, Json<StatusResponse>)> {
    // Unknown folder is a 404; a missing entry is not
    state.service.load_folder(folder_id).await.map_err(error_response)?;

    let entry = store_for(&state, query.channel).get(folder_id, &section).await;
    Ok(Json(entry))
}

/// PUT /api/folder/:id/feedback/:section?channel= - Write the entry
///
/// Overwrites any prior entry for the key. Failures surface as errors;
/// silently losing reviewer feedback is not acceptable.
pub async fn put_feedback(
    State(state): State<AppState>,
    Path((folder_id, section)): Path<(Uuid, String)>,
    Query(query): Query<ChannelQuery>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackEntry>, (StatusCode, Json<StatusResponse>)> {
    state.service.load_folder(folder_id).await.map_err(error_response)?;

    let entry = store_for(&state, query.channel)
        .put(folder_id, &section, req.notes.trim())
        .await
        .map_err(error_response)?;
    Ok(Json(entry))
}
