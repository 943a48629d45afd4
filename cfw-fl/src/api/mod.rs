//! HTTP API for the folder lifecycle service

pub mod feedback;
pub mod folders;
pub mod health;
pub mod review;
pub mod sections;
pub mod sse;

use crate::error::Error;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Simple status payload for error and acknowledgement responses
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { status: "ok".to_string() })
    }
}

/// Map service errors onto HTTP responses
///
/// Lifecycle errors are per-request and recoverable; nothing here is fatal
/// to the process.
pub fn error_response(e: Error) -> (StatusCode, Json<StatusResponse>) {
    let code = match &e {
        Error::PermissionDenied { .. } | Error::RoleMismatch { .. } => StatusCode::FORBIDDEN,
        Error::InvalidTransition { .. } => StatusCode::CONFLICT,
        Error::FolderNotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}
