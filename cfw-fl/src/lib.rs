//! cfw-fl library - Folder Lifecycle service
//!
//! Hosts the course-folder lifecycle core (status registry, permission
//! evaluator, feedback stores, save coordinator, lifecycle service) behind
//! an axum HTTP API with SSE event streaming.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod folder;

pub use error::{Error, Result};

use cfw_common::events::EventBus;
use folder::feedback::FeedbackStore;
use folder::save::SaveConfig;
use folder::service::FolderLifecycleService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Lifecycle orchestrator; the only component that mutates folder status
    pub service: Arc<FolderLifecycleService>,
    /// Application event bus (SSE source)
    pub events: EventBus,
    /// Coordinator-channel feedback store
    pub coordinator_feedback: FeedbackStore,
    /// Audit-member-channel feedback store
    pub audit_feedback: FeedbackStore,
}

impl AppState {
    /// Create application state with explicit configuration
    pub fn new(db: SqlitePool, events: EventBus, save_config: SaveConfig) -> Self {
        let service = Arc::new(FolderLifecycleService::new(
            db.clone(),
            events.clone(),
            save_config,
        ));
        let coordinator_feedback = FeedbackStore::coordinator(db.clone(), events.clone());
        let audit_feedback = FeedbackStore::audit_member(db.clone(), events.clone());
        Self {
            db,
            service,
            events,
            coordinator_feedback,
            audit_feedback,
        }
    }

    /// Create application state from database settings
    pub async fn from_settings(db: SqlitePool) -> Result<Self> {
        let capacity = db::settings::load_event_bus_capacity(&db).await?;
        let save_config = SaveConfig::from_database(&db).await;
        let events = EventBus::new(capacity);
        Ok(Self::new(db, events, save_config))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Folder collection
        .route("/api/folders", get(api::folders::list_folders))
        .route("/api/folders", post(api::folders::create_folder))
        // Folder view and history
        .route("/api/folder/:id", get(api::folders::get_folder))
        .route("/api/folder/:id/decisions", get(api::folders::get_decisions))
        // Section editing (save coordinator triggers)
        .route("/api/folder/:id/section/:section", put(api::sections::edit_section))
        .route("/api/folder/:id/section/:section", delete(api::sections::close_section))
        .route("/api/folder/:id/section/:section/flush", post(api::sections::flush_section))
        .route("/api/folder/:id/section/:section/suspend", post(api::sections::suspend_section))
        .route("/api/folder/:id/section/:section/unload", post(api::sections::unload_section))
        // Lifecycle transitions
        .route("/api/folder/:id/submit", post(api::review::submit_folder))
        .route("/api/folder/:id/review", post(api::review::begin_review))
        .route("/api/folder/:id/decision", post(api::review::decide))
        // Reviewer feedback
        .route("/api/folder/:id/feedback/:section", get(api::feedback::get_feedback))
        .route("/api/folder/:id/feedback/:section", put(api::feedback::put_feedback))
        // SSE event stream
        .route("/api/events", get(api::sse::event_stream))
        // Health (no state-dependent routes)
        .merge(api::health::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
