//! Folder lifecycle orchestration
//!
//! `FolderLifecycleService` is the only component that mutates folder
//! status. Edit attempts are permission-checked against the persisted
//! status and forwarded to the section's save session; submission and
//! review actions are validated against the status registry and role-gated
//! per review stage.

use crate::db;
use crate::db::sections::SqlSectionStore;
use crate::error::{Error, Result};
use crate::folder::permission::{can_edit_in_context, ReviewContext};
use crate::folder::save::{SaveConfig, SaveSession, SectionStore};
use crate::folder::status::{
    is_submittable_from, next_status_on_action, review_stage_role, ReviewAction,
};
use cfw_common::db::FolderRecord;
use cfw_common::events::{EventBus, FolderEvent, FolderStatus, ReviewerRole};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// A review-stage decision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approve => write!(f, "approve"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

/// Orchestrates the status registry, permission evaluator, and save
/// coordinator for every content- or status-mutating request
pub struct FolderLifecycleService {
    db: SqlitePool,
    events: EventBus,
    store: Arc<dyn SectionStore>,
    save_config: SaveConfig,
    /// Live save sessions keyed by (folder, section)
    sessions: Mutex<HashMap<(Uuid, String), SaveSession>>,
}

impl FolderLifecycleService {
    /// Create a service writing sections through the database
    pub fn new(db: SqlitePool, events: EventBus, save_config: SaveConfig) -> Self {
        let store = Arc::new(SqlSectionStore::new(db.clone()));
        Self::with_store(db, events, save_config, store)
    }

    /// Create a service with a custom section store (used by tests)
    pub fn with_store(
        db: SqlitePool,
        events: EventBus,
        save_config: SaveConfig,
        store: Arc<dyn SectionStore>,
    ) -> Self {
        Self {
            db,
            events,
            store,
            save_config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Load a folder or fail with `FolderNotFound`
    pub async fn load_folder(&self, folder_id: Uuid) -> Result<FolderRecord> {
        db::folders::get_folder(&self.db, folder_id)
            .await?
            .ok_or(Error::FolderNotFound(folder_id))
    }

    /// Compute editability for a caller context against the persisted status
    pub async fn can_edit(
        &self,
        folder_id: Uuid,
        ctx: &ReviewContext,
        can_edit_for_final_submission: bool,
    ) -> Result<bool> {
        let folder = self.load_folder(folder_id).await?;
        Ok(can_edit_in_context(
            folder.status,
            folder.first_activity_completed,
            can_edit_for_final_submission,
            ctx,
        ))
    }

    // ========================================================================
    // Content editing
    // ========================================================================

    /// Buffer an edit through the section's save session
    ///
    /// Permission is evaluated against the current persisted status on every
    /// attempt; a read-only folder rejects the edit before anything reaches
    /// the save path.
    pub async fn attempt_edit(
        &self,
        folder_id: Uuid,
        section: &str,
        content: serde_json::Value,
        ctx: &ReviewContext,
        can_edit_for_final_submission: bool,
    ) -> Result<()> {
        let folder = self.load_folder(folder_id).await?;
        if !can_edit_in_context(
            folder.status,
            folder.first_activity_completed,
            can_edit_for_final_submission,
            ctx,
        ) {
            return Err(Error::PermissionDenied { status: folder.status });
        }

        let session = self.session(folder_id, section).await;
        session.buffer(content).await
    }

    /// Explicit save trigger for one section; surfaces failure
    pub async fn flush_edit(&self, folder_id: Uuid, section: &str) -> Result<()> {
        let session = {
            let sessions = self.sessions.lock().await;
            sessions.get(&(folder_id, section.to_string())).cloned()
        };
        match session {
            Some(session) => session.flush().await,
            // Nothing buffered for this key; an explicit save of a clean
            // context is a successful no-op
            None => Ok(()),
        }
    }

    /// Tab-hide trigger: re-arm the debounce window for dirty content
    pub async fn suspend_edit(&self, folder_id: Uuid, section: &str) -> Result<()> {
        let session = {
            let sessions = self.sessions.lock().await;
            sessions.get(&(folder_id, section.to_string())).cloned()
        };
        match session {
            Some(session) => session.hide().await,
            None => Ok(()),
        }
    }

    /// Teardown trigger: final save of dirty content, then drop the session
    pub async fn close_edit(&self, folder_id: Uuid, section: &str) -> Result<()> {
        let session = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(&(folder_id, section.to_string()))
        };
        match session {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }

    /// Best-effort unload notice; never blocks, no persistence guarantee
    pub async fn notify_unload(&self, folder_id: Uuid, section: &str) {
        let sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&(folder_id, section.to_string())) {
            session.notify_unload();
        }
    }

    /// Number of live save sessions (diagnostics)
    pub async fn open_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    // ========================================================================
    // Status transitions
    // ========================================================================

    /// Submit an editable folder into the review chain
    ///
    /// Faculty-only. Open save sessions for the folder are flushed first so
    /// submission never races ahead of a pending save.
    pub async fn submit(&self, folder_id: Uuid, ctx: &ReviewContext) -> Result<FolderStatus> {
        let folder = self.load_folder(folder_id).await?;

        if ctx.role != ReviewerRole::Faculty {
            return Err(Error::RoleMismatch {
                attempted: ctx.role,
                expected: ReviewerRole::Faculty,
                status: folder.status,
            });
        }
        if !is_submittable_from(folder.status) {
            return Err(Error::InvalidTransition {
                from: folder.status,
                action: ReviewAction::Submit.to_string(),
            });
        }

        self.flush_folder_sessions(folder_id).await?;
        self.apply_transition(&folder, folder_id, ReviewAction::Submit, ctx, None).await
    }

    /// Stage owner picks the folder up for active review
    pub async fn begin_review(&self, folder_id: Uuid, ctx: &ReviewContext) -> Result<FolderStatus> {
        let folder = self.load_folder(folder_id).await?;
        self.check_stage_role(&folder, ctx, ReviewAction::BeginReview.to_string())?;
        self.apply_transition(&folder, folder_id, ReviewAction::BeginReview, ctx, None).await
    }

    /// Record a review decision at the current stage
    ///
    /// Only the role owning the current review stage may decide; anyone else
    /// gets `RoleMismatch`, which is distinct from a legal role attempting
    /// an action the registry does not allow (`InvalidTransition`).
    pub async fn decide(
        &self,
        folder_id: Uuid,
        decision: Decision,
        notes: Option<&str>,
        ctx: &ReviewContext,
    ) -> Result<FolderStatus> {
        let folder = self.load_folder(folder_id).await?;
        self.check_stage_role(&folder, ctx, decision.to_string())?;

        let action = match (folder.status, decision) {
            // The audit member's approval is the audit-completion action
            (FolderStatus::UnderAudit, Decision::Approve) => ReviewAction::CompleteAudit,
            // The HOD's approval of the second cycle closes the folder
            (FolderStatus::ApprovedByHod, Decision::Approve) => ReviewAction::Finalize,
            (_, Decision::Approve) => ReviewAction::Approve,
            (_, Decision::Reject) => ReviewAction::Reject,
        };

        let new_status =
            self.apply_transition(&folder, folder_id, action, ctx, notes).await?;

        self.events.emit_lossy(FolderEvent::DecisionRecorded {
            folder_id,
            decided_by: ctx.role,
            from_status: folder.status,
            to_status: new_status,
            timestamp: chrono::Utc::now(),
        });

        Ok(new_status)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Get or spawn the save session for a (folder, section) key
    async fn session(&self, folder_id: Uuid, section: &str) -> SaveSession {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry((folder_id, section.to_string()))
            .or_insert_with(|| {
                SaveSession::spawn(
                    folder_id,
                    section,
                    Arc::clone(&self.store),
                    self.events.clone(),
                    self.save_config.clone(),
                )
            })
            .clone()
    }

    /// Flush every open session of a folder; surfaces the first failure
    async fn flush_folder_sessions(&self, folder_id: Uuid) -> Result<()> {
        let sessions: Vec<SaveSession> = {
            let sessions = self.sessions.lock().await;
            sessions
                .iter()
                .filter(|((id, _), _)| *id == folder_id)
                .map(|(_, session)| session.clone())
                .collect()
        };
        for session in sessions {
            session.flush().await?;
        }
        Ok(())
    }

    fn check_stage_role(
        &self,
        folder: &FolderRecord,
        ctx: &ReviewContext,
        action: String,
    ) -> Result<()> {
        let expected = review_stage_role(folder.status).ok_or(Error::InvalidTransition {
            from: folder.status,
            action,
        })?;
        if ctx.role != expected {
            return Err(Error::RoleMismatch {
                attempted: ctx.role,
                expected,
                status: folder.status,
            });
        }
        Ok(())
    }

    /// Validate, persist, and announce one status transition
    async fn apply_transition(
        &self,
        folder: &FolderRecord,
        folder_id: Uuid,
        action: ReviewAction,
        ctx: &ReviewContext,
        notes: Option<&str>,
    ) -> Result<FolderStatus> {
        let new_status = next_status_on_action(folder.status, action)?;

        db::folders::persist_status(&self.db, folder_id, new_status).await?;

        // Completion of the full two-pass review; set once, never reset
        if new_status == FolderStatus::Completed && !folder.first_activity_completed {
            db::folders::set_first_activity_completed(&self.db, folder_id).await?;
        }

        db::decisions::record_decision(
            &self.db,
            folder_id,
            ctx.role,
            &action.to_string(),
            folder.status,
            new_status,
            notes,
        )
        .await?;

        info!(
            folder_id = %folder_id,
            from = %folder.status,
            to = %new_status,
            actor = %ctx.role,
            "folder status transition"
        );

        self.events.emit_lossy(FolderEvent::StatusChanged {
            folder_id,
            old_status: folder.status,
            new_status,
            actor: ctx.role,
            timestamp: chrono::Utc::now(),
        });

        Ok(new_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfw_common::db::init_memory_database;

    async fn setup() -> (Arc<FolderLifecycleService>, SqlitePool, Uuid) {
        let db = init_memory_database().await.unwrap();
        let events = EventBus::new(64);
        let service = Arc::new(FolderLifecycleService::new(
            db.clone(),
            events,
            SaveConfig::default(),
        ));
        let folder = db::folders::create_folder(&db, "Control Systems").await.unwrap();
        let folder_id = Uuid::parse_str(&folder.guid).unwrap();
        (service, db, folder_id)
    }

    fn faculty() -> ReviewContext {
        ReviewContext::new(ReviewerRole::Faculty)
    }

    fn role(r: ReviewerRole) -> ReviewContext {
        ReviewContext::reviewing(r)
    }

    /// Walk a folder through the first full review cycle up to HOD approval
    async fn walk_to_hod_approval(service: &FolderLifecycleService, folder_id: Uuid) {
        service.submit(folder_id, &faculty()).await.unwrap();
        service.begin_review(folder_id, &role(ReviewerRole::Coordinator)).await.unwrap();
        service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Coordinator))
            .await
            .unwrap();
        service.begin_review(folder_id, &role(ReviewerRole::AuditMember)).await.unwrap();
        service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::AuditMember))
            .await
            .unwrap();
        service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Convener))
            .await
            .unwrap();
        service.begin_review(folder_id, &role(ReviewerRole::Hod)).await.unwrap();
        service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Hod))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_edit_in_draft_buffers_and_flushes() {
        let (service, db, folder_id) = setup().await;

        service
            .attempt_edit(
                folder_id,
                "COURSE_OUTLINE",
                serde_json::json!({ "weeks": 16 }),
                &faculty(),
                false,
            )
            .await
            .unwrap();
        assert_eq!(service.open_sessions().await, 1);

        service.flush_edit(folder_id, "COURSE_OUTLINE").await.unwrap();
        let record = db::sections::get_section(&db, folder_id, "COURSE_OUTLINE")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.content, serde_json::json!({ "weeks": 16 }));
    }

    #[tokio::test]
    async fn test_edit_rejected_for_audit_member_on_submitted_folder() {
        let (service, _db, folder_id) = setup().await;
        service.submit(folder_id, &faculty()).await.unwrap();

        let result = service
            .attempt_edit(
                folder_id,
                "COURSE_OUTLINE",
                serde_json::json!({}),
                &role(ReviewerRole::AuditMember),
                false,
            )
            .await;
        assert!(matches!(
            result,
            Err(Error::PermissionDenied { status: FolderStatus::Submitted })
        ));
        assert_eq!(service.open_sessions().await, 0, "nothing reached the save path");
    }

    #[tokio::test]
    async fn test_edit_allowed_again_after_coordinator_rejection() {
        let (service, _db, folder_id) = setup().await;
        service.submit(folder_id, &faculty()).await.unwrap();
        service
            .decide(
                folder_id,
                Decision::Reject,
                Some("CLO mapping missing"),
                &role(ReviewerRole::Coordinator),
            )
            .await
            .unwrap();

        service
            .attempt_edit(
                folder_id,
                "COURSE_OUTLINE",
                serde_json::json!({ "revised": true }),
                &faculty(),
                false,
            )
            .await
            .unwrap();
        assert_eq!(service.open_sessions().await, 1);
    }

    #[tokio::test]
    async fn test_submit_flushes_buffered_edits_first() {
        let (service, db, folder_id) = setup().await;

        service
            .attempt_edit(
                folder_id,
                "ASSIGNMENTS",
                serde_json::json!({ "count": 3 }),
                &faculty(),
                false,
            )
            .await
            .unwrap();
        service.submit(folder_id, &faculty()).await.unwrap();

        let record = db::sections::get_section(&db, folder_id, "ASSIGNMENTS")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.content, serde_json::json!({ "count": 3 }));
    }

    #[tokio::test]
    async fn test_submit_requires_faculty_role() {
        let (service, _db, folder_id) = setup().await;
        let result = service.submit(folder_id, &role(ReviewerRole::Coordinator)).await;
        assert!(matches!(result, Err(Error::RoleMismatch { .. })));
    }

    #[tokio::test]
    async fn test_submit_twice_is_invalid_transition() {
        let (service, _db, folder_id) = setup().await;
        service.submit(folder_id, &faculty()).await.unwrap();
        let result = service.submit(folder_id, &faculty()).await;
        assert!(matches!(
            result,
            Err(Error::InvalidTransition { from: FolderStatus::Submitted, .. })
        ));
    }

    #[tokio::test]
    async fn test_decide_out_of_turn_is_role_mismatch() {
        let (service, _db, folder_id) = setup().await;
        service.submit(folder_id, &faculty()).await.unwrap();

        // HOD cannot decide at the coordinator stage
        let result = service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Hod))
            .await;
        assert!(matches!(
            result,
            Err(Error::RoleMismatch { expected: ReviewerRole::Coordinator, .. })
        ));
    }

    #[tokio::test]
    async fn test_decide_on_draft_is_invalid_transition() {
        let (service, _db, folder_id) = setup().await;
        let result = service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Coordinator))
            .await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_full_two_cycle_walk_sets_flag_on_completion() {
        let (service, db, folder_id) = setup().await;

        walk_to_hod_approval(&service, folder_id).await;
        let folder = service.load_folder(folder_id).await.unwrap();
        assert_eq!(folder.status, FolderStatus::ApprovedByHod);
        assert!(!folder.first_activity_completed, "flag not set before completion");

        // HOD closes the second cycle
        let status = service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Hod))
            .await
            .unwrap();
        assert_eq!(status, FolderStatus::Completed);

        let folder = service.load_folder(folder_id).await.unwrap();
        assert!(folder.first_activity_completed);

        // Terminal: nothing further is legal
        let result = service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Hod))
            .await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        // The audit trail recorded the whole walk
        let history = db::decisions::list_decisions(&db, folder_id).await.unwrap();
        assert_eq!(history.first().unwrap().action, "submit");
        assert_eq!(history.last().unwrap().action, "finalize");
    }

    #[tokio::test]
    async fn test_convener_rejection_reopens_folder() {
        let (service, _db, folder_id) = setup().await;
        service.submit(folder_id, &faculty()).await.unwrap();
        service.begin_review(folder_id, &role(ReviewerRole::Coordinator)).await.unwrap();
        service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::Coordinator))
            .await
            .unwrap();
        service.begin_review(folder_id, &role(ReviewerRole::AuditMember)).await.unwrap();
        service
            .decide(folder_id, Decision::Approve, None, &role(ReviewerRole::AuditMember))
            .await
            .unwrap();

        let status = service
            .decide(
                folder_id,
                Decision::Reject,
                Some("scope mismatch with approved outline"),
                &role(ReviewerRole::Convener),
            )
            .await
            .unwrap();
        assert_eq!(status, FolderStatus::RejectedByConvener);

        // Editable and submittable again
        service
            .attempt_edit(folder_id, "COURSE_OUTLINE", serde_json::json!({}), &faculty(), false)
            .await
            .unwrap();
        service.submit(folder_id, &faculty()).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_edit_performs_final_save_and_drops_session() {
        let (service, db, folder_id) = setup().await;

        service
            .attempt_edit(
                folder_id,
                "LAB_MANUAL",
                serde_json::json!({ "experiments": 10 }),
                &faculty(),
                false,
            )
            .await
            .unwrap();
        service.close_edit(folder_id, "LAB_MANUAL").await.unwrap();

        assert_eq!(service.open_sessions().await, 0);
        let record = db::sections::get_section(&db, folder_id, "LAB_MANUAL")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.content, serde_json::json!({ "experiments": 10 }));
    }

    #[tokio::test]
    async fn test_edit_missing_folder() {
        let (service, _db, _folder_id) = setup().await;
        let result = service
            .attempt_edit(Uuid::new_v4(), "COURSE_OUTLINE", serde_json::json!({}), &faculty(), false)
            .await;
        assert!(matches!(result, Err(Error::FolderNotFound(_))));
    }

    #[tokio::test]
    async fn test_flush_without_session_is_no_op() {
        let (service, _db, folder_id) = setup().await;
        service.flush_edit(folder_id, "NEVER_OPENED").await.unwrap();
        service.suspend_edit(folder_id, "NEVER_OPENED").await.unwrap();
        service.close_edit(folder_id, "NEVER_OPENED").await.unwrap();
    }
}
