//! Folder status registry
//!
//! The single source of truth for legal lifecycle transitions. Everything
//! that mutates folder status goes through `next_status_on_action`; an
//! action absent from the table is an `InvalidTransition` error, never a
//! silent no-op.

use crate::error::{Error, Result};
use cfw_common::events::{FolderStatus, ReviewerRole};
use serde::{Deserialize, Serialize};

/// Actions that drive the folder lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Faculty submits an editable folder into the review chain
    Submit,
    /// The stage owner picks the folder up for active review
    BeginReview,
    /// The stage owner approves and moves the folder forward
    Approve,
    /// The stage owner returns the folder to an editable state
    Reject,
    /// The audit member marks the audit pass finished
    CompleteAudit,
    /// The head of department closes the second cycle
    Finalize,
}

impl std::fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewAction::Submit => write!(f, "submit"),
            ReviewAction::BeginReview => write!(f, "begin_review"),
            ReviewAction::Approve => write!(f, "approve"),
            ReviewAction::Reject => write!(f, "reject"),
            ReviewAction::CompleteAudit => write!(f, "complete_audit"),
            ReviewAction::Finalize => write!(f, "finalize"),
        }
    }
}

/// True only for the states faculty may submit from: Draft and the three
/// rejected re-entry states.
pub fn is_submittable_from(status: FolderStatus) -> bool {
    matches!(
        status,
        FolderStatus::Draft
            | FolderStatus::RejectedCoordinator
            | FolderStatus::RejectedByConvener
            | FolderStatus::RejectedByHod
    )
}

/// True for the terminal state (no outbound transitions)
pub fn is_terminal(status: FolderStatus) -> bool {
    matches!(status, FolderStatus::Completed)
}

/// The legal transition table
///
/// Returns the next status, or `InvalidTransition` if the action is not
/// present in the table for the given status.
pub fn next_status_on_action(status: FolderStatus, action: ReviewAction) -> Result<FolderStatus> {
    use FolderStatus::*;
    use ReviewAction::*;

    let next = match (status, action) {
        (Draft, Submit) => Submitted,
        (RejectedCoordinator, Submit) => Submitted,
        (RejectedByConvener, Submit) => Submitted,
        (RejectedByHod, Submit) => Submitted,

        (Submitted, BeginReview) => UnderReviewByCoordinator,
        (Submitted, Reject) => RejectedCoordinator,
        (UnderReviewByCoordinator, Approve) => ApprovedCoordinator,
        (UnderReviewByCoordinator, Reject) => RejectedCoordinator,

        (ApprovedCoordinator, BeginReview) => UnderAudit,
        (UnderAudit, CompleteAudit) => AuditCompleted,

        (AuditCompleted, Approve) => SubmittedToHod,
        (AuditCompleted, Reject) => RejectedByConvener,

        (SubmittedToHod, BeginReview) => UnderReviewByHod,
        (UnderReviewByHod, Approve) => ApprovedByHod,
        (UnderReviewByHod, Reject) => RejectedByHod,

        (ApprovedByHod, Finalize) => Completed,

        (from, action) => {
            return Err(Error::InvalidTransition {
                from,
                action: action.to_string(),
            })
        }
    };

    Ok(next)
}

/// Which role owns the decision at a reviewable status
///
/// Returns `None` for editable and terminal states, where no reviewer holds
/// the folder.
pub fn review_stage_role(status: FolderStatus) -> Option<ReviewerRole> {
    use FolderStatus::*;

    match status {
        Submitted | UnderReviewByCoordinator => Some(ReviewerRole::Coordinator),
        ApprovedCoordinator | UnderAudit => Some(ReviewerRole::AuditMember),
        AuditCompleted => Some(ReviewerRole::Convener),
        SubmittedToHod | UnderReviewByHod | ApprovedByHod => Some(ReviewerRole::Hod),
        Draft | RejectedCoordinator | RejectedByConvener | RejectedByHod | Completed => None,
    }
}
