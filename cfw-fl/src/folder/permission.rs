//! Edit permission evaluation
//!
//! `can_edit` is a pure function from folder status plus contextual role
//! flags to editability. The guard clauses are ordered and the order is
//! load-bearing: the audit-member check short-circuits before any status
//! check, and the ApprovedByHod branch must run before the generic
//! submitted-set test because the two tests are not mutually exclusive.

use cfw_common::events::{FolderStatus, ReviewerRole};
use serde::{Deserialize, Serialize};

/// Caller context for a folder request, derived per request and never
/// persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewContext {
    /// Contextual role of the caller
    pub role: ReviewerRole,
    /// Whether this access is a reviewing pass-through (read-oriented)
    /// versus an editing pass. Feeds feedback-channel selection; the edit
    /// flags themselves derive from the role.
    #[serde(default)]
    pub review_mode: bool,
}

impl ReviewContext {
    pub fn new(role: ReviewerRole) -> Self {
        Self { role, review_mode: false }
    }

    pub fn reviewing(role: ReviewerRole) -> Self {
        Self { role, review_mode: true }
    }

    /// Derive the (audit, convener, hod) review flags consumed by `can_edit`
    pub fn edit_flags(&self) -> (bool, bool, bool) {
        (
            self.role == ReviewerRole::AuditMember,
            self.role == ReviewerRole::Convener,
            self.role == ReviewerRole::Hod,
        )
    }
}

/// Statuses that behave like Draft for permission purposes
fn is_editable_status(status: FolderStatus) -> bool {
    matches!(
        status,
        FolderStatus::Draft
            | FolderStatus::RejectedCoordinator
            | FolderStatus::RejectedByConvener
            | FolderStatus::RejectedByHod
    )
}

/// Statuses locked by an in-progress or finished submission
fn is_submitted_status(status: FolderStatus) -> bool {
    matches!(
        status,
        FolderStatus::Submitted
            | FolderStatus::UnderReviewByCoordinator
            | FolderStatus::ApprovedCoordinator
            | FolderStatus::UnderAudit
            | FolderStatus::AuditCompleted
            | FolderStatus::SubmittedToHod
            | FolderStatus::UnderReviewByHod
            | FolderStatus::Completed
    )
}

/// Decide whether the caller may edit folder content.
///
/// Pure: no I/O, no side effects, deterministic for identical inputs.
///
/// `can_edit_for_final_submission` is the deadline-derived flag supplied by
/// the surrounding system. It is accepted for forward compatibility but not
/// consulted by any branch below; this matches the observed behavior and is
/// a known gap pending product clarification, not something to silently
/// "fix" here.
pub fn can_edit(
    status: FolderStatus,
    first_activity_completed: bool,
    can_edit_for_final_submission: bool,
    is_audit_member_review: bool,
    is_convener_review: bool,
    is_hod_review: bool,
) -> bool {
    let _ = can_edit_for_final_submission;

    // Audit members never edit, only annotate
    if is_audit_member_review {
        return false;
    }

    // The second-cycle exception: HOD-approved folders reopen for the final
    // submission once the first activity cycle is complete
    let can_edit_for_second_submission =
        status == FolderStatus::ApprovedByHod && first_activity_completed;

    // Locked while submitted, unless the second-cycle exception applies
    if is_submitted_status(status) && !can_edit_for_second_submission {
        return false;
    }

    // ApprovedByHod is not in the submitted set and needs its own branch
    // ahead of the reviewer/faculty rules
    if status == FolderStatus::ApprovedByHod {
        return can_edit_for_second_submission;
    }

    // Reviewers in their own pending/editable view follow the plain
    // editable-state rule, ignoring the second-submission exception
    if is_convener_review || is_hod_review {
        return is_editable_status(status);
    }

    // Faculty (and coordinator editing passes)
    is_editable_status(status) || can_edit_for_second_submission
}

/// Evaluate `can_edit` from a request context
pub fn can_edit_in_context(
    status: FolderStatus,
    first_activity_completed: bool,
    can_edit_for_final_submission: bool,
    ctx: &ReviewContext,
) -> bool {
    let (audit, convener, hod) = ctx.edit_flags();
    can_edit(
        status,
        first_activity_completed,
        can_edit_for_final_submission,
        audit,
        convener,
        hod,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every (status, flags) combination, for exhaustive property checks
    fn all_inputs() -> impl Iterator<Item = (FolderStatus, bool, bool, bool, bool, bool)> {
        let bools = [false, true];
        FolderStatus::ALL.into_iter().flat_map(move |status| {
            bools.into_iter().flat_map(move |fac| {
                bools.into_iter().flat_map(move |deadline| {
                    bools.into_iter().flat_map(move |audit| {
                        bools.into_iter().flat_map(move |convener| {
                            bools
                                .into_iter()
                                .map(move |hod| (status, fac, deadline, audit, convener, hod))
                        })
                    })
                })
            })
        })
    }

    #[test]
    fn test_deterministic() {
        for (status, fac, deadline, audit, convener, hod) in all_inputs() {
            let first = can_edit(status, fac, deadline, audit, convener, hod);
            let second = can_edit(status, fac, deadline, audit, convener, hod);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_audit_member_never_edits() {
        for (status, fac, deadline, _, convener, hod) in all_inputs() {
            assert!(
                !can_edit(status, fac, deadline, true, convener, hod),
                "audit member must not edit at {}",
                status
            );
        }
    }

    #[test]
    fn test_deadline_flag_is_inert() {
        // Flipping can_edit_for_final_submission never changes the outcome
        for (status, fac, _, audit, convener, hod) in all_inputs() {
            let with = can_edit(status, fac, true, audit, convener, hod);
            let without = can_edit(status, fac, false, audit, convener, hod);
            assert_eq!(with, without, "deadline flag affected {}", status);
        }
    }

    #[test]
    fn test_draft_editable_for_faculty() {
        assert!(can_edit(FolderStatus::Draft, false, false, false, false, false));
        assert!(can_edit(FolderStatus::Draft, true, true, false, false, false));
    }

    #[test]
    fn test_second_cycle_exception() {
        // Faculty context: editable only once the first activity completed
        assert!(can_edit(FolderStatus::ApprovedByHod, true, false, false, false, false));
        assert!(!can_edit(FolderStatus::ApprovedByHod, false, false, false, false, false));
    }

    #[test]
    fn test_second_cycle_exception_not_extended_to_reviewers() {
        // Convener/HOD review contexts follow the plain editable-state rule
        assert!(!can_edit(FolderStatus::ApprovedByHod, true, false, false, true, false));
        assert!(!can_edit(FolderStatus::ApprovedByHod, true, false, false, false, true));
    }

    #[test]
    fn test_submitted_statuses_locked() {
        for status in [
            FolderStatus::Submitted,
            FolderStatus::UnderReviewByCoordinator,
            FolderStatus::ApprovedCoordinator,
            FolderStatus::UnderAudit,
            FolderStatus::AuditCompleted,
            FolderStatus::SubmittedToHod,
            FolderStatus::UnderReviewByHod,
            FolderStatus::Completed,
        ] {
            for fac in [false, true] {
                assert!(
                    !can_edit(status, fac, false, false, false, false),
                    "{} must be locked",
                    status
                );
            }
        }
    }

    #[test]
    fn test_rejected_states_editable_for_reviewer_contexts() {
        for status in [
            FolderStatus::Draft,
            FolderStatus::RejectedCoordinator,
            FolderStatus::RejectedByConvener,
            FolderStatus::RejectedByHod,
        ] {
            assert!(can_edit(status, false, false, false, true, false));
            assert!(can_edit(status, false, false, false, false, true));
        }
    }

    #[test]
    fn test_context_flag_derivation() {
        assert_eq!(
            ReviewContext::new(ReviewerRole::AuditMember).edit_flags(),
            (true, false, false)
        );
        assert_eq!(
            ReviewContext::reviewing(ReviewerRole::Convener).edit_flags(),
            (false, true, false)
        );
        assert_eq!(ReviewContext::new(ReviewerRole::Hod).edit_flags(), (false, false, true));
        assert_eq!(ReviewContext::new(ReviewerRole::Faculty).edit_flags(), (false, false, false));
    }

    #[test]
    fn test_context_evaluation_matches_flat_call() {
        let ctx = ReviewContext::reviewing(ReviewerRole::AuditMember);
        assert!(!can_edit_in_context(FolderStatus::Draft, false, false, &ctx));

        let ctx = ReviewContext::new(ReviewerRole::Faculty);
        assert!(can_edit_in_context(FolderStatus::RejectedByHod, false, false, &ctx));
    }
}
