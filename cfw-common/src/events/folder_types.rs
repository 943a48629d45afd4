//! Folder lifecycle type definitions
//!
//! Supporting types for folder status, review roles, and feedback channels.

use serde::{Deserialize, Serialize};

/// Folder lifecycle status enumeration
///
/// Serialized in SCREAMING_SNAKE_CASE, which is also the form stored in the
/// `folders.status` column and used on the wire by the surrounding CRUD
/// system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FolderStatus {
    /// Being assembled by the owning faculty member
    Draft,
    /// Submitted, waiting for the coordinator to pick it up
    Submitted,
    /// Coordinator actively reviewing
    UnderReviewByCoordinator,
    /// Coordinator approved, waiting for audit
    ApprovedCoordinator,
    /// Returned by the coordinator; editable again
    RejectedCoordinator,
    /// Audit member reviewing
    UnderAudit,
    /// Audit pass finished, waiting for convener decision
    AuditCompleted,
    /// Returned by the convener; editable again
    RejectedByConvener,
    /// Forwarded to the head of department
    SubmittedToHod,
    /// Head of department actively reviewing
    UnderReviewByHod,
    /// Approved by the head of department
    ApprovedByHod,
    /// Returned by the head of department; editable again
    RejectedByHod,
    /// Terminal: full two-pass review finished
    Completed,
}

impl FolderStatus {
    /// All states, in transition order. Useful for exhaustive tests.
    pub const ALL: [FolderStatus; 13] = [
        FolderStatus::Draft,
        FolderStatus::Submitted,
        FolderStatus::UnderReviewByCoordinator,
        FolderStatus::ApprovedCoordinator,
        FolderStatus::RejectedCoordinator,
        FolderStatus::UnderAudit,
        FolderStatus::AuditCompleted,
        FolderStatus::RejectedByConvener,
        FolderStatus::SubmittedToHod,
        FolderStatus::UnderReviewByHod,
        FolderStatus::ApprovedByHod,
        FolderStatus::RejectedByHod,
        FolderStatus::Completed,
    ];

    /// Stable string form, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderStatus::Draft => "DRAFT",
            FolderStatus::Submitted => "SUBMITTED",
            FolderStatus::UnderReviewByCoordinator => "UNDER_REVIEW_BY_COORDINATOR",
            FolderStatus::ApprovedCoordinator => "APPROVED_COORDINATOR",
            FolderStatus::RejectedCoordinator => "REJECTED_COORDINATOR",
            FolderStatus::UnderAudit => "UNDER_AUDIT",
            FolderStatus::AuditCompleted => "AUDIT_COMPLETED",
            FolderStatus::RejectedByConvener => "REJECTED_BY_CONVENER",
            FolderStatus::SubmittedToHod => "SUBMITTED_TO_HOD",
            FolderStatus::UnderReviewByHod => "UNDER_REVIEW_BY_HOD",
            FolderStatus::ApprovedByHod => "APPROVED_BY_HOD",
            FolderStatus::RejectedByHod => "REJECTED_BY_HOD",
            FolderStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for FolderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FolderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown folder status: {}", s))
    }
}

/// Contextual role of the caller for a folder request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewerRole {
    /// Owning faculty member (author of the folder)
    Faculty,
    /// Course coordinator (first review stage)
    Coordinator,
    /// Audit committee member (annotates, never edits)
    AuditMember,
    /// Audit convener (decides after audit completion)
    Convener,
    /// Head of department (final review stage)
    Hod,
}

impl std::fmt::Display for ReviewerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewerRole::Faculty => write!(f, "FACULTY"),
            ReviewerRole::Coordinator => write!(f, "COORDINATOR"),
            ReviewerRole::AuditMember => write!(f, "AUDIT_MEMBER"),
            ReviewerRole::Convener => write!(f, "CONVENER"),
            ReviewerRole::Hod => write!(f, "HOD"),
        }
    }
}

impl std::str::FromStr for ReviewerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FACULTY" => Ok(ReviewerRole::Faculty),
            "COORDINATOR" => Ok(ReviewerRole::Coordinator),
            "AUDIT_MEMBER" => Ok(ReviewerRole::AuditMember),
            "CONVENER" => Ok(ReviewerRole::Convener),
            "HOD" => Ok(ReviewerRole::Hod),
            other => Err(format!("unknown reviewer role: {}", other)),
        }
    }
}

/// Reviewer feedback channel
///
/// Coordinator and audit-member feedback are stored independently per
/// (folder, section); the two channels never shadow each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackChannel {
    Coordinator,
    AuditMember,
}

impl FeedbackChannel {
    /// Stable string form stored in the `folder_feedback.channel` column
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackChannel::Coordinator => "coordinator",
            FeedbackChannel::AuditMember => "audit_member",
        }
    }
}

impl std::fmt::Display for FeedbackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FeedbackChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coordinator" => Ok(FeedbackChannel::Coordinator),
            "audit_member" => Ok(FeedbackChannel::AuditMember),
            other => Err(format!("unknown feedback channel: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_string_round_trip() {
        for status in FolderStatus::ALL {
            let parsed = FolderStatus::from_str(status.as_str()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_serde_matches_as_str() {
        for status in FolderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(FolderStatus::from_str("ARCHIVED").is_err());
    }

    #[test]
    fn test_channel_round_trip() {
        for channel in [FeedbackChannel::Coordinator, FeedbackChannel::AuditMember] {
            assert_eq!(FeedbackChannel::from_str(channel.as_str()).unwrap(), channel);
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            ReviewerRole::Faculty,
            ReviewerRole::Coordinator,
            ReviewerRole::AuditMember,
            ReviewerRole::Convener,
            ReviewerRole::Hod,
        ] {
            assert_eq!(ReviewerRole::from_str(&role.to_string()).unwrap(), role);
        }
    }
}
