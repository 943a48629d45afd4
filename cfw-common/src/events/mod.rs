//! Event types for the CFW event system
//!
//! Provides shared event definitions and the EventBus used by the folder
//! lifecycle service and its SSE surface.

mod folder_types;

pub use folder_types::{FeedbackChannel, FolderStatus, ReviewerRole};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// CFW event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All lifecycle and autosave activity flows through this
/// central enum for type safety and exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FolderEvent {
    /// Folder status transitioned
    ///
    /// Triggers:
    /// - SSE: refresh status banner in all connected views
    /// - Review dashboards: re-bucket the folder under its new stage
    StatusChanged {
        /// Folder UUID
        folder_id: Uuid,
        /// Status before transition
        old_status: FolderStatus,
        /// Status after transition
        new_status: FolderStatus,
        /// Role that performed the transition
        actor: ReviewerRole,
        /// When the transition was persisted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Folder created in Draft
    FolderCreated {
        /// Folder UUID
        folder_id: Uuid,
        /// When the folder was created
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Section content persisted by the autosave path
    ///
    /// Triggers:
    /// - SSE: update "saved" indicator
    SectionSaved {
        /// Folder UUID
        folder_id: Uuid,
        /// Section key
        section: String,
        /// When the write completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A background (debounced) save failed
    ///
    /// Background save failures never interrupt the editing session; this
    /// event is the only place they surface.
    SectionSaveFailed {
        /// Folder UUID
        folder_id: Uuid,
        /// Section key
        section: String,
        /// Error message
        error: String,
        /// When the failure occurred
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Reviewer feedback written for a (folder, section, channel) key
    ///
    /// Triggers:
    /// - SSE / SectionSubscription: other live views of the same key
    ///   re-read from the store instead of trusting local state
    FeedbackSaved {
        /// Folder UUID
        folder_id: Uuid,
        /// Section key
        section: String,
        /// Which reviewer channel wrote
        channel: FeedbackChannel,
        /// When the write completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A review decision was recorded
    DecisionRecorded {
        /// Folder UUID
        folder_id: Uuid,
        /// Role that decided
        decided_by: ReviewerRole,
        /// Status before the decision
        from_status: FolderStatus,
        /// Status after the decision
        to_status: FolderStatus,
        /// When the decision was persisted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Client announced it is unloading (best-effort, no persistence
    /// guarantee)
    ClientUnloading {
        /// Folder UUID
        folder_id: Uuid,
        /// Section key the client was editing
        section: String,
        /// When the notice arrived
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl FolderEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            FolderEvent::StatusChanged { .. } => "StatusChanged",
            FolderEvent::FolderCreated { .. } => "FolderCreated",
            FolderEvent::SectionSaved { .. } => "SectionSaved",
            FolderEvent::SectionSaveFailed { .. } => "SectionSaveFailed",
            FolderEvent::FeedbackSaved { .. } => "FeedbackSaved",
            FolderEvent::DecisionRecorded { .. } => "DecisionRecorded",
            FolderEvent::ClientUnloading { .. } => "ClientUnloading",
        }
    }

    /// The (folder, section) key this event concerns, if it is section-scoped
    pub fn section_key(&self) -> Option<(Uuid, &str)> {
        match self {
            FolderEvent::SectionSaved { folder_id, section, .. }
            | FolderEvent::SectionSaveFailed { folder_id, section, .. }
            | FolderEvent::FeedbackSaved { folder_id, section, .. }
            | FolderEvent::ClientUnloading { folder_id, section, .. } => {
                Some((*folder_id, section.as_str()))
            }
            _ => None,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FolderEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FolderEvent> {
        self.tx.subscribe()
    }

    /// Subscribe to events for one (folder, section) key
    ///
    /// Returns a subscription that yields only section-scoped events
    /// matching the key. This is the refresh mechanism for feedback views:
    /// interest is registered explicitly per key rather than filtering in
    /// ad-hoc view code.
    pub fn subscribe_section(&self, folder_id: Uuid, section: impl Into<String>) -> SectionSubscription {
        SectionSubscription {
            rx: self.tx.subscribe(),
            folder_id,
            section: section.into(),
        }
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: FolderEvent,
    ) -> Result<usize, broadcast::error::SendError<FolderEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Used for non-critical notifications where it's acceptable if no
    /// component is currently listening.
    pub fn emit_lossy(&self, event: FolderEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Subscription filtered to a single (folder, section) key
///
/// Lagged messages are skipped rather than surfaced: a view that falls
/// behind simply re-reads from the store on its next matching event.
pub struct SectionSubscription {
    rx: broadcast::Receiver<FolderEvent>,
    folder_id: Uuid,
    section: String,
}

impl SectionSubscription {
    /// Receive the next event matching this subscription's key
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<FolderEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some((folder_id, section)) = event.section_key() {
                        if folder_id == self.folder_id && section == self.section {
                            return Some(event);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The folder this subscription is registered for
    pub fn folder_id(&self) -> Uuid {
        self.folder_id
    }

    /// The section key this subscription is registered for
    pub fn section(&self) -> &str {
        &self.section
    }
}
