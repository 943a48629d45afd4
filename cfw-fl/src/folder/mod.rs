//! Folder lifecycle core
//!
//! - [`status`]: the state machine gating who may act when
//! - [`permission`]: pure editability evaluation from status plus context
//! - [`feedback`]: per-section reviewer annotation, independent of content
//! - [`save`]: debounced, serialized autosave per editing session
//! - [`service`]: the orchestrator, sole mutator of folder status

pub mod feedback;
pub mod permission;
pub mod save;
pub mod service;
pub mod status;

pub use feedback::{FeedbackEntry, FeedbackStore};
pub use permission::{can_edit, ReviewContext};
pub use save::{SaveConfig, SavePhase, SaveSession, SectionStore};
pub use service::{Decision, FolderLifecycleService};
pub use status::{is_submittable_from, next_status_on_action, review_stage_role, ReviewAction};
