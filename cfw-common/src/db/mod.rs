//! Database schema, initialization, and row models

mod init;
mod models;

pub use init::{init_database, init_memory_database};
pub use models::{DecisionRecord, FeedbackRecord, FolderRecord, SectionRecord, Setting};
