//! Database access for the folder lifecycle service

pub mod decisions;
pub mod folders;
pub mod sections;
pub mod settings;
