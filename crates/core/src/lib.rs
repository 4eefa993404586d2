//! Rivalscope core domain logic.
//!
//! Pure types and functions shared by the persistence, event and pipeline
//! crates. Nothing in here performs I/O.

pub mod completeness;
pub mod error;
pub mod generation;
pub mod integrity;
pub mod markdown;
pub mod project;
pub mod report;
pub mod types;
