//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod project_repo;
pub mod report_repo;
pub mod report_version_repo;

pub use project_repo::ProjectRepo;
pub use report_repo::ReportRepo;
pub use report_version_repo::ReportVersionRepo;
