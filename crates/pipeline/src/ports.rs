//! Port traits the generator and validator run against.
//!
//! All operations are async (via `async-trait`) and implementations must be
//! `Send + Sync` so a single instance can be shared behind an `Arc` across
//! concurrent generation attempts.
//!
//! | Trait                  | Postgres / filesystem / HTTP       | In-memory                 |
//! |------------------------|------------------------------------|---------------------------|
//! | [`ProjectSource`]      | [`PgProjectSource`]                | [`InMemoryProjectSource`] |
//! | [`ReportStore`]        | [`PgReportStore`]                  | [`InMemoryReportStore`]   |
//! | [`ReportArchive`]      | [`FsReportArchive`]                | [`InMemoryArchive`]       |
//! | [`CompletionProvider`] | [`HttpCompletionProvider`]         | -                         |
//!
//! [`PgProjectSource`]: crate::postgres::PgProjectSource
//! [`PgReportStore`]: crate::postgres::PgReportStore
//! [`FsReportArchive`]: crate::archive::FsReportArchive
//! [`HttpCompletionProvider`]: crate::completion::HttpCompletionProvider
//! [`InMemoryProjectSource`]: crate::memory::InMemoryProjectSource
//! [`InMemoryReportStore`]: crate::memory::InMemoryReportStore
//! [`InMemoryArchive`]: crate::memory::InMemoryArchive

use std::path::PathBuf;

use async_trait::async_trait;
use rivalscope_core::project::Project;
use rivalscope_core::report::{Report, ReportStatus, ReportType, ReportVersion};
use rivalscope_core::types::{DbId, ReportId, Timestamp};
use serde::Serialize;

use crate::error::{CompletionError, StoreError};

/// The stored header of a report, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub id: ReportId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub report_type: ReportType,
    pub created_at: Timestamp,
}

impl From<&Report> for ReportRecord {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id,
            project_id: report.project_id,
            title: report.title.clone(),
            description: Some(report.description.clone()),
            status: report.status,
            report_type: report.metadata.report_type,
            created_at: report.created_at,
        }
    }
}

/// Read access to projects with their competitors and newest snapshots.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Load a project. `Ok(None)` when it does not exist.
    async fn get_project(&self, project_id: DbId) -> Result<Option<Project>, StoreError>;
}

/// Relational report persistence.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a new report header.
    async fn create_report(&self, report: &Report) -> Result<(), StoreError>;

    /// Append a version to an existing report.
    async fn create_report_version(&self, version: &ReportVersion) -> Result<(), StoreError>;

    async fn find_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>, StoreError>;

    /// All versions of a report, newest first.
    async fn list_versions(&self, report_id: ReportId) -> Result<Vec<ReportVersion>, StoreError>;

    /// Highest version number of a report, 0 when it has none.
    async fn latest_version_number(&self, report_id: ReportId) -> Result<i32, StoreError>;

    /// Completed reports with zero versions, optionally scoped to a project.
    async fn find_completed_without_versions(
        &self,
        project_id: Option<DbId>,
    ) -> Result<Vec<ReportRecord>, StoreError>;

    /// Set a report's status. Returns `false` when the report does not exist.
    async fn update_status(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> Result<bool, StoreError>;
}

/// Human-readable copy of each generated report.
#[async_trait]
pub trait ReportArchive: Send + Sync {
    /// Write `contents` under the project's directory. Returns the location
    /// written to.
    async fn write_file(
        &self,
        project_id: DbId,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf, StoreError>;
}

/// Opaque AI text-completion capability.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Prepare the provider for use. Failure means AI analysis is
    /// unavailable for this attempt.
    async fn initialize(&self) -> Result<(), CompletionError>;

    /// Generate text for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
