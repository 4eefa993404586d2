//! In-memory port implementations.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Each store carries failure switches so callers can simulate an outage
//! of one persistence step without touching the others.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use rivalscope_core::project::Project;
use rivalscope_core::report::{Report, ReportStatus, ReportVersion};
use rivalscope_core::types::{DbId, ReportId};

use crate::error::StoreError;
use crate::ports::{ProjectSource, ReportArchive, ReportRecord, ReportStore};

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// In-memory project source.
#[derive(Default)]
pub struct InMemoryProjectSource {
    projects: RwLock<HashMap<DbId, Project>>,
    unavailable: AtomicBool,
}

impl InMemoryProjectSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a project.
    pub fn insert(&self, project: Project) {
        if let Ok(mut projects) = self.projects.write() {
            projects.insert(project.id, project);
        }
    }

    /// Make every read fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProjectSource for InMemoryProjectSource {
    async fn get_project(&self, project_id: DbId) -> Result<Option<Project>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("project store offline".to_string()));
        }
        let projects = self.projects.read().map_err(|_| poisoned())?;
        Ok(projects.get(&project_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ReportState {
    reports: HashMap<ReportId, ReportRecord>,
    /// Insertion order, so scans are stable.
    order: Vec<ReportId>,
    versions: HashMap<ReportId, Vec<ReportVersion>>,
}

/// In-memory report store.
#[derive(Default)]
pub struct InMemoryReportStore {
    state: RwLock<ReportState>,
    fail_report_writes: AtomicBool,
    fail_version_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_report` fail.
    pub fn fail_report_writes(&self, fail: bool) {
        self.fail_report_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `create_report_version` fail. Together with working report
    /// writes this produces zombies.
    pub fn fail_version_writes(&self, fail: bool) {
        self.fail_version_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Insert a header directly, bypassing the generator. Used to seed
    /// records written by older code paths.
    pub fn insert_record(&self, record: ReportRecord) {
        if let Ok(mut state) = self.state.write() {
            if state.reports.insert(record.id, record.clone()).is_none() {
                state.order.push(record.id);
            }
        }
    }

    /// Every stored report header, in insertion order.
    pub fn records(&self) -> Vec<ReportRecord> {
        self.state
            .read()
            .map(|state| {
                state
                    .order
                    .iter()
                    .filter_map(|id| state.reports.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of stored versions of a report.
    pub fn version_count(&self, report_id: ReportId) -> usize {
        self.state
            .read()
            .map(|state| state.versions.get(&report_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("report store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create_report(&self, report: &Report) -> Result<(), StoreError> {
        if self.fail_report_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("report insert rejected".to_string()));
        }
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.reports.contains_key(&report.id) {
            return Err(StoreError::Conflict(format!("report {} already exists", report.id)));
        }
        state.reports.insert(report.id, ReportRecord::from(report));
        state.order.push(report.id);
        Ok(())
    }

    async fn create_report_version(&self, version: &ReportVersion) -> Result<(), StoreError> {
        if self.fail_version_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("version insert rejected".to_string()));
        }
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if !state.reports.contains_key(&version.report_id) {
            return Err(StoreError::Conflict(format!(
                "report {} does not exist",
                version.report_id
            )));
        }
        let versions = state.versions.entry(version.report_id).or_default();
        if versions.iter().any(|v| v.version == version.version) {
            return Err(StoreError::Conflict(format!(
                "version {} of report {} already exists",
                version.version, version.report_id
            )));
        }
        versions.push(version.clone());
        Ok(())
    }

    async fn find_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.reports.get(&report_id).cloned())
    }

    async fn list_versions(&self, report_id: ReportId) -> Result<Vec<ReportVersion>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut versions = state.versions.get(&report_id).cloned().unwrap_or_default();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn latest_version_number(&self, report_id: ReportId) -> Result<i32, StoreError> {
        self.check_reads()?;
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .versions
            .get(&report_id)
            .and_then(|versions| versions.iter().map(|v| v.version).max())
            .unwrap_or(0))
    }

    async fn find_completed_without_versions(
        &self,
        project_id: Option<DbId>,
    ) -> Result<Vec<ReportRecord>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.reports.get(id))
            .filter(|r| r.status == ReportStatus::Completed)
            .filter(|r| project_id.map_or(true, |p| r.project_id == p))
            .filter(|r| state.versions.get(&r.id).map_or(true, Vec::is_empty))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        match state.reports.get_mut(&report_id) {
            Some(record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// In-memory archive keeping every written file.
#[derive(Default)]
pub struct InMemoryArchive {
    files: RwLock<Vec<(PathBuf, String)>>,
    fail_writes: AtomicBool,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every written file as `(path, contents)`, in write order.
    pub fn files(&self) -> Vec<(PathBuf, String)> {
        self.files.read().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReportArchive for InMemoryArchive {
    async fn write_file(
        &self,
        project_id: DbId,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("archive offline".to_string()));
        }
        let path = PathBuf::from(project_id.to_string()).join(file_name);
        let mut files = self.files.write().map_err(|_| poisoned())?;
        files.push((path.clone(), contents.to_string()));
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
