//! Report integrity validation and zombie recovery.
//!
//! A zombie is a report marked `completed` that has no version rows. It can
//! appear when the report insert succeeds but the version insert does not.
//! [`ValidationService`] detects zombies and repairs them by appending an
//! emergency version that tells readers the report must be regenerated.
//!
//! Every operation here degrades to a safe answer when the store fails:
//! `false`, an invalid high-risk result, or an empty scan. Store errors are
//! logged and never returned.

use std::sync::Arc;

use chrono::Utc;
use rivalscope_core::integrity::{assess_integrity, IntegrityResult};
use rivalscope_core::markdown::emergency_version_content;
use rivalscope_core::report::{ReportStatus, ReportVersion, FIRST_VERSION};
use rivalscope_core::types::{DbId, ReportId};
use rivalscope_events::bus::{BusinessEvent, EventBus, ZOMBIE_REPORT_RECOVERED};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;
use crate::ports::{ReportRecord, ReportStore};

/// Result of a zombie scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZombieScan {
    pub zombies_found: usize,
    pub reports: Vec<ReportRecord>,
    /// Set when the scan could not run. `reports` is empty in that case.
    pub error: Option<String>,
}

/// Result of a bulk recovery pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoverySummary {
    pub total_found: usize,
    pub recovered: usize,
    pub failed: usize,
    /// Percentage of found zombies recovered. `100.0` when none were found.
    pub recovery_rate: f64,
}

impl RecoverySummary {
    fn new(total_found: usize, recovered: usize) -> Self {
        let recovery_rate = if total_found == 0 {
            100.0
        } else {
            recovered as f64 * 100.0 / total_found as f64
        };
        Self {
            total_found,
            recovered,
            failed: total_found - recovered,
            recovery_rate,
        }
    }
}

/// Integrity checks and zombie repair over a [`ReportStore`].
#[derive(Clone)]
pub struct ValidationService {
    reports: Arc<dyn ReportStore>,
    events: Arc<EventBus>,
}

impl ValidationService {
    pub fn new(reports: Arc<dyn ReportStore>, events: Arc<EventBus>) -> Self {
        Self { reports, events }
    }

    /// Whether the report has at least one version with content.
    pub async fn validate_report_versions_exist(&self, report_id: ReportId) -> bool {
        match self.reports.list_versions(report_id).await {
            Ok(versions) => versions.iter().any(ReportVersion::has_content),
            Err(e) => {
                tracing::error!(report_id = %report_id, error = %e, "Version check failed");
                false
            }
        }
    }

    /// Assess one report's zombie risk.
    pub async fn validate_report_integrity(&self, report_id: ReportId) -> IntegrityResult {
        match self.load_integrity(report_id).await {
            Ok(result) => {
                if !result.is_valid {
                    tracing::warn!(
                        report_id = %report_id,
                        risk = ?result.zombie_risk,
                        issues = ?result.issues,
                        "Report failed integrity check"
                    );
                }
                result
            }
            Err(e) => {
                tracing::error!(report_id = %report_id, error = %e, "Integrity check failed");
                IntegrityResult::check_failed(e)
            }
        }
    }

    async fn load_integrity(&self, report_id: ReportId) -> Result<IntegrityResult, StoreError> {
        let Some(record) = self.reports.find_report(report_id).await? else {
            return Ok(IntegrityResult::missing_report());
        };
        let versions = self.reports.list_versions(report_id).await?;
        Ok(assess_integrity(record.status, &versions))
    }

    /// Find completed reports with no versions, optionally scoped to one
    /// project. Read-only.
    pub async fn detect_zombie_reports(&self, project_id: Option<DbId>) -> ZombieScan {
        match self.reports.find_completed_without_versions(project_id).await {
            Ok(reports) => {
                if !reports.is_empty() {
                    tracing::warn!(
                        project_id = ?project_id,
                        zombies = reports.len(),
                        "Zombie reports detected"
                    );
                }
                ZombieScan {
                    zombies_found: reports.len(),
                    reports,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(project_id = ?project_id, error = %e, "Zombie scan failed");
                ZombieScan {
                    error: Some(e.to_string()),
                    ..ZombieScan::default()
                }
            }
        }
    }

    /// Append an emergency version to a report that has none.
    ///
    /// Returns `true` when the report now has at least one version, including
    /// when it already had one. Returns `false` when the report is missing,
    /// belongs to another project, or the write fails.
    pub async fn recover_zombie_report(&self, report_id: ReportId, project_id: DbId) -> bool {
        match self.try_recover(report_id, project_id).await {
            Ok(recovered) => recovered,
            Err(e) => {
                tracing::error!(
                    report_id = %report_id,
                    project_id,
                    error = %e,
                    "Zombie recovery failed"
                );
                false
            }
        }
    }

    async fn try_recover(&self, report_id: ReportId, project_id: DbId) -> Result<bool, StoreError> {
        let Some(record) = self.reports.find_report(report_id).await? else {
            tracing::warn!(report_id = %report_id, "Cannot recover missing report");
            return Ok(false);
        };
        if record.project_id != project_id {
            tracing::warn!(
                report_id = %report_id,
                expected_project_id = project_id,
                actual_project_id = record.project_id,
                "Report belongs to another project, not recovering"
            );
            return Ok(false);
        }

        let latest = self.reports.latest_version_number(report_id).await?;
        if latest > 0 {
            tracing::debug!(report_id = %report_id, latest, "Report already has versions");
            return Ok(true);
        }

        let now = Utc::now();
        let version = ReportVersion {
            id: Uuid::new_v4(),
            report_id,
            version: FIRST_VERSION,
            content: Some(emergency_version_content(
                &record.id,
                &record.title,
                record.description.as_deref(),
                &record.created_at,
                &now,
            )),
            created_at: now,
        };

        match self.reports.create_report_version(&version).await {
            Ok(()) => {}
            // Another recovery won the race; the report has a version now.
            Err(StoreError::Conflict(reason)) => {
                tracing::debug!(
                    report_id = %report_id,
                    reason = %reason,
                    "Concurrent recovery detected"
                );
                return Ok(true);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(report_id = %report_id, project_id, "Zombie report recovered");
        self.events.publish(
            BusinessEvent::new(ZOMBIE_REPORT_RECOVERED)
                .with_project(project_id)
                .with_payload(serde_json::json!({
                    "report_id": report_id,
                    "version_id": version.id,
                })),
        );
        Ok(true)
    }

    /// Detect and recover every zombie, optionally scoped to one project.
    pub async fn recover_all_zombie_reports(&self, project_id: Option<DbId>) -> RecoverySummary {
        let scan = self.detect_zombie_reports(project_id).await;

        let mut recovered = 0;
        for report in &scan.reports {
            if self.recover_zombie_report(report.id, report.project_id).await {
                recovered += 1;
            }
        }

        let summary = RecoverySummary::new(scan.zombies_found, recovered);
        if summary.total_found > 0 {
            tracing::info!(
                project_id = ?project_id,
                total_found = summary.total_found,
                recovered = summary.recovered,
                failed = summary.failed,
                recovery_rate = summary.recovery_rate,
                "Zombie recovery pass finished"
            );
        }
        summary
    }

    /// Move a report to `completed` only if it has a content-bearing version.
    pub async fn mark_completed_if_valid(&self, report_id: ReportId) -> bool {
        if !self.validate_report_versions_exist(report_id).await {
            tracing::warn!(
                report_id = %report_id,
                "Refusing to mark report without content as completed"
            );
            return false;
        }
        match self.reports.update_status(report_id, ReportStatus::Completed).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(
                    report_id = %report_id,
                    error = %e,
                    "Failed to mark report completed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rivalscope_core::integrity::ZombieRisk;
    use rivalscope_core::report::ReportType;

    use super::*;
    use crate::memory::InMemoryReportStore;

    fn record(project_id: DbId, status: ReportStatus) -> ReportRecord {
        ReportRecord {
            id: Uuid::new_v4(),
            project_id,
            title: "Initial Competitive Analysis - Acme".to_string(),
            description: Some("Seeded report".to_string()),
            status,
            report_type: ReportType::InitialCompetitive,
            created_at: Utc::now(),
        }
    }

    fn service(store: &Arc<InMemoryReportStore>) -> ValidationService {
        ValidationService::new(store.clone(), Arc::new(EventBus::default()))
    }

    #[tokio::test]
    async fn missing_report_is_invalid_low_risk() {
        let store = Arc::new(InMemoryReportStore::new());
        let result = service(&store).validate_report_integrity(Uuid::new_v4()).await;
        assert!(!result.is_valid);
        assert_eq!(result.zombie_risk, ZombieRisk::Low);
        assert!(!result.can_be_marked_completed);
    }

    #[tokio::test]
    async fn store_outage_is_high_risk() {
        let store = Arc::new(InMemoryReportStore::new());
        store.fail_reads(true);
        let svc = service(&store);

        let result = svc.validate_report_integrity(Uuid::new_v4()).await;
        assert_eq!(result.zombie_risk, ZombieRisk::High);
        assert!(!svc.validate_report_versions_exist(Uuid::new_v4()).await);

        let scan = svc.detect_zombie_reports(None).await;
        assert_eq!(scan.zombies_found, 0);
        assert!(scan.error.is_some());
    }

    #[tokio::test]
    async fn recovery_rejects_project_mismatch() {
        let store = Arc::new(InMemoryReportStore::new());
        let zombie = record(1, ReportStatus::Completed);
        store.insert_record(zombie.clone());

        assert!(!service(&store).recover_zombie_report(zombie.id, 2).await);
        assert_eq!(store.version_count(zombie.id), 0);
    }

    #[tokio::test]
    async fn recovery_rate_is_full_when_nothing_found() {
        let store = Arc::new(InMemoryReportStore::new());
        let summary = service(&store).recover_all_zombie_reports(None).await;
        assert_eq!(summary, RecoverySummary::new(0, 0));
        assert_eq!(summary.recovery_rate, 100.0);
    }

    #[tokio::test]
    async fn failed_writes_are_counted() {
        let store = Arc::new(InMemoryReportStore::new());
        store.insert_record(record(1, ReportStatus::Completed));
        store.insert_record(record(1, ReportStatus::Completed));
        store.fail_version_writes(true);

        let summary = service(&store).recover_all_zombie_reports(Some(1)).await;
        assert_eq!(summary.total_found, 2);
        assert_eq!(summary.recovered, 0);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.recovery_rate, 0.0);
    }

    #[tokio::test]
    async fn mark_completed_requires_content() {
        let store = Arc::new(InMemoryReportStore::new());
        let pending = record(1, ReportStatus::Generating);
        store.insert_record(pending.clone());
        let svc = service(&store);

        assert!(!svc.mark_completed_if_valid(pending.id).await);
        assert_eq!(store.records()[0].status, ReportStatus::Generating);

        store
            .create_report_version(&ReportVersion {
                id: Uuid::new_v4(),
                report_id: pending.id,
                version: FIRST_VERSION,
                content: Some("body".to_string()),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(svc.mark_completed_if_valid(pending.id).await);
        assert_eq!(store.records()[0].status, ReportStatus::Completed);
    }
}
