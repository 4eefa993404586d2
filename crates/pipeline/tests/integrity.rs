//! Persistence failures, zombie detection and recovery.

mod common;

use common::{Harness, Reply};
use rivalscope_core::generation::GenerationRequest;
use rivalscope_core::integrity::ZombieRisk;
use rivalscope_core::report::ReportStatus;
use rivalscope_events::bus::ZOMBIE_REPORT_RECOVERED;
use rivalscope_pipeline::ports::ReportStore;

#[tokio::test]
async fn healthy_stores_never_produce_zombies() {
    let h = Harness::new();
    let mut project_id = 0;

    for total in 0..=4 {
        for ready in 0..=total {
            for fallback in [false, true] {
                for reply in [Reply::Text("## AI".to_string()), Reply::Fail, Reply::Timeout] {
                    project_id += 1;
                    h.projects.insert(common::project(project_id, ready, total));
                    h.completion.reply_with(reply);

                    let response = h
                        .generator
                        .generate_initial_report(
                            GenerationRequest::for_project(project_id).with_fallback(fallback),
                        )
                        .await;

                    if let Some(report) = response.report {
                        let result = h.validator.validate_report_integrity(report.id).await;
                        assert!(result.is_valid, "{:?}", result.issues);
                        assert_eq!(result.zombie_risk, ZombieRisk::Low);
                    }
                }
            }
        }
    }

    assert!(!h.reports.records().is_empty());
    let scan = h.validator.detect_zombie_reports(None).await;
    assert_eq!(scan.zombies_found, 0);
    assert!(scan.error.is_none());
}

#[tokio::test]
async fn failed_version_write_is_non_fatal_and_recoverable() {
    let h = Harness::with_project(1, 2, 2);
    h.reports.fail_version_writes(true);

    let response = h
        .generator
        .generate_initial_report(GenerationRequest::for_project(1))
        .await;

    assert!(response.success);
    assert_eq!(response.persistence_warnings.len(), 1);
    let report = response.report.unwrap();

    let integrity = h.validator.validate_report_integrity(report.id).await;
    assert!(!integrity.is_valid);
    assert_eq!(integrity.zombie_risk, ZombieRisk::High);
    assert!(!h.validator.validate_report_versions_exist(report.id).await);

    let scan = h.validator.detect_zombie_reports(Some(1)).await;
    assert_eq!(scan.zombies_found, 1);
    assert_eq!(scan.reports[0].id, report.id);

    h.reports.fail_version_writes(false);
    let summary = h.validator.recover_all_zombie_reports(Some(1)).await;
    assert_eq!(summary.total_found, 1);
    assert_eq!(summary.recovered, 1);
    assert_eq!(summary.recovery_rate, 100.0);

    let integrity = h.validator.validate_report_integrity(report.id).await;
    assert!(integrity.is_valid);
    assert_eq!(integrity.zombie_risk, ZombieRisk::Low);
    assert_eq!(h.validator.detect_zombie_reports(None).await.zombies_found, 0);
}

#[tokio::test]
async fn recovery_is_idempotent() {
    let h = Harness::with_project(1, 2, 2);
    h.reports.fail_version_writes(true);
    let report = h
        .generator
        .generate_initial_report(GenerationRequest::for_project(1))
        .await
        .report
        .unwrap();
    h.reports.fail_version_writes(false);

    assert!(h.validator.recover_zombie_report(report.id, 1).await);
    assert!(h.validator.recover_zombie_report(report.id, 1).await);
    assert_eq!(h.reports.version_count(report.id), 1);

    let versions = h.reports.list_versions(report.id).await.unwrap();
    let content = versions[0].content.as_deref().unwrap();
    assert!(content.contains(&report.title));
    assert!(content.contains("**Requires regeneration:** yes"));
    assert!(content.contains(&report.id.to_string()));
}

#[tokio::test]
async fn recovery_never_touches_existing_content() {
    let h = Harness::with_project(1, 2, 2);
    let report = h
        .generator
        .generate_initial_report(GenerationRequest::for_project(1))
        .await
        .report
        .unwrap();

    assert!(h.validator.recover_zombie_report(report.id, 1).await);

    let versions = h.reports.list_versions(report.id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].content.as_deref(), Some(report.content.as_str()));
}

#[tokio::test]
async fn recovery_of_missing_report_fails() {
    let h = Harness::new();
    assert!(!h.validator.recover_zombie_report(uuid::Uuid::new_v4(), 1).await);
}

#[tokio::test]
async fn recovery_publishes_event() {
    let h = Harness::with_project(1, 2, 2);
    let mut rx = h.events.subscribe();
    h.reports.fail_version_writes(true);
    let report = h
        .generator
        .generate_initial_report(GenerationRequest::for_project(1))
        .await
        .report
        .unwrap();
    h.reports.fail_version_writes(false);

    assert!(h.validator.recover_zombie_report(report.id, 1).await);

    let mut recovered = None;
    while let Ok(event) = rx.try_recv() {
        if event.event_type == ZOMBIE_REPORT_RECOVERED {
            recovered = Some(event);
        }
    }
    let event = recovered.expect("recovery event");
    assert_eq!(event.project_id, Some(1));
    assert_eq!(event.payload["report_id"], report.id.to_string());
}

#[tokio::test]
async fn failed_report_write_skips_version() {
    let h = Harness::with_project(1, 2, 2);
    h.reports.fail_report_writes(true);

    let response = h
        .generator
        .generate_initial_report(GenerationRequest::for_project(1))
        .await;

    assert!(response.success);
    assert_eq!(response.persistence_warnings.len(), 2);
    assert!(h.reports.records().is_empty());
    // The archive copy is still written.
    assert_eq!(h.archive.files().len(), 1);
}

#[tokio::test]
async fn failed_archive_write_is_a_warning() {
    let h = Harness::with_project(1, 2, 2);
    h.archive.fail_writes(true);

    let response = h
        .generator
        .generate_initial_report(GenerationRequest::for_project(1))
        .await;

    assert!(response.success);
    assert_eq!(response.persistence_warnings.len(), 1);
    assert!(response.persistence_warnings[0].contains("Archive"));
    let report = response.report.unwrap();
    assert_eq!(h.reports.version_count(report.id), 1);
}

#[tokio::test]
async fn mark_completed_gate_checks_content() {
    let h = Harness::with_project(1, 2, 2);
    h.reports.fail_version_writes(true);
    let zombie = h
        .generator
        .generate_initial_report(GenerationRequest::for_project(1))
        .await
        .report
        .unwrap();
    h.reports.fail_version_writes(false);
    h.reports
        .update_status(zombie.id, ReportStatus::Generating)
        .await
        .unwrap();

    assert!(!h.validator.mark_completed_if_valid(zombie.id).await);
    assert!(h.validator.recover_zombie_report(zombie.id, 1).await);
    assert!(h.validator.mark_completed_if_valid(zombie.id).await);
}
