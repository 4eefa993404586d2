//! Periodic zombie report sweep.
//!
//! Runs [`ValidationService::recover_all_zombie_reports`] across every
//! project on a fixed interval until cancelled. The first sweep runs
//! immediately at startup.

use std::time::Duration;

use rivalscope_pipeline::ValidationService;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop. Returns the number of sweeps completed.
pub async fn run(
    validator: ValidationService,
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    tracing::info!(interval_secs = interval.as_secs(), "Integrity sweep started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut sweeps = 0u64;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(sweeps, "Integrity sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let summary = validator.recover_all_zombie_reports(None).await;
                sweeps += 1;
                if summary.total_found == 0 {
                    tracing::debug!("Integrity sweep: no zombie reports");
                } else if summary.failed > 0 {
                    tracing::warn!(
                        total_found = summary.total_found,
                        recovered = summary.recovered,
                        failed = summary.failed,
                        "Integrity sweep: some zombie reports could not be recovered"
                    );
                } else {
                    tracing::info!(
                        recovered = summary.recovered,
                        "Integrity sweep: zombie reports recovered"
                    );
                }
            }
        }
    }

    sweeps
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rivalscope_core::report::{ReportStatus, ReportType};
    use rivalscope_events::bus::EventBus;
    use rivalscope_pipeline::memory::InMemoryReportStore;
    use rivalscope_pipeline::ports::ReportRecord;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sweeps_until_cancelled() {
        let store = Arc::new(InMemoryReportStore::new());
        let zombie = ReportRecord {
            id: uuid::Uuid::new_v4(),
            project_id: 1,
            title: "Initial Competitive Analysis - Acme".to_string(),
            description: None,
            status: ReportStatus::Completed,
            report_type: ReportType::InitialCompetitive,
            created_at: Utc::now(),
        };
        store.insert_record(zombie.clone());

        let validator = ValidationService::new(store.clone(), Arc::new(EventBus::default()));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(validator, Duration::from_secs(60), cancel.clone()));

        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel.cancel();
        let sweeps = handle.await.unwrap();

        // Ticks at 0s, 60s and 120s.
        assert_eq!(sweeps, 3);
        assert_eq!(store.version_count(zombie.id), 1);
    }
}
