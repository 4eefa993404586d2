//! Event log consumer.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`BusinessEvent`] to the
//! tracing log under the `business_event` target. It runs as a long-lived
//! background task and shuts down when the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::BusinessEvent;

/// Background service that logs business events.
pub struct EventLogger;

impl EventLogger {
    /// Run the logging loop until the channel closes.
    ///
    /// Returns the number of events logged.
    pub async fn run(mut receiver: broadcast::Receiver<BusinessEvent>) -> u64 {
        let mut logged = 0u64;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    Self::log(&event);
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(logged, "Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
        logged
    }

    fn log(event: &BusinessEvent) {
        tracing::info!(
            target: "business_event",
            event_type = %event.event_type,
            project_id = event.project_id,
            correlation_id = event.correlation_id.as_deref().unwrap_or("-"),
            payload = %event.payload,
            timestamp = %event.timestamp,
            "Business event"
        );
    }
}
