//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`BusinessEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the report generator,
//! the validation service and whatever consumes their telemetry.

use chrono::{DateTime, Utc};
use rivalscope_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// A generation attempt produced a report (possibly degraded).
pub const REPORT_GENERATED: &str = "report.generated";
/// A generation attempt ended in a terminal failure.
pub const REPORT_GENERATION_FAILED: &str = "report.generation_failed";
/// The validator appended an emergency version to a zombie report.
pub const ZOMBIE_REPORT_RECOVERED: &str = "report.zombie_recovered";

// ---------------------------------------------------------------------------
// BusinessEvent
// ---------------------------------------------------------------------------

/// A business event emitted by the report pipeline.
///
/// Constructed via [`BusinessEvent::new`] and enriched with
/// [`with_project`](BusinessEvent::with_project),
/// [`with_correlation_id`](BusinessEvent::with_correlation_id) and
/// [`with_payload`](BusinessEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessEvent {
    /// Dot-separated event name, e.g. `"report.generated"`.
    pub event_type: String,

    /// Project the event concerns, if any.
    pub project_id: Option<DbId>,

    /// Correlation id of the attempt that emitted the event.
    pub correlation_id: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl BusinessEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            project_id: None,
            correlation_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_project(mut self, project_id: DbId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use rivalscope_events::bus::{BusinessEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(BusinessEvent::new("report.generated"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<BusinessEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: BusinessEvent) {
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BusinessEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
