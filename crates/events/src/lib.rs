//! Rivalscope business event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`BusinessEvent`]: the event envelope emitted at the end of every
//!   generation attempt and every recovery.
//! - [`EventLogger`]: background consumer that writes each event to the
//!   tracing log for operational tooling.

pub mod bus;
pub mod logger;

pub use bus::{BusinessEvent, EventBus};
pub use logger::EventLogger;
