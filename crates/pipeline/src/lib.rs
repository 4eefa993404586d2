//! Rivalscope report pipeline.
//!
//! Two services run against a set of port traits:
//!
//! - [`ReportGenerator`]: produces the initial competitive report for a
//!   project, deduplicating concurrent requests and degrading to rule-based
//!   content when data or the AI dependency falls short.
//! - [`ValidationService`]: read-mostly integrity checks that detect and
//!   repair zombie reports.
//!
//! Ports ([`ports`]) have PostgreSQL ([`postgres`]), filesystem
//! ([`archive`]), HTTP ([`completion`]) and in-memory ([`memory`])
//! implementations.

pub mod archive;
pub mod completion;
pub mod config;
pub mod dedup;
pub mod error;
pub mod generator;
pub mod memory;
pub mod ports;
pub mod postgres;
pub mod validation;

pub use config::GeneratorConfig;
pub use error::{CompletionError, StoreError};
pub use generator::ReportGenerator;
pub use validation::{RecoverySummary, ValidationService, ZombieScan};
