//! Report version model (`report_versions` table).
//!
//! Versions are append-only. A `NULL` content column marks a version whose
//! payload never landed.

use rivalscope_core::types::{ReportId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `report_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportVersionRow {
    pub id: ReportId,
    pub report_id: ReportId,
    pub version: i32,
    pub content: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending a version.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportVersion {
    pub id: ReportId,
    pub report_id: ReportId,
    pub version: i32,
    pub content: Option<String>,
}
