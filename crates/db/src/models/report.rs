//! Report row model (`reports` table).
//!
//! Enum-valued columns (`status`, `report_type`, `format`) are stored as
//! text and parsed into core enums at the pipeline boundary.

use rivalscope_core::types::{DbId, ReportId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportRow {
    pub id: ReportId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub report_type: String,
    pub format: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a report. The id is minted by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReport {
    pub id: ReportId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub report_type: String,
    pub format: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}
