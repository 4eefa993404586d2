//! Repository for the `report_versions` table.
//!
//! Versions are append-only snapshots of report content.

use rivalscope_core::types::ReportId;
use sqlx::PgPool;

use crate::models::report_version::{CreateReportVersion, ReportVersionRow};

/// Column list for report_versions queries.
const COLUMNS: &str = "id, report_id, version, content, created_at";

/// Provides append and read operations for report versions.
pub struct ReportVersionRepo;

impl ReportVersionRepo {
    /// Append a version.
    pub async fn create(
        pool: &PgPool,
        input: &CreateReportVersion,
    ) -> Result<ReportVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_versions (id, report_id, version, content)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReportVersionRow>(&query)
            .bind(input.id)
            .bind(input.report_id)
            .bind(input.version)
            .bind(&input.content)
            .fetch_one(pool)
            .await
    }

    /// List all versions of a report, ordered newest first.
    pub async fn list_by_report(
        pool: &PgPool,
        report_id: ReportId,
    ) -> Result<Vec<ReportVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM report_versions
             WHERE report_id = $1
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, ReportVersionRow>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }

    /// Get the latest version number for a report (0 if none exist).
    pub async fn get_latest_version_number(
        pool: &PgPool,
        report_id: ReportId,
    ) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) FROM report_versions WHERE report_id = $1",
        )
        .bind(report_id)
        .fetch_optional(pool)
        .await?;

        Ok(result.map(|(v,)| v).unwrap_or(0))
    }
}
