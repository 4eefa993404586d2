//! Repository for the `reports` table.
//!
//! Reports are inserted once by the generator; afterwards only the status
//! column changes.

use rivalscope_core::types::{DbId, ReportId};
use sqlx::PgPool;

use crate::models::report::{CreateReport, ReportRow};

/// Column list shared across queries.
const COLUMNS: &str = "id, project_id, title, description, status, report_type, \
    format, metadata, created_at, updated_at";

/// Provides create, read and status operations for reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a report with a caller-minted id.
    pub async fn create(pool: &PgPool, input: &CreateReport) -> Result<ReportRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports
                (id, project_id, title, description, status, report_type, format, metadata, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReportRow>(&query)
            .bind(input.id)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(&input.report_type)
            .bind(&input.format)
            .bind(&input.metadata)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Find a report by id.
    pub async fn find_by_id(pool: &PgPool, id: ReportId) -> Result<Option<ReportRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set the status column. Returns `true` if a row was updated.
    pub async fn update_status(
        pool: &PgPool,
        id: ReportId,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reports SET status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Completed reports that have no version rows, optionally scoped to one
    /// project. Ordered oldest first so repeated scans return the same order.
    pub async fn list_completed_without_versions(
        pool: &PgPool,
        project_id: Option<DbId>,
    ) -> Result<Vec<ReportRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports r
             WHERE r.status = 'completed'
               AND ($1::BIGINT IS NULL OR r.project_id = $1)
               AND NOT EXISTS (SELECT 1 FROM report_versions v WHERE v.report_id = r.id)
             ORDER BY r.created_at ASC, r.id ASC"
        );
        sqlx::query_as::<_, ReportRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
