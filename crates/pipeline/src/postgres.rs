//! PostgreSQL-backed ports.
//!
//! Thin adapters over the `rivalscope-db` repositories. Rows are mapped to
//! core domain types here; a row whose enum columns cannot be parsed is
//! reported as [`StoreError::Corrupt`].

use std::collections::HashMap;

use async_trait::async_trait;
use rivalscope_core::project::{Competitor, Product, Project, Snapshot};
use rivalscope_core::report::{Report, ReportStatus, ReportType, ReportVersion};
use rivalscope_core::types::{DbId, ReportId};
use rivalscope_db::models::report::{CreateReport, ReportRow};
use rivalscope_db::models::report_version::{CreateReportVersion, ReportVersionRow};
use rivalscope_db::repositories::{ProjectRepo, ReportRepo, ReportVersionRepo};
use rivalscope_db::DbPool;

use crate::error::StoreError;
use crate::ports::{ProjectSource, ReportRecord, ReportStore};

fn record_from_row(row: ReportRow) -> Result<ReportRecord, StoreError> {
    Ok(ReportRecord {
        status: ReportStatus::from_name(&row.status)?,
        report_type: ReportType::from_name(&row.report_type)?,
        id: row.id,
        project_id: row.project_id,
        title: row.title,
        description: row.description,
        created_at: row.created_at,
    })
}

fn version_from_row(row: ReportVersionRow) -> ReportVersion {
    ReportVersion {
        id: row.id,
        report_id: row.report_id,
        version: row.version,
        content: row.content,
        created_at: row.created_at,
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Project source reading the `projects`, `competitors` and `snapshots`
/// tables.
#[derive(Clone)]
pub struct PgProjectSource {
    pool: DbPool,
}

impl PgProjectSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectSource for PgProjectSource {
    async fn get_project(&self, project_id: DbId) -> Result<Option<Project>, StoreError> {
        let Some(row) = ProjectRepo::find_by_id(&self.pool, project_id).await? else {
            return Ok(None);
        };

        let competitors = ProjectRepo::list_competitors(&self.pool, project_id).await?;
        let snapshots = ProjectRepo::latest_snapshots_for_project(&self.pool, project_id).await?;

        let mut by_competitor: HashMap<DbId, Vec<Snapshot>> = HashMap::new();
        for snapshot in snapshots {
            by_competitor
                .entry(snapshot.competitor_id)
                .or_default()
                .push(Snapshot {
                    content: snapshot.content,
                    url: snapshot.url,
                    captured_at: snapshot.created_at,
                });
        }

        let competitors = competitors
            .into_iter()
            .map(|c| Competitor {
                snapshots: by_competitor.remove(&c.id).unwrap_or_default(),
                id: c.id,
                name: c.name,
            })
            .collect();

        Ok(Some(Project {
            id: row.id,
            name: row.name,
            product: Product {
                name: row.product_name,
                website: row.product_website,
                description: row.product_description,
            },
            competitors,
        }))
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Report store over the `reports` and `report_versions` tables.
#[derive(Clone)]
pub struct PgReportStore {
    pool: DbPool,
}

impl PgReportStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn create_report(&self, report: &Report) -> Result<(), StoreError> {
        let input = CreateReport {
            id: report.id,
            project_id: report.project_id,
            title: report.title.clone(),
            description: Some(report.description.clone()),
            status: report.status.as_str().to_string(),
            report_type: report.metadata.report_type.as_str().to_string(),
            format: report.format.as_str().to_string(),
            metadata: serde_json::to_value(&report.metadata)?,
            created_at: report.created_at,
        };
        ReportRepo::create(&self.pool, &input).await?;
        Ok(())
    }

    async fn create_report_version(&self, version: &ReportVersion) -> Result<(), StoreError> {
        let input = CreateReportVersion {
            id: version.id,
            report_id: version.report_id,
            version: version.version,
            content: version.content.clone(),
        };
        ReportVersionRepo::create(&self.pool, &input)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!(
                        "version {} of report {} already exists",
                        version.version, version.report_id
                    ))
                }
                other => StoreError::Database(other),
            })?;
        Ok(())
    }

    async fn find_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>, StoreError> {
        ReportRepo::find_by_id(&self.pool, report_id)
            .await?
            .map(record_from_row)
            .transpose()
    }

    async fn list_versions(&self, report_id: ReportId) -> Result<Vec<ReportVersion>, StoreError> {
        let rows = ReportVersionRepo::list_by_report(&self.pool, report_id).await?;
        Ok(rows.into_iter().map(version_from_row).collect())
    }

    async fn latest_version_number(&self, report_id: ReportId) -> Result<i32, StoreError> {
        Ok(ReportVersionRepo::get_latest_version_number(&self.pool, report_id).await?)
    }

    async fn find_completed_without_versions(
        &self,
        project_id: Option<DbId>,
    ) -> Result<Vec<ReportRecord>, StoreError> {
        ReportRepo::list_completed_without_versions(&self.pool, project_id)
            .await?
            .into_iter()
            .map(record_from_row)
            .collect()
    }

    async fn update_status(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> Result<bool, StoreError> {
        Ok(ReportRepo::update_status(&self.pool, report_id, status.as_str()).await?)
    }
}
