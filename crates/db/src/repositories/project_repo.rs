//! Read-only repository for projects, their competitors and snapshots.

use rivalscope_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CompetitorRow, ProjectRow, SnapshotRow};

/// Column list for projects queries.
const PROJECT_COLUMNS: &str =
    "id, name, product_name, product_website, product_description, created_at";

/// Column list for competitors queries.
const COMPETITOR_COLUMNS: &str = "id, project_id, name, position, created_at";

/// Provides the project reads the report generator needs.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Find a project by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's competitors in their configured order.
    pub async fn list_competitors(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<CompetitorRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors
             WHERE project_id = $1
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, CompetitorRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// The newest snapshot of every competitor in a project that has one.
    pub async fn latest_snapshots_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<SnapshotRow>, sqlx::Error> {
        sqlx::query_as::<_, SnapshotRow>(
            "SELECT DISTINCT ON (s.competitor_id)
                    s.id, s.competitor_id, s.content, s.url, s.created_at
             FROM snapshots s
             JOIN competitors c ON c.id = s.competitor_id
             WHERE c.project_id = $1
             ORDER BY s.competitor_id, s.created_at DESC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
