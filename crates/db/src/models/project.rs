//! Project, competitor and snapshot rows.
//!
//! These tables are owned by the wider application; this crate only reads
//! them.

use rivalscope_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectRow {
    pub id: DbId,
    pub name: String,
    pub product_name: String,
    pub product_website: Option<String>,
    pub product_description: Option<String>,
    pub created_at: Timestamp,
}

/// A row from the `competitors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CompetitorRow {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub position: i32,
    pub created_at: Timestamp,
}

/// A row from the `snapshots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SnapshotRow {
    pub id: DbId,
    pub competitor_id: DbId,
    pub content: serde_json::Value,
    pub url: String,
    pub created_at: Timestamp,
}
