//! Report and report-version domain types.
//!
//! A [`Report`] is the in-memory artifact the generator returns to callers.
//! Its durable content lives in [`ReportVersion`] rows; a completed report
//! without a content-bearing version is a zombie (see [`crate::integrity`]).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, ReportId, Timestamp};

// ---------------------------------------------------------------------------
// Title prefixes
// ---------------------------------------------------------------------------

/// Title prefix for the standard initial analysis.
pub const INITIAL_TITLE_PREFIX: &str = "Initial Competitive Analysis";
/// Title prefix for the AI-less overview produced on dependency failure.
pub const FALLBACK_TITLE_PREFIX: &str = "Competitive Overview";
/// Title prefix for a project with no competitors.
pub const PROJECT_ONLY_TITLE_PREFIX: &str = "Project Overview";
/// Title prefix for the comparative report path.
pub const COMPARATIVE_TITLE_PREFIX: &str = "Comparative Analysis";

/// Build `"<prefix> - <product name>"`.
pub fn report_title(prefix: &str, product_name: &str) -> String {
    format!("{prefix} - {product_name}")
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    NotStarted,
    Generating,
    Completed,
    Failed,
}

impl ReportStatus {
    /// Database `status` column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse from the database `status` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "not_started" => Ok(Self::NotStarted),
            "generating" => Ok(Self::Generating),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown report status '{other}'"
            ))),
        }
    }
}

/// How the report body was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    AiPowered,
    RuleBased,
}

impl AnalysisMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiPowered => "ai_powered",
            Self::RuleBased => "rule_based",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "ai_powered" => Ok(Self::AiPowered),
            "rule_based" => Ok(Self::RuleBased),
            other => Err(CoreError::Validation(format!(
                "Unknown analysis method '{other}'"
            ))),
        }
    }
}

/// Which generation branch produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    InitialCompetitive,
    ProjectOnly,
    FallbackOverview,
    Comparative,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialCompetitive => "initial_competitive",
            Self::ProjectOnly => "project_only",
            Self::FallbackOverview => "fallback_overview",
            Self::Comparative => "comparative",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "initial_competitive" => Ok(Self::InitialCompetitive),
            "project_only" => Ok(Self::ProjectOnly),
            "fallback_overview" => Ok(Self::FallbackOverview),
            "comparative" => Ok(Self::Comparative),
            other => Err(CoreError::Validation(format!(
                "Unknown report type '{other}'"
            ))),
        }
    }
}

/// Output format. Only markdown is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Markdown,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Generation metadata attached to every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: Timestamp,
    pub competitor_count: usize,
    /// Percentage of competitors with snapshot data, `0..=100`.
    pub data_completeness_score: u8,
    pub analysis_method: AnalysisMethod,
    pub report_type: ReportType,
    pub correlation_id: String,
}

/// A generated report, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub project_id: DbId,
    pub title: String,
    pub description: String,
    pub content: String,
    pub format: ReportFormat,
    pub metadata: ReportMetadata,
    pub status: ReportStatus,
    pub created_at: Timestamp,
}

/// A versioned content payload belonging to exactly one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    pub id: ReportId,
    pub report_id: ReportId,
    /// Monotonic per report, starting at 1.
    pub version: i32,
    /// `None` models a row whose payload was never written.
    pub content: Option<String>,
    pub created_at: Timestamp,
}

impl ReportVersion {
    /// Whether this version carries retrievable content.
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

/// Version number of the first version the generator writes.
pub const FIRST_VERSION: i32 = 1;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn status_names_parse_back() {
        for status in [
            ReportStatus::NotStarted,
            ReportStatus::Generating,
            ReportStatus::Completed,
            ReportStatus::Failed,
        ] {
            assert_eq!(ReportStatus::from_name(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert_matches!(
            ReportStatus::from_name("archived"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(AnalysisMethod::AiPowered).unwrap(),
            "ai_powered"
        );
        assert_eq!(
            serde_json::to_value(ReportType::FallbackOverview).unwrap(),
            "fallback_overview"
        );
        assert_eq!(serde_json::to_value(ReportStatus::NotStarted).unwrap(), "not_started");
    }

    #[test]
    fn report_type_names_match_serde() {
        let serialized = serde_json::to_value(ReportType::InitialCompetitive).unwrap();
        assert_eq!(serialized, ReportType::InitialCompetitive.as_str());
        assert_eq!(
            ReportType::from_name("comparative").unwrap(),
            ReportType::Comparative
        );
        assert!(AnalysisMethod::from_name("magic").is_err());
    }

    #[test]
    fn title_joins_prefix_and_product() {
        assert_eq!(
            report_title(INITIAL_TITLE_PREFIX, "Acme CRM"),
            "Initial Competitive Analysis - Acme CRM"
        );
    }
}
