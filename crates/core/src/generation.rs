//! Report generation requests, responses and failure taxonomy.
//!
//! The generator never raises for expected conditions: a terminal failure
//! is carried inside [`GenerationResponse`] as a [`GenerationFailure`] with
//! a human-readable message and an error-kind tag for triage.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::completeness::MIN_COMPLETENESS_SCORE;
use crate::error::CoreError;
use crate::project::Product;
use crate::report::{Report, ReportStatus};
use crate::types::DbId;

/// Hint appended to every failure that the fallback flag would have avoided.
pub const FALLBACK_HINT: &str =
    "Enable fallback_to_partial_data to proceed with degraded output.";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Template selector. Every template renders markdown; the selector only
/// changes the wording of the generated body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTemplate {
    #[default]
    Comprehensive,
    Executive,
    Technical,
}

/// Optional knobs for a generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default)]
    pub fallback_to_partial_data: bool,
    #[serde(default)]
    pub template: ReportTemplate,
}

/// Input to `generate_initial_report`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Required; `None` is rejected as a validation error.
    pub project_id: Option<DbId>,
    /// Caller-supplied idempotency/trace token. Generated when absent.
    pub task_id: Option<String>,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Request for `project_id` with default options.
    pub fn for_project(project_id: DbId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    /// Enable or disable partial-data fallback.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.options.fallback_to_partial_data = enabled;
        self
    }

    /// Attach a caller-supplied task id.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// The task id to thread through the attempt: the caller's, or a fresh
    /// UUID when absent or blank.
    pub fn resolve_task_id(&self) -> String {
        match self.task_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        }
    }

    /// The project id, or a validation error when it is missing.
    pub fn require_project_id(&self) -> Result<DbId, CoreError> {
        self.project_id
            .ok_or_else(|| CoreError::Validation("Project id is required".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Error-type tag carried by a failed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    /// Missing or unknown project, insufficient data without fallback.
    Validation,
    /// The AI provider failed to initialize.
    Dependency,
    /// The AI call or the whole attempt exceeded its budget.
    Timeout,
    /// The AI call returned an error.
    Analysis,
    /// The attempt could not run: project store unreachable, task aborted.
    Internal,
}

/// Structured failure carried in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationFailure {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(err: CoreError) -> Self {
        Self::new(GenerationErrorKind::Validation, err.to_string())
    }

    pub fn project_not_found(project_id: DbId) -> Self {
        Self::new(
            GenerationErrorKind::Validation,
            format!("Project {project_id} not found"),
        )
    }

    /// Completeness below the threshold without fallback. The message names
    /// the score.
    pub fn insufficient_data(score: u8) -> Self {
        Self::new(
            GenerationErrorKind::Validation,
            format!(
                "Insufficient data for report generation: {score}% data completeness \
                 (minimum {MIN_COMPLETENESS_SCORE}%). {FALLBACK_HINT}"
            ),
        )
    }

    pub fn ai_unavailable(reason: impl std::fmt::Display) -> Self {
        Self::new(
            GenerationErrorKind::Dependency,
            format!("AI analysis service unavailable: {reason}. {FALLBACK_HINT}"),
        )
    }

    pub fn ai_timeout(budget: Duration) -> Self {
        Self::new(
            GenerationErrorKind::Timeout,
            format!(
                "AI analysis timed out after {}s. {FALLBACK_HINT}",
                budget.as_secs()
            ),
        )
    }

    pub fn analysis_failed(reason: impl std::fmt::Display) -> Self {
        Self::new(
            GenerationErrorKind::Analysis,
            format!("AI analysis failed: {reason}. {FALLBACK_HINT}"),
        )
    }

    pub fn internal(reason: impl std::fmt::Display) -> Self {
        Self::new(
            GenerationErrorKind::Internal,
            format!("Report generation failed: {reason}"),
        )
    }

    pub fn attempt_timeout(budget: Duration) -> Self {
        Self::new(
            GenerationErrorKind::Timeout,
            format!(
                "Report generation exceeded its {}s time budget",
                budget.as_secs()
            ),
        )
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Outcome of a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    pub status: ReportStatus,
    pub project_id: Option<DbId>,
    /// Correlation id of the attempt.
    pub task_id: String,
    pub report: Option<Report>,
    pub error: Option<GenerationFailure>,
    pub processing_time_ms: u64,
    /// Persistence steps that failed. The report is still returned.
    pub persistence_warnings: Vec<String>,
}

impl GenerationResponse {
    pub fn succeeded(report: Report, task_id: String, processing_time: Duration) -> Self {
        Self {
            success: true,
            status: ReportStatus::Completed,
            project_id: Some(report.project_id),
            task_id,
            report: Some(report),
            error: None,
            processing_time_ms: processing_time.as_millis() as u64,
            persistence_warnings: Vec::new(),
        }
    }

    pub fn failed(
        project_id: Option<DbId>,
        task_id: String,
        failure: GenerationFailure,
        processing_time: Duration,
    ) -> Self {
        Self {
            success: false,
            status: ReportStatus::Failed,
            project_id,
            task_id,
            report: None,
            error: Some(failure),
            processing_time_ms: processing_time.as_millis() as u64,
            persistence_warnings: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comparative analysis input
// ---------------------------------------------------------------------------

/// Threat a competitor poses, as judged by the upstream analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

/// Per-competitor slice of a comparative analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorInsight {
    pub competitor_name: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub threat_level: ThreatLevel,
}

/// A completed analysis from which a comparative report is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativeAnalysisInput {
    pub project_id: DbId,
    pub task_id: Option<String>,
    pub product: Product,
    pub summary: String,
    pub key_findings: Vec<String>,
    pub competitor_insights: Vec<CompetitorInsight>,
    pub recommendations: Vec<String>,
    /// Analysis confidence, `0..=100`.
    pub confidence_score: u8,
    /// Input data quality, `0..=100`. Used as the completeness score.
    pub data_quality_score: u8,
}

impl ComparativeAnalysisInput {
    /// Check the input before any report is built.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.product.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Product name must not be empty".to_string(),
            ));
        }
        if self.summary.trim().is_empty() {
            return Err(CoreError::Validation(
                "Analysis summary must not be empty".to_string(),
            ));
        }
        if self.confidence_score > 100 || self.data_quality_score > 100 {
            return Err(CoreError::Validation(
                "Scores must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
