//! Report integrity assessment.
//!
//! A report is a *zombie* when its status is `completed` but none of its
//! versions carries content. The assessment here is pure: the caller loads
//! the report status and its versions, and [`assess_integrity`] decides the
//! risk level and whether the report may be marked completed.

use serde::{Deserialize, Serialize};

use crate::report::{ReportStatus, ReportVersion};

// ---------------------------------------------------------------------------
// Issue messages
// ---------------------------------------------------------------------------

pub const ISSUE_REPORT_NOT_FOUND: &str = "Report not found";
pub const ISSUE_COMPLETED_WITHOUT_VERSIONS: &str =
    "Report is marked completed but has no versions";
pub const ISSUE_COMPLETED_WITHOUT_CONTENT: &str =
    "Report is marked completed but no version has content";
pub const ISSUE_NO_VERSIONS: &str = "Report has no versions";
pub const ISSUE_NO_CONTENT: &str = "No report version has content";

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

/// How likely a report is to be (or become) a zombie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZombieRisk {
    Low,
    Medium,
    High,
}

/// Outcome of an integrity check on a single report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub zombie_risk: ZombieRisk,
    pub can_be_marked_completed: bool,
}

impl IntegrityResult {
    /// Result for a report id that does not exist. Nothing to corrupt, so
    /// the risk is low.
    pub fn missing_report() -> Self {
        Self {
            is_valid: false,
            issues: vec![ISSUE_REPORT_NOT_FOUND.to_string()],
            zombie_risk: ZombieRisk::Low,
            can_be_marked_completed: false,
        }
    }

    /// Result when the check itself could not run. Treated as invalid and
    /// high risk.
    pub fn check_failed(reason: impl std::fmt::Display) -> Self {
        Self {
            is_valid: false,
            issues: vec![format!("Integrity check failed: {reason}")],
            zombie_risk: ZombieRisk::High,
            can_be_marked_completed: false,
        }
    }
}

/// Whether any version carries content.
pub fn has_content_version(versions: &[ReportVersion]) -> bool {
    versions.iter().any(ReportVersion::has_content)
}

/// Assess an existing report from its status and versions.
///
/// - **High**: status is `completed` and no version has content (including
///   the case of no versions at all).
/// - **Medium**: not completed and no version has content, or some versions
///   are missing content.
/// - **Low**: every version has content.
pub fn assess_integrity(status: ReportStatus, versions: &[ReportVersion]) -> IntegrityResult {
    let completed = status == ReportStatus::Completed;
    let with_content = versions.iter().filter(|v| v.has_content()).count();
    let mut issues = Vec::new();

    let zombie_risk = if versions.is_empty() {
        issues.push(if completed {
            ISSUE_COMPLETED_WITHOUT_VERSIONS.to_string()
        } else {
            ISSUE_NO_VERSIONS.to_string()
        });
        if completed {
            ZombieRisk::High
        } else {
            ZombieRisk::Medium
        }
    } else if with_content == 0 {
        issues.push(if completed {
            ISSUE_COMPLETED_WITHOUT_CONTENT.to_string()
        } else {
            ISSUE_NO_CONTENT.to_string()
        });
        if completed {
            ZombieRisk::High
        } else {
            ZombieRisk::Medium
        }
    } else if with_content < versions.len() {
        issues.push(format!(
            "{} of {} report versions have no content",
            versions.len() - with_content,
            versions.len()
        ));
        ZombieRisk::Medium
    } else {
        ZombieRisk::Low
    };

    IntegrityResult {
        is_valid: issues.is_empty(),
        issues,
        zombie_risk,
        can_be_marked_completed: with_content > 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
