//! Markdown rendering for report bodies, archive files and recovery notices.
//!
//! Every function here is deterministic given its inputs. The archive
//! document produced by [`archive_document`] is the one bit-exact contract
//! at the file-archive boundary.

use crate::generation::{ComparativeAnalysisInput, ReportTemplate, ThreatLevel};
use crate::project::Project;
use crate::report::Report;
use crate::types::{DbId, ReportId, Timestamp};

/// Attribution line in the archive trailer.
pub const ARCHIVE_ATTRIBUTION: &str = "*Generated by Rivalscope Report Generator*";

/// Maximum characters of snapshot content quoted into an AI prompt.
pub const PROMPT_SNAPSHOT_EXCERPT_CHARS: usize = 2_000;

const RFC3339_MILLIS: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn timestamp(ts: &Timestamp) -> String {
    ts.format(RFC3339_MILLIS).to_string()
}

fn excerpt(value: &serde_json::Value, max_chars: usize) -> String {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.chars().take(max_chars).collect()
}

// ---------------------------------------------------------------------------
// AI prompt
// ---------------------------------------------------------------------------

/// Build the analysis prompt sent to the completion provider.
pub fn analysis_prompt(project: &Project, template: ReportTemplate) -> String {
    let focus = match template {
        ReportTemplate::Comprehensive => {
            "Cover positioning, features, pricing, messaging and strategic opportunities."
        }
        ReportTemplate::Executive => {
            "Keep it short: an executive summary with the three most important takeaways."
        }
        ReportTemplate::Technical => {
            "Focus on product capabilities, integrations and technical differentiators."
        }
    };

    let mut prompt = format!(
        "You are a competitive intelligence analyst. Write an initial competitive \
         analysis in markdown for the product \"{}\".\n",
        project.product.name
    );
    if let Some(website) = &project.product.website {
        prompt.push_str(&format!("Product website: {website}\n"));
    }
    if let Some(description) = &project.product.description {
        prompt.push_str(&format!("Product description: {description}\n"));
    }
    prompt.push_str(&format!("{focus}\n\nCompetitor data:\n"));
    for competitor in &project.competitors {
        let section = match competitor.latest_snapshot() {
            Some(snapshot) => format!(
                "\n## {} ({}, captured {})\n{}\n",
                competitor.name,
                snapshot.url,
                timestamp(&snapshot.captured_at),
                excerpt(&snapshot.content, PROMPT_SNAPSHOT_EXCERPT_CHARS)
            ),
            None => format!("\n## {} (no data captured yet)\n", competitor.name),
        };
        prompt.push_str(&section);
    }
    prompt
}

// ---------------------------------------------------------------------------
// Report bodies
// ---------------------------------------------------------------------------

/// Body for a project that has no competitors yet.
pub fn project_only_content(project: &Project) -> String {
    let mut out = format!("## Project Overview\n\n**Product:** {}\n", project.product.name);
    if let Some(website) = &project.product.website {
        out.push_str(&format!("**Website:** {website}\n"));
    }
    if let Some(description) = &project.product.description {
        out.push_str(&format!("\n{description}\n"));
    }
    out.push_str(
        "\n## Competitors\n\n\
         No competitors have been added to this project yet. Add competitors to \
         generate a competitive analysis.\n",
    );
    out
}

/// Body used when AI analysis could not be initialized.
pub fn fallback_overview_content(project: &Project, reason: &str) -> String {
    let mut out = format!(
        "## Competitive Overview\n\n\
         AI analysis was unavailable for this report ({reason}). This overview \
         lists the tracked competitors without analysis; regenerate the report \
         once the analysis service is available.\n\n\
         **Product:** {}\n\n\
         ## Tracked Competitors\n\n",
        project.product.name
    );
    for competitor in &project.competitors {
        out.push_str(&format!("- {}\n", competitor.name));
    }
    out
}

/// Deterministic body substituted for AI content after a timeout or call
/// failure. Lists each competitor with its data-capture timestamp.
pub fn rule_based_content(project: &Project, completeness_score: u8) -> String {
    let mut out = format!(
        "## Competitive Landscape\n\n\
         This report was generated from captured competitor data without AI \
         analysis. Data completeness: {completeness_score}%.\n\n\
         **Product:** {}\n\n\
         ## Competitor Data\n\n\
         | Competitor | Source | Captured |\n\
         |------------|--------|----------|\n",
        project.product.name
    );
    for competitor in &project.competitors {
        let row = match competitor.latest_snapshot() {
            Some(snapshot) => format!(
                "| {} | {} | {} |\n",
                competitor.name,
                snapshot.url,
                timestamp(&snapshot.captured_at)
            ),
            None => format!("| {} | - | not yet captured |\n", competitor.name),
        };
        out.push_str(&row);
    }
    out
}

fn threat_label(level: ThreatLevel) -> &'static str {
    match level {
        ThreatLevel::Low => "low",
        ThreatLevel::Medium => "medium",
        ThreatLevel::High => "high",
    }
}

/// Body for the comparative report path.
pub fn comparative_content(input: &ComparativeAnalysisInput) -> String {
    let mut out = format!(
        "## Executive Summary\n\n{}\n\n**Confidence:** {}%\n\n",
        input.summary, input.confidence_score
    );

    if !input.key_findings.is_empty() {
        out.push_str("## Key Findings\n\n");
        for finding in &input.key_findings {
            out.push_str(&format!("- {finding}\n"));
        }
        out.push('\n');
    }

    if !input.competitor_insights.is_empty() {
        out.push_str("## Competitor Insights\n\n");
        for insight in &input.competitor_insights {
            out.push_str(&format!(
                "### {} (threat: {})\n\n",
                insight.competitor_name,
                threat_label(insight.threat_level)
            ));
            if !insight.strengths.is_empty() {
                out.push_str(&format!("**Strengths:** {}\n", insight.strengths.join("; ")));
            }
            if !insight.weaknesses.is_empty() {
                out.push_str(&format!("**Weaknesses:** {}\n", insight.weaknesses.join("; ")));
            }
            out.push('\n');
        }
    }

    if !input.recommendations.is_empty() {
        out.push_str("## Recommendations\n\n");
        for (i, rec) in input.recommendations.iter().enumerate() {
            out.push_str(&format!("{}. {rec}\n", i + 1));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Archive file
// ---------------------------------------------------------------------------

/// Render the human-readable archive copy of a report.
pub fn archive_document(report: &Report) -> String {
    format!(
        "# {title}\n\
         \n\
         **Generated:** {generated}\n\
         **Project ID:** {project_id}\n\
         **Report ID:** {report_id}\n\
         **Data Completeness:** {score}%\n\
         **Analysis Method:** {method}\n\
         \n\
         ---\n\
         \n\
         {body}\n\
         \n\
         ---\n\
         \n\
         {ARCHIVE_ATTRIBUTION}\n\
         *Correlation ID: {correlation_id}*\n",
        title = report.title,
        generated = timestamp(&report.metadata.generated_at),
        project_id = report.project_id,
        report_id = report.id,
        score = report.metadata.data_completeness_score,
        method = report.metadata.analysis_method.as_str(),
        body = report.content.trim_end(),
        correlation_id = report.metadata.correlation_id,
    )
}

/// Deterministic archive file name: project id, compact UTC timestamp and
/// the first block of the report id.
pub fn archive_file_name(
    project_id: DbId,
    generated_at: &Timestamp,
    report_id: &ReportId,
) -> String {
    let simple = report_id.simple().to_string();
    format!(
        "{project_id}_{}_{}.md",
        generated_at.format("%Y%m%dT%H%M%S%3fZ"),
        &simple[..8]
    )
}

// ---------------------------------------------------------------------------
// Emergency recovery notice
// ---------------------------------------------------------------------------

/// Content of the emergency version appended to a zombie report.
pub fn emergency_version_content(
    report_id: &ReportId,
    title: &str,
    description: Option<&str>,
    created_at: &Timestamp,
    recovered_at: &Timestamp,
) -> String {
    format!(
        "# {title}\n\
         \n\
         > **Emergency recovery notice.** This report was marked completed but \
         its content was never stored. The original content could not be \
         recovered.\n\
         \n\
         - **Report ID:** {report_id}\n\
         - **Original title:** {title}\n\
         - **Original description:** {description}\n\
         - **Originally created:** {created}\n\
         - **Recovered at:** {recovered}\n\
         - **Requires regeneration:** yes\n\
         \n\
         Regenerate this report to restore its analysis.\n",
        description = description.unwrap_or("(none)"),
        created = timestamp(created_at),
        recovered = timestamp(recovered_at),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
