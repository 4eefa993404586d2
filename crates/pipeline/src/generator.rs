//! Initial and comparative report generation.
//!
//! [`ReportGenerator`] turns a project id into a completed report. Each
//! attempt walks a fixed decision path:
//!
//! 1. Load the project. No competitors means a project-only report.
//! 2. Score data completeness. Below the threshold the attempt fails unless
//!    partial-data fallback is enabled.
//! 3. Initialize the completion provider. On failure, fall back to a
//!    rule-based overview or fail.
//! 4. Run the AI analysis under its own budget. On timeout or error, fall
//!    back to rule-based content or fail.
//! 5. Persist the report, its first version and the archive file. These
//!    steps only produce warnings.
//!
//! Concurrent requests for the same project share one attempt (see
//! [`crate::dedup`]). Every terminal outcome is published on the
//! [`EventBus`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rivalscope_core::completeness::{
    meets_threshold, project_completeness, FALLBACK_OVERVIEW_SCORE, PROJECT_ONLY_SCORE,
};
use rivalscope_core::generation::{
    ComparativeAnalysisInput, GenerationFailure, GenerationOptions, GenerationRequest,
    GenerationResponse,
};
use rivalscope_core::markdown;
use rivalscope_core::project::Project;
use rivalscope_core::report::{
    report_title, AnalysisMethod, Report, ReportFormat, ReportMetadata, ReportStatus, ReportType,
    ReportVersion, COMPARATIVE_TITLE_PREFIX, FALLBACK_TITLE_PREFIX, FIRST_VERSION,
    INITIAL_TITLE_PREFIX, PROJECT_ONLY_TITLE_PREFIX,
};
use rivalscope_core::types::DbId;
use rivalscope_events::bus::{
    BusinessEvent, EventBus, REPORT_GENERATED, REPORT_GENERATION_FAILED,
};
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::dedup::InFlight;
use crate::error::{CompletionError, StoreError};
use crate::ports::{CompletionProvider, ProjectSource, ReportArchive, ReportStore};

/// A report body plus the metadata needed to turn it into a [`Report`].
struct Draft {
    title_prefix: &'static str,
    product_name: String,
    description: String,
    competitor_count: usize,
    content: String,
    analysis_method: AnalysisMethod,
    report_type: ReportType,
    completeness: u8,
}

impl Draft {
    fn into_report(self, project_id: DbId, correlation_id: &str) -> Report {
        let now = Utc::now();
        Report {
            id: Uuid::new_v4(),
            project_id,
            title: report_title(self.title_prefix, &self.product_name),
            description: self.description,
            content: self.content,
            format: ReportFormat::Markdown,
            metadata: ReportMetadata {
                generated_at: now,
                competitor_count: self.competitor_count,
                data_completeness_score: self.completeness,
                analysis_method: self.analysis_method,
                report_type: self.report_type,
                correlation_id: correlation_id.to_string(),
            },
            status: ReportStatus::Completed,
            created_at: now,
        }
    }
}

/// Run a store write under `budget`, flattening timeout and store errors
/// into a message.
async fn bounded<T>(
    budget: Duration,
    write: impl std::future::Future<Output = Result<T, StoreError>>,
) -> Result<T, String> {
    match tokio::time::timeout(budget, write).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", budget.as_secs())),
    }
}

fn resolve_task_id(task_id: Option<&str>) -> String {
    match task_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

struct GeneratorInner {
    projects: Arc<dyn ProjectSource>,
    reports: Arc<dyn ReportStore>,
    archive: Arc<dyn ReportArchive>,
    completion: Arc<dyn CompletionProvider>,
    events: Arc<EventBus>,
    config: GeneratorConfig,
    initial_attempts: InFlight<DbId, GenerationResponse>,
    comparative_attempts: InFlight<DbId, GenerationResponse>,
}

/// Report generation service. Cheap to clone; clones share the in-flight
/// registries.
#[derive(Clone)]
pub struct ReportGenerator {
    inner: Arc<GeneratorInner>,
}

impl ReportGenerator {
    pub fn new(
        projects: Arc<dyn ProjectSource>,
        reports: Arc<dyn ReportStore>,
        archive: Arc<dyn ReportArchive>,
        completion: Arc<dyn CompletionProvider>,
        events: Arc<EventBus>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(GeneratorInner {
                projects,
                reports,
                archive,
                completion,
                events,
                config,
                initial_attempts: InFlight::new(),
                comparative_attempts: InFlight::new(),
            }),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.inner.config
    }

    /// Whether an initial-report attempt is running for `project_id`.
    pub fn is_generating(&self, project_id: DbId) -> bool {
        self.inner.initial_attempts.contains(&project_id)
    }

    /// Generate the initial competitive report for a project.
    ///
    /// Never returns an error: terminal failures are carried in the
    /// response. A caller arriving while an attempt for the same project is
    /// running receives that attempt's response.
    pub async fn generate_initial_report(&self, request: GenerationRequest) -> GenerationResponse {
        let started = Instant::now();
        let task_id = request.resolve_task_id();

        let project_id = match request.require_project_id() {
            Ok(id) => id,
            Err(e) => {
                let response = GenerationResponse::failed(
                    None,
                    task_id,
                    GenerationFailure::validation(e),
                    started.elapsed(),
                );
                self.inner.publish_outcome(&response);
                return response;
            }
        };

        let inner = Arc::clone(&self.inner);
        let options = request.options;
        let attempt_task_id = task_id.clone();
        let attempt = async move {
            let span = tracing::info_span!(
                "report_generation",
                correlation_id = %attempt_task_id,
                project_id
            );
            inner
                .run_initial(project_id, options, attempt_task_id, started)
                .instrument(span)
                .await
        };

        let (result, joined) = self.inner.initial_attempts.run_or_join(project_id, attempt).await;
        if joined {
            tracing::debug!(project_id, task_id = %task_id, "Joined in-flight report generation");
        }

        result.unwrap_or_else(|aborted| {
            tracing::error!(
                project_id,
                task_id = %task_id,
                error = %aborted,
                "Generation attempt aborted"
            );
            GenerationResponse::failed(
                Some(project_id),
                task_id,
                GenerationFailure::internal(aborted),
                started.elapsed(),
            )
        })
    }

    /// Render and persist a comparative report from a completed analysis.
    ///
    /// Deduplicated per project independently of initial reports.
    pub async fn generate_comparative_report(
        &self,
        input: ComparativeAnalysisInput,
    ) -> GenerationResponse {
        let started = Instant::now();
        let task_id = resolve_task_id(input.task_id.as_deref());
        let project_id = input.project_id;

        if let Err(e) = input.validate() {
            let response = GenerationResponse::failed(
                Some(project_id),
                task_id,
                GenerationFailure::validation(e),
                started.elapsed(),
            );
            self.inner.publish_outcome(&response);
            return response;
        }

        let inner = Arc::clone(&self.inner);
        let attempt_task_id = task_id.clone();
        let attempt = async move {
            let span = tracing::info_span!(
                "comparative_report",
                correlation_id = %attempt_task_id,
                project_id
            );
            inner
                .run_comparative(input, attempt_task_id, started)
                .instrument(span)
                .await
        };

        let (result, joined) = self
            .inner
            .comparative_attempts
            .run_or_join(project_id, attempt)
            .await;
        if joined {
            tracing::debug!(project_id, task_id = %task_id, "Joined in-flight comparative report");
        }

        result.unwrap_or_else(|aborted| {
            tracing::error!(
                project_id,
                task_id = %task_id,
                error = %aborted,
                "Comparative attempt aborted"
            );
            GenerationResponse::failed(
                Some(project_id),
                task_id,
                GenerationFailure::internal(aborted),
                started.elapsed(),
            )
        })
    }
}

impl GeneratorInner {
    async fn run_initial(
        &self,
        project_id: DbId,
        options: GenerationOptions,
        task_id: String,
        started: Instant,
    ) -> GenerationResponse {
        tracing::info!(
            fallback = options.fallback_to_partial_data,
            template = ?options.template,
            "Starting initial report generation"
        );

        let budget = self.config.generation_timeout;
        let built = match tokio::time::timeout(budget, self.build_initial(project_id, &options))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(budget_secs = budget.as_secs(), "Report generation timed out");
                Err(GenerationFailure::attempt_timeout(budget))
            }
        };

        self.complete_attempt(project_id, built, task_id, started).await
    }

    async fn run_comparative(
        &self,
        input: ComparativeAnalysisInput,
        task_id: String,
        started: Instant,
    ) -> GenerationResponse {
        tracing::info!(
            insights = input.competitor_insights.len(),
            confidence = input.confidence_score,
            "Starting comparative report generation"
        );

        let budget = self.config.generation_timeout;
        let loaded = match tokio::time::timeout(budget, self.load_project(input.project_id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(budget_secs = budget.as_secs(), "Project load timed out");
                Err(GenerationFailure::attempt_timeout(budget))
            }
        };
        if let Err(failure) = loaded {
            return self
                .complete_attempt(input.project_id, Err(failure), task_id, started)
                .await;
        }

        let draft = Draft {
            title_prefix: COMPARATIVE_TITLE_PREFIX,
            description: format!(
                "Comparative analysis of {} against {} competitors",
                input.product.name,
                input.competitor_insights.len()
            ),
            product_name: input.product.name.clone(),
            competitor_count: input.competitor_insights.len(),
            content: markdown::comparative_content(&input),
            analysis_method: AnalysisMethod::AiPowered,
            report_type: ReportType::Comparative,
            completeness: input.data_quality_score,
        };

        self.complete_attempt(input.project_id, Ok(draft), task_id, started)
            .await
    }

    /// Turn a built draft (or failure) into the final response: persist on
    /// success, publish the outcome either way.
    async fn complete_attempt(
        &self,
        project_id: DbId,
        built: Result<Draft, GenerationFailure>,
        task_id: String,
        started: Instant,
    ) -> GenerationResponse {
        let response = match built {
            Ok(draft) => {
                let report = draft.into_report(project_id, &task_id);
                let warnings = self.persist(&report).await;
                let mut response =
                    GenerationResponse::succeeded(report, task_id, started.elapsed());
                response.persistence_warnings = warnings;
                response
            }
            Err(failure) => {
                tracing::warn!(
                    error_kind = ?failure.kind,
                    error = %failure.message,
                    "Report generation failed"
                );
                GenerationResponse::failed(Some(project_id), task_id, failure, started.elapsed())
            }
        };

        self.publish_outcome(&response);
        response
    }

    async fn load_project(&self, project_id: DbId) -> Result<Project, GenerationFailure> {
        match self.projects.get_project(project_id).await {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Err(GenerationFailure::project_not_found(project_id)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load project");
                Err(GenerationFailure::internal(e))
            }
        }
    }

    async fn build_initial(
        &self,
        project_id: DbId,
        options: &GenerationOptions,
    ) -> Result<Draft, GenerationFailure> {
        let fallback = options.fallback_to_partial_data;

        let project = self.load_project(project_id).await?;

        if project.competitors.is_empty() {
            tracing::info!("Project has no competitors, generating project-only report");
            return Ok(Draft {
                title_prefix: PROJECT_ONLY_TITLE_PREFIX,
                description: format!(
                    "Overview of {} (no competitors tracked)",
                    project.product.name
                ),
                product_name: project.product.name.clone(),
                competitor_count: 0,
                content: markdown::project_only_content(&project),
                analysis_method: AnalysisMethod::RuleBased,
                report_type: ReportType::ProjectOnly,
                completeness: PROJECT_ONLY_SCORE,
            });
        }

        let score = project_completeness(&project);
        if !meets_threshold(score) {
            if !fallback {
                return Err(GenerationFailure::insufficient_data(score));
            }
            tracing::warn!(
                completeness = score,
                ready = project.ready_competitor_count(),
                total = project.competitors.len(),
                "Data completeness below threshold, continuing with partial data"
            );
        }

        if let Err(reason) = self.initialize_provider().await {
            if !fallback {
                return Err(GenerationFailure::ai_unavailable(&reason));
            }
            tracing::warn!(
                error = %reason,
                "Completion provider unavailable, using fallback overview"
            );
            return Ok(Draft {
                title_prefix: FALLBACK_TITLE_PREFIX,
                description: format!(
                    "Competitor overview of {} without AI analysis",
                    project.product.name
                ),
                product_name: project.product.name.clone(),
                competitor_count: project.competitors.len(),
                content: markdown::fallback_overview_content(&project, &reason),
                analysis_method: AnalysisMethod::RuleBased,
                report_type: ReportType::FallbackOverview,
                completeness: FALLBACK_OVERVIEW_SCORE,
            });
        }

        let prompt = markdown::analysis_prompt(&project, options.template);
        let failure = match self.analyze(&prompt).await {
            Ok(text) => return Ok(initial_draft(&project, text, AnalysisMethod::AiPowered, score)),
            Err(failure) => failure,
        };

        if !fallback {
            return Err(failure);
        }
        tracing::warn!(
            error_kind = ?failure.kind,
            error = %failure.message,
            "AI analysis failed, using rule-based content"
        );
        let content = markdown::rule_based_content(&project, score);
        Ok(initial_draft(&project, content, AnalysisMethod::RuleBased, score))
    }

    /// Initialize the completion provider under the AI budget. An expired
    /// budget counts as an initialization error.
    async fn initialize_provider(&self) -> Result<(), String> {
        let budget = self.config.ai_timeout;
        match tokio::time::timeout(budget, self.completion.initialize()).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => {
                tracing::warn!(
                    budget_secs = budget.as_secs(),
                    "Completion provider initialization timed out"
                );
                Err(format!("initialization timed out after {}s", budget.as_secs()))
            }
        }
    }

    /// Run the completion call under the AI budget.
    async fn analyze(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let budget = self.config.ai_timeout;
        let started = Instant::now();
        let result = tokio::time::timeout(budget, self.completion.complete(prompt)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                tracing::debug!(elapsed_ms, chars = text.len(), "AI analysis completed");
                Ok(text)
            }
            Ok(Ok(_)) => Err(GenerationFailure::analysis_failed("empty response")),
            Ok(Err(CompletionError::Timeout)) => Err(GenerationFailure::ai_timeout(budget)),
            Ok(Err(e)) => Err(GenerationFailure::analysis_failed(e)),
            Err(_) => {
                tracing::warn!(budget_secs = budget.as_secs(), "AI analysis timed out");
                Err(GenerationFailure::ai_timeout(budget))
            }
        }
    }

    /// Store the report, its first version and the archive copy.
    ///
    /// The report and version writes run back to back. Failures are logged
    /// and returned as warnings; they never fail the attempt.
    async fn persist(&self, report: &Report) -> Vec<String> {
        let budget = self.config.persistence_timeout;
        let mut warnings = Vec::new();

        let version = ReportVersion {
            id: Uuid::new_v4(),
            report_id: report.id,
            version: FIRST_VERSION,
            content: Some(report.content.clone()),
            created_at: report.created_at,
        };

        match bounded(budget, self.reports.create_report(report)).await {
            Ok(()) => match bounded(budget, self.reports.create_report_version(&version)).await {
                Ok(()) => {
                    tracing::debug!(report_id = %report.id, "Report and first version stored");
                }
                Err(e) => {
                    tracing::error!(
                        report_id = %report.id,
                        error = %e,
                        "Failed to store report version, report has no content version"
                    );
                    warnings.push(format!("Report version not stored: {e}"));
                }
            },
            Err(e) => {
                tracing::error!(report_id = %report.id, error = %e, "Failed to store report");
                warnings.push(format!("Report not stored: {e}"));
                warnings.push("Report version not stored: report record missing".to_string());
            }
        }

        let file_name = markdown::archive_file_name(
            report.project_id,
            &report.metadata.generated_at,
            &report.id,
        );
        let document = markdown::archive_document(report);
        match bounded(
            budget,
            self.archive.write_file(report.project_id, &file_name, &document),
        )
        .await
        {
            Ok(path) => tracing::debug!(path = %path.display(), "Report archived"),
            Err(e) => {
                tracing::error!(report_id = %report.id, error = %e, "Failed to archive report");
                warnings.push(format!("Archive file not written: {e}"));
            }
        }

        warnings
    }

    fn publish_outcome(&self, response: &GenerationResponse) {
        let mut event = match (&response.report, &response.error) {
            (Some(report), _) => {
                tracing::info!(
                    report_id = %report.id,
                    processing_time_ms = response.processing_time_ms,
                    completeness = report.metadata.data_completeness_score,
                    analysis_method = report.metadata.analysis_method.as_str(),
                    report_type = report.metadata.report_type.as_str(),
                    warnings = response.persistence_warnings.len(),
                    "Report generated"
                );
                BusinessEvent::new(REPORT_GENERATED).with_payload(serde_json::json!({
                    "report_id": report.id,
                    "processing_time_ms": response.processing_time_ms,
                    "data_completeness_score": report.metadata.data_completeness_score,
                    "analysis_method": report.metadata.analysis_method,
                    "report_type": report.metadata.report_type,
                    "persistence_warnings": response.persistence_warnings.len(),
                }))
            }
            (None, failure) => BusinessEvent::new(REPORT_GENERATION_FAILED).with_payload(
                serde_json::json!({
                    "processing_time_ms": response.processing_time_ms,
                    "error_kind": failure.as_ref().map(|f| f.kind),
                    "message": failure.as_ref().map(|f| f.message.as_str()),
                }),
            ),
        };

        event = event.with_correlation_id(response.task_id.as_str());
        if let Some(project_id) = response.project_id {
            event = event.with_project(project_id);
        }
        self.events.publish(event);
    }
}

fn initial_draft(project: &Project, content: String, method: AnalysisMethod, score: u8) -> Draft {
    Draft {
        title_prefix: INITIAL_TITLE_PREFIX,
        description: format!(
            "Initial competitive analysis of {} against {} competitors",
            project.product.name,
            project.competitors.len()
        ),
        product_name: project.product.name.clone(),
        competitor_count: project.competitors.len(),
        content,
        analysis_method: method,
        report_type: ReportType::InitialCompetitive,
        completeness: score,
    }
}
