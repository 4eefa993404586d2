//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rivalscope_core::project::{Competitor, Product, Project, Snapshot};
use rivalscope_events::bus::EventBus;
use rivalscope_pipeline::memory::{InMemoryArchive, InMemoryProjectSource, InMemoryReportStore};
use rivalscope_pipeline::ports::CompletionProvider;
use rivalscope_pipeline::{CompletionError, GeneratorConfig, ReportGenerator, ValidationService};

pub const PRODUCT_NAME: &str = "Acme Analytics";
pub const AI_TEXT: &str = "## Market Position\n\nAcme leads on integrations.";

// ---------------------------------------------------------------------------
// Scripted completion provider
// ---------------------------------------------------------------------------

/// What the scripted provider answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    Timeout,
}

/// Completion provider whose behavior is set per test.
pub struct ScriptedCompletion {
    fail_init: AtomicBool,
    reply: Mutex<Reply>,
    delay: Mutex<Duration>,
    init_delay: Mutex<Duration>,
    init_calls: AtomicUsize,
    complete_calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self {
            fail_init: AtomicBool::new(false),
            reply: Mutex::new(Reply::Text(AI_TEXT.to_string())),
            delay: Mutex::new(Duration::ZERO),
            init_delay: Mutex::new(Duration::ZERO),
            init_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn reply_with(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    /// Sleep this long inside every `complete` call.
    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Sleep this long inside every `initialize` call.
    pub fn init_delay(&self, delay: Duration) {
        *self.init_delay.lock().unwrap() = delay;
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn initialize(&self) -> Result<(), CompletionError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.init_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(CompletionError::NotConfigured("no api key".to_string()));
        }
        Ok(())
    }

    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(CompletionError::Unavailable("model overloaded".to_string())),
            Reply::Timeout => Err(CompletionError::Timeout),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A project with `total` competitors, the first `ready` of which have a
/// snapshot.
pub fn project(id: i64, ready: usize, total: usize) -> Project {
    let competitors = (1..=total)
        .map(|i| Competitor {
            id: id * 100 + i as i64,
            name: format!("Competitor {i}"),
            snapshots: if i <= ready {
                vec![Snapshot {
                    content: serde_json::json!({
                        "text": format!("Pricing page of competitor {i}")
                    }),
                    url: format!("https://competitor{i}.example.com"),
                    captured_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
                }]
            } else {
                Vec::new()
            },
        })
        .collect();

    Project {
        id,
        name: format!("Project {id}"),
        product: Product {
            name: PRODUCT_NAME.to_string(),
            website: Some("https://acme.example.com".to_string()),
            description: Some("Product analytics for teams".to_string()),
        },
        competitors,
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// In-memory wiring of the generator and the validator.
pub struct Harness {
    pub projects: Arc<InMemoryProjectSource>,
    pub reports: Arc<InMemoryReportStore>,
    pub archive: Arc<InMemoryArchive>,
    pub completion: Arc<ScriptedCompletion>,
    pub events: Arc<EventBus>,
    pub generator: ReportGenerator,
    pub validator: ValidationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        let projects = Arc::new(InMemoryProjectSource::new());
        let reports = Arc::new(InMemoryReportStore::new());
        let archive = Arc::new(InMemoryArchive::new());
        let completion = Arc::new(ScriptedCompletion::new());
        let events = Arc::new(EventBus::default());

        let generator = ReportGenerator::new(
            projects.clone(),
            reports.clone(),
            archive.clone(),
            completion.clone(),
            events.clone(),
            config,
        );
        let validator = ValidationService::new(reports.clone(), events.clone());

        Self {
            projects,
            reports,
            archive,
            completion,
            events,
            generator,
            validator,
        }
    }

    /// Harness with `project(id, ready, total)` already inserted.
    pub fn with_project(id: i64, ready: usize, total: usize) -> Self {
        let harness = Self::new();
        harness.projects.insert(project(id, ready, total));
        harness
    }
}
