use std::path::PathBuf;
use std::time::Duration;

/// Budget for a single AI analysis call.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 90;
/// Budget for fetching data and producing the report (AI call included).
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
/// Budget for each persistence write (report, version, archive file).
pub const DEFAULT_PERSISTENCE_TIMEOUT_SECS: u64 = 10;
/// Default archive root.
pub const DEFAULT_ARCHIVE_DIR: &str = "./reports";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_COMPLETION_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

fn env_secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

/// Report generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Hard budget for the AI analysis call.
    pub ai_timeout: Duration,
    /// Hard budget for the build phase of an attempt.
    pub generation_timeout: Duration,
    /// Hard budget for each persistence write.
    pub persistence_timeout: Duration,
}

impl GeneratorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `AI_TIMEOUT_SECS`           | `90`    |
    /// | `GENERATION_TIMEOUT_SECS`   | `120`   |
    /// | `PERSISTENCE_TIMEOUT_SECS`  | `10`    |
    pub fn from_env() -> Self {
        Self {
            ai_timeout: env_secs("AI_TIMEOUT_SECS", DEFAULT_AI_TIMEOUT_SECS),
            generation_timeout: env_secs(
                "GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS,
            ),
            persistence_timeout: env_secs(
                "PERSISTENCE_TIMEOUT_SECS",
                DEFAULT_PERSISTENCE_TIMEOUT_SECS,
            ),
        }
    }

    /// Worst-case wall time of one attempt: the build phase plus three
    /// bounded writes.
    pub fn max_attempt_duration(&self) -> Duration {
        self.generation_timeout + self.persistence_timeout * 3
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ai_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            persistence_timeout: Duration::from_secs(DEFAULT_PERSISTENCE_TIMEOUT_SECS),
        }
    }
}

/// HTTP completion provider configuration.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API, without trailing slash.
    pub api_url: String,
    /// Bearer token. Missing means the provider cannot initialize.
    pub api_key: Option<String>,
    pub model: String,
}

impl CompletionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                     |
    /// |----------------------|-----------------------------|
    /// | `COMPLETION_API_URL` | `https://api.openai.com/v1` |
    /// | `COMPLETION_API_KEY` | none                        |
    /// | `COMPLETION_MODEL`   | `gpt-4o-mini`               |
    pub fn from_env() -> Self {
        let api_url = std::env::var("COMPLETION_API_URL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_API_URL.into())
            .trim_end_matches('/')
            .to_string();
        let api_key = std::env::var("COMPLETION_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let model =
            std::env::var("COMPLETION_MODEL").unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.into());

        Self {
            api_url,
            api_key,
            model,
        }
    }
}

/// Archive root from `REPORT_ARCHIVE_DIR` (default `./reports`).
pub fn archive_dir_from_env() -> PathBuf {
    std::env::var("REPORT_ARCHIVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ARCHIVE_DIR))
}
