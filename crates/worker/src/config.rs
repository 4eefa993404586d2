use std::time::Duration;

use anyhow::Context;

/// Default interval between integrity sweeps: 15 minutes.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 900;

/// Worker configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// How often the zombie sweep runs.
    pub sweep_interval: Duration,
    /// Project to generate an initial report for at startup, if any.
    pub generate_project_id: Option<i64>,
    /// Enable partial-data fallback for the startup generation.
    pub generate_with_fallback: bool,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                         | Default  |
    /// |---------------------------------|----------|
    /// | `DATABASE_URL`                  | required |
    /// | `INTEGRITY_SWEEP_INTERVAL_SECS` | `900`    |
    /// | `GENERATE_PROJECT_ID`           | none     |
    /// | `GENERATE_WITH_FALLBACK`        | `false`  |
    /// | `LOG_FORMAT`                    | `text`   |
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let sweep_secs: u64 = std::env::var("INTEGRITY_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

        let generate_project_id = match std::env::var("GENERATE_PROJECT_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("GENERATE_PROJECT_ID '{raw}' is not a number"))?,
            ),
            _ => None,
        };

        let generate_with_fallback = std::env::var("GENERATE_WITH_FALLBACK")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let json_logs = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            sweep_interval: Duration::from_secs(sweep_secs),
            generate_project_id,
            generate_with_fallback,
            json_logs,
        })
    }
}
