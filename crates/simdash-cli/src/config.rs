use simdash_client::{ClientConfig, DEFAULT_API_BASE};
use simdash_engine::{EngineConfig, DEFAULT_PROBE_CONCURRENCY, DEFAULT_PROJECT_LIMIT};
use std::io;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const ENV_API_BASE: &str = "SIMDASH_API_BASE";
pub const ENV_PROJECT_LIMIT: &str = "SIMDASH_PROJECT_LIMIT";
pub const ENV_PROBE_CONCURRENCY: &str = "SIMDASH_PROBE_CONCURRENCY";
pub const ENV_PROBE_DEADLINE_MS: &str = "SIMDASH_PROBE_DEADLINE_MS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "SIMDASH_HTTP_TIMEOUT_SECS";
pub const ENV_HTTP_RETRIES: &str = "SIMDASH_HTTP_RETRIES";
pub const ENV_LOG_STDERR: &str = "SIMDASH_LOG_STDERR";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_RETRIES: u32 = 2;

/// Values given on the command line; `None` falls through to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub project_limit: Option<usize>,
    pub probe_concurrency: Option<usize>,
    pub probe_deadline_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub project_limit: usize,
    pub probe_concurrency: usize,
    pub probe_deadline: Option<Duration>,
    pub http_timeout: Duration,
    pub http_retries: u32,
}

impl Config {
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            project_limit: self.project_limit,
            probe_concurrency: self.probe_concurrency,
            probe_deadline: self.probe_deadline,
        }
    }

    pub fn client(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base.clone(),
            timeout: self.http_timeout,
            max_retries: self.http_retries,
            ..ClientConfig::default()
        }
    }
}

pub fn load_config(overrides: &Overrides) -> Config {
    load_config_with(overrides, |key| std::env::var(key).ok())
}

/// Flag, then non-blank env value, then default. Unparseable env values are
/// ignored.
pub fn load_config_with<F>(overrides: &Overrides, env: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());
    let parsed = |key: &str| lookup(key).and_then(|value| value.trim().parse::<u64>().ok());

    let api_base = overrides
        .api_base
        .clone()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| lookup(ENV_API_BASE))
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let project_limit = overrides
        .project_limit
        .or_else(|| parsed(ENV_PROJECT_LIMIT).map(|value| value as usize))
        .unwrap_or(DEFAULT_PROJECT_LIMIT);

    let probe_concurrency = overrides
        .probe_concurrency
        .or_else(|| parsed(ENV_PROBE_CONCURRENCY).map(|value| value as usize))
        .unwrap_or(DEFAULT_PROBE_CONCURRENCY)
        .max(1);

    let probe_deadline = overrides
        .probe_deadline_ms
        .or_else(|| parsed(ENV_PROBE_DEADLINE_MS))
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis);

    let http_timeout = Duration::from_secs(
        overrides
            .timeout_secs
            .or_else(|| parsed(ENV_HTTP_TIMEOUT_SECS))
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
    );

    let http_retries = overrides
        .retries
        .or_else(|| parsed(ENV_HTTP_RETRIES).map(|value| value.min(u32::MAX as u64) as u32))
        .unwrap_or(DEFAULT_HTTP_RETRIES);

    Config {
        api_base,
        project_limit,
        probe_concurrency,
        probe_deadline,
        http_timeout,
        http_retries,
    }
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Logs go nowhere unless `SIMDASH_LOG_STDERR` is set, so they never mix
/// with rendered output on stdout.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_enabled = std::env::var(ENV_LOG_STDERR)
        .ok()
        .and_then(|value| parse_bool_flag(&value))
        .unwrap_or(false);
    if stderr_enabled {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
