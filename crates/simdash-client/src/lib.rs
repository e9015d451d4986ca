//! HTTP implementation of [`StatusSource`] for the simulation backend.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use simdash_core::{decode_records, ApiEnvelope, Project, ReportCheck, Simulation};
use simdash_engine::{SourceError, StatusSource};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://localhost:5001";
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

pub struct HttpStatusSource {
    agent: ureq::Agent,
    config: ClientConfig,
    base: Url,
}

impl HttpStatusSource {
    /// Fails when `base_url` is not an absolute URL that can carry a path.
    pub fn new(config: ClientConfig) -> Result<Self, url::ParseError> {
        let base = Url::parse(config.base_url.trim())?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();
        Ok(Self {
            agent: ureq::Agent::new_with_config(agent_config),
            config,
            base,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn projects_url(&self, limit: usize) -> Url {
        let mut url = self.endpoint(&["api", "graph", "project", "list"]);
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        url
    }

    pub fn simulations_url(&self) -> Url {
        self.endpoint(&["api", "simulation", "list"])
    }

    pub fn report_check_url(&self, simulation_id: &str) -> Url {
        self.endpoint(&["api", "report", "check", simulation_id])
    }

    /// Appends segments to the base path; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET with retry on transient failures. An explicit `success: false`
    /// becomes [`SourceError::Rejected`].
    async fn fetch<T>(&self, url: Url) -> Result<Option<T>, SourceError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 0u32;
        loop {
            let agent = self.agent.clone();
            let request_url = url.to_string();
            let result =
                tokio::task::spawn_blocking(move || get_envelope::<T>(&agent, &request_url))
                    .await
                    .map_err(|err| SourceError::Join(err.to_string()))
                    .and_then(|inner| inner);

            match result {
                Ok(envelope) => {
                    debug!("http_ok: url={url} attempt={attempt}");
                    return envelope.into_result().map_err(SourceError::Rejected);
                }
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!("http_retry: url={url} attempt={attempt} error={err}");
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn list_projects(&self, limit: usize) -> Result<Vec<Project>, SourceError> {
        let values = self
            .fetch::<Vec<Value>>(self.projects_url(limit))
            .await?
            .unwrap_or_default();
        Ok(decode_list("project", values))
    }

    async fn list_simulations(&self) -> Result<Vec<Simulation>, SourceError> {
        let values = self
            .fetch::<Vec<Value>>(self.simulations_url())
            .await?
            .unwrap_or_default();
        Ok(decode_list("simulation", values))
    }

    async fn check_report_status(&self, simulation_id: &str) -> Result<ReportCheck, SourceError> {
        Ok(self
            .fetch::<ReportCheck>(self.report_check_url(simulation_id))
            .await?
            .unwrap_or_default())
    }
}

/// Malformed elements are logged and dropped; the rest of the list survives.
fn decode_list<T>(kind: &str, values: Vec<Value>) -> Vec<T>
where
    T: DeserializeOwned,
{
    let (records, skipped) = decode_records::<T>(values);
    for record in &skipped {
        warn!(
            "record_skipped: kind={kind} index={} error={}",
            record.index, record.reason
        );
    }
    records
}

fn get_envelope<T>(agent: &ureq::Agent, url: &str) -> Result<ApiEnvelope<T>, SourceError>
where
    T: DeserializeOwned,
{
    let response = agent
        .get(url)
        .header("Accept", "application/json")
        .call()
        .map_err(classify_error)?;
    response
        .into_body()
        .read_json::<ApiEnvelope<T>>()
        .map_err(|err| SourceError::Decode(err.to_string()))
}

fn classify_error(err: ureq::Error) -> SourceError {
    match err {
        ureq::Error::StatusCode(code) => SourceError::Status { code },
        other => SourceError::Transport(other.to_string()),
    }
}

fn next_backoff(current: Duration) -> Duration {
    let next = current + current;
    if next > MAX_BACKOFF {
        MAX_BACKOFF
    } else {
        next
    }
}
