use crate::source::SourceError;
use serde::Serialize;

/// A probe error the engine absorbed instead of surfacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub project_id: String,
    pub simulation_id: String,
    pub error: String,
}

impl ProbeFailure {
    pub fn new(project_id: &str, simulation_id: &str, error: &SourceError) -> Self {
        Self {
            project_id: project_id.to_string(),
            simulation_id: simulation_id.to_string(),
            error: error.to_string(),
        }
    }
}

/// Counters for everything one refresh cycle swallowed or cut short.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshDiagnostics {
    pub projects: usize,
    pub simulations: usize,
    pub simulations_degraded: Option<String>,
    pub projects_probed: usize,
    pub probes_issued: usize,
    pub probes_short_circuited: usize,
    pub probe_failures: Vec<ProbeFailure>,
    pub probe_chains_timed_out: Vec<String>,
    pub probe_chains_panicked: usize,
}

impl RefreshDiagnostics {
    pub fn probe_error_count(&self) -> usize {
        self.probe_failures.len()
    }

    pub fn is_degraded(&self) -> bool {
        self.simulations_degraded.is_some()
            || !self.probe_failures.is_empty()
            || !self.probe_chains_timed_out.is_empty()
            || self.probe_chains_panicked > 0
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("projects={}", self.projects),
            format!("simulations={}", self.simulations),
            format!("probes={}", self.probes_issued),
            format!("short_circuits={}", self.probes_short_circuited),
        ];
        if self.simulations_degraded.is_some() {
            parts.push("simulations=degraded".to_string());
        }
        if !self.probe_failures.is_empty() {
            parts.push(format!("probe_errors={}", self.probe_failures.len()));
        }
        if !self.probe_chains_timed_out.is_empty() {
            parts.push(format!("timed_out={}", self.probe_chains_timed_out.len()));
        }
        if self.probe_chains_panicked > 0 {
            parts.push(format!("panicked={}", self.probe_chains_panicked));
        }
        parts.join(" ")
    }
}
