use simdash_core::Simulation;
use std::collections::HashMap;

/// Per-project lookup over the env-ready simulations of one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationIndex {
    candidates: HashMap<String, Vec<Simulation>>,
    latest_ready: HashMap<String, Simulation>,
}

impl SimulationIndex {
    /// Probe candidates for a project, newest first.
    pub fn candidates(&self, project_id: &str) -> &[Simulation] {
        self.candidates
            .get(project_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn latest_ready(&self, project_id: &str) -> Option<&Simulation> {
        self.latest_ready.get(project_id)
    }

    pub fn project_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Groups env-ready simulations by project.
///
/// Records with a non-ready status or without `simulation_id`/`project_id`
/// are skipped. Candidate lists are sorted by timestamp descending with
/// input order kept on ties; the latest-ready pick replaces on `>=`, so the
/// later record in input order wins a tie.
pub fn index_simulations(simulations: &[Simulation]) -> SimulationIndex {
    let mut index = SimulationIndex::default();

    for simulation in simulations {
        if !simulation.status.is_env_ready() || simulation.simulation_id.is_none() {
            continue;
        }
        let Some(project_id) = simulation.project_id.as_deref() else {
            continue;
        };

        index
            .candidates
            .entry(project_id.to_string())
            .or_default()
            .push(simulation.clone());

        let ts = simulation.timestamp_ms();
        let replace = match index.latest_ready.get(project_id) {
            Some(current) => ts >= current.timestamp_ms(),
            None => true,
        };
        if replace {
            index
                .latest_ready
                .insert(project_id.to_string(), simulation.clone());
        }
    }

    for list in index.candidates.values_mut() {
        list.sort_by_key(|simulation| std::cmp::Reverse(simulation.timestamp_ms()));
    }

    index
}
