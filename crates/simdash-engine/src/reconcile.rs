use crate::indexer::SimulationIndex;
use crate::probe::ProjectProbe;
use simdash_core::{Project, ProjectView, SimulationSummary};
use std::collections::HashMap;

/// Joins base projects with the index and probe results, keeping project order.
///
/// Pure: no I/O, no shared state. Projects without a probe entry get no
/// report fields.
pub fn reconcile(
    projects: &[Project],
    index: &SimulationIndex,
    probes: &HashMap<String, ProjectProbe>,
) -> Vec<ProjectView> {
    projects
        .iter()
        .map(|project| {
            let project_id = project.project_id.as_str();
            let probe = probes.get(project_id);
            ProjectView {
                project: project.clone(),
                latest_ready_simulation: index
                    .latest_ready(project_id)
                    .and_then(SimulationSummary::from_simulation),
                latest_report: probe.and_then(|p| p.latest_report.clone()),
                latest_completed_report: probe.and_then(|p| p.latest_completed_report.clone()),
            }
        })
        .collect()
}
