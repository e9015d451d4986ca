use crate::diagnostics::ProbeFailure;
use crate::source::{FoundReport, ProbeOutcome, StatusSource};
use simdash_core::{ReportSummary, Simulation};
use tracing::{debug, warn};

/// What one project's candidate scan produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectProbe {
    pub latest_report: Option<ReportSummary>,
    pub latest_completed_report: Option<ReportSummary>,
    pub probes_issued: usize,
    pub short_circuited: bool,
    pub failures: Vec<ProbeFailure>,
}

fn summarize(found: &FoundReport, simulation_id: &str, simulation: &Simulation) -> ReportSummary {
    ReportSummary {
        report_id: found.report_id.clone(),
        simulation_id: simulation_id.to_string(),
        report_status: found.status.clone(),
        interview_unlocked: found.unlocked,
        updated_at: simulation.display_timestamp(),
    }
}

/// Walks `candidates` in order, one probe at a time.
///
/// The first found report becomes `latest_report`. The first unlocked report
/// becomes `latest_completed_report` and ends the scan. Probe errors are
/// recorded and the scan moves on.
pub async fn probe_project<S>(
    source: &S,
    project_id: &str,
    candidates: &[Simulation],
) -> ProjectProbe
where
    S: StatusSource + ?Sized,
{
    let mut result = ProjectProbe::default();

    for simulation in candidates {
        let Some(simulation_id) = simulation.simulation_id.as_deref() else {
            continue;
        };
        result.probes_issued += 1;
        let outcome =
            ProbeOutcome::from_result(source.check_report_status(simulation_id).await);

        match outcome {
            ProbeOutcome::Found(found) => {
                let summary = summarize(&found, simulation_id, simulation);
                if result.latest_report.is_none() {
                    result.latest_report = Some(summary.clone());
                }
                if found.unlocked {
                    debug!(
                        "probe_short_circuit: project={project_id} simulation={simulation_id} report={}",
                        found.report_id
                    );
                    result.latest_completed_report = Some(summary);
                    result.short_circuited = true;
                    break;
                }
            }
            ProbeOutcome::NotFound => {}
            ProbeOutcome::Error(err) => {
                warn!("probe_error: project={project_id} simulation={simulation_id} error={err}");
                result
                    .failures
                    .push(ProbeFailure::new(project_id, simulation_id, &err));
            }
        }
    }

    result
}
