use crate::model::{Project, Simulation};
use crate::status::{ReportStatus, SimulationStatus};
use serde::{Deserialize, Serialize};

/// The slice of a simulation a project view carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub simulation_id: String,
    pub status: SimulationStatus,
    pub updated_at: Option<String>,
}

impl SimulationSummary {
    /// `None` when the record has no `simulation_id`.
    pub fn from_simulation(simulation: &Simulation) -> Option<Self> {
        Some(Self {
            simulation_id: simulation.simulation_id.clone()?,
            status: simulation.status.clone(),
            updated_at: simulation.display_timestamp(),
        })
    }
}

/// A report located by probing one simulation.
///
/// `updated_at` is the owning simulation's timestamp; the probe response
/// carries no time of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report_id: String,
    pub simulation_id: String,
    pub report_status: Option<ReportStatus>,
    pub interview_unlocked: bool,
    pub updated_at: Option<String>,
}

/// One project joined with its derived simulation and report state.
///
/// Built whole by the reconciler and never patched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub latest_ready_simulation: Option<SimulationSummary>,
    pub latest_report: Option<ReportSummary>,
    pub latest_completed_report: Option<ReportSummary>,
}

impl ProjectView {
    pub fn project_id(&self) -> &str {
        &self.project.project_id
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    pub fn has_ready_environment(&self) -> bool {
        self.latest_ready_simulation.is_some()
    }

    pub fn is_interactive(&self) -> bool {
        self.latest_completed_report.is_some()
    }

    /// Lowercased text the free-text filter matches against.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            self.project.name.as_str(),
            self.project.project_id.as_str(),
        ];
        if let Some(graph_id) = self.project.graph_id.as_deref() {
            parts.push(graph_id);
        }
        parts.push(self.project.simulation_requirement.as_str());
        if let Some(sim) = &self.latest_ready_simulation {
            parts.push(sim.simulation_id.as_str());
        }
        if let Some(report) = &self.latest_completed_report {
            parts.push(report.report_id.as_str());
        }
        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view() -> ProjectView {
        let mut project = Project::new("proj_A", "Rumor Lab");
        project.graph_id = Some("graph_9".to_string());
        project.simulation_requirement = "Predict Opinion drift".to_string();
        ProjectView {
            project,
            latest_ready_simulation: Some(SimulationSummary {
                simulation_id: "sim_7".to_string(),
                status: SimulationStatus::Ready,
                updated_at: None,
            }),
            latest_report: None,
            latest_completed_report: Some(ReportSummary {
                report_id: "report_X".to_string(),
                simulation_id: "sim_7".to_string(),
                report_status: Some(ReportStatus::Completed),
                interview_unlocked: true,
                updated_at: None,
            }),
        }
    }

    #[test]
    fn search_text_includes_ids_and_is_lowercase() {
        let text = view().search_text();
        assert_eq!(
            text,
            "rumor lab proj_a graph_9 predict opinion drift sim_7 report_x"
        );
    }

    #[test]
    fn search_text_skips_absent_fields() {
        let mut v = view();
        v.project.graph_id = None;
        v.latest_ready_simulation = None;
        v.latest_completed_report = None;
        assert_eq!(v.search_text(), "rumor lab proj_a predict opinion drift");
    }

    #[test]
    fn serialized_view_has_explicit_nulls_and_flat_project_fields() {
        let mut v = view();
        v.latest_completed_report = None;
        let value = serde_json::to_value(&v).unwrap();
        assert_eq!(value["project_id"], json!("proj_A"));
        assert_eq!(value["latest_report"], json!(null));
        assert_eq!(value["latest_completed_report"], json!(null));
        assert_eq!(value["latest_ready_simulation"]["simulation_id"], json!("sim_7"));
        assert!(value.as_object().unwrap().contains_key("latest_report"));
    }

    #[test]
    fn summary_requires_simulation_id() {
        let mut sim = Simulation::new("s1", "p1", SimulationStatus::Paused)
            .with_created_at("2024-03-01");
        let summary = SimulationSummary::from_simulation(&sim).unwrap();
        assert_eq!(summary.updated_at.as_deref(), Some("2024-03-01"));
        sim.simulation_id = None;
        assert!(SimulationSummary::from_simulation(&sim).is_none());
    }
}
