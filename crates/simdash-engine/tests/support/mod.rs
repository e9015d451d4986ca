#![allow(dead_code)]

use async_trait::async_trait;
use simdash_core::{Project, ReportCheck, ReportStatus, Simulation, SimulationStatus};
use simdash_engine::{SourceError, StatusSource};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn project(id: &str, name: &str) -> Project {
    Project::new(id, name)
}

pub fn ready_sim(id: &str, project_id: &str, updated_at: &str) -> Simulation {
    Simulation::new(id, project_id, SimulationStatus::Ready).with_updated_at(updated_at)
}

pub fn sim(id: &str, project_id: &str, status: SimulationStatus, updated_at: &str) -> Simulation {
    Simulation::new(id, project_id, status).with_updated_at(updated_at)
}

pub fn no_report() -> ReportCheck {
    ReportCheck::default()
}

pub fn generating(report_id: &str) -> ReportCheck {
    ReportCheck {
        has_report: true,
        report_id: Some(report_id.to_string()),
        report_status: Some(ReportStatus::Generating),
        interview_unlocked: false,
    }
}

pub fn completed(report_id: &str) -> ReportCheck {
    ReportCheck {
        has_report: true,
        report_id: Some(report_id.to_string()),
        report_status: Some(ReportStatus::Completed),
        interview_unlocked: true,
    }
}

/// In-memory backend with scripted answers and call recording.
pub struct ScriptedSource {
    projects: Mutex<Result<Vec<Project>, SourceError>>,
    simulations: Mutex<Result<Vec<Simulation>, SourceError>>,
    reports: Mutex<HashMap<String, Result<ReportCheck, SourceError>>>,
    hanging: HashSet<String>,
    probe_delay: Option<Duration>,
    probe_calls: Mutex<Vec<String>>,
    project_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    first_list_gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedSource {
    pub fn new(projects: Vec<Project>, simulations: Vec<Simulation>) -> Self {
        Self {
            projects: Mutex::new(Ok(projects)),
            simulations: Mutex::new(Ok(simulations)),
            reports: Mutex::new(HashMap::new()),
            hanging: HashSet::new(),
            probe_delay: None,
            probe_calls: Mutex::new(Vec::new()),
            project_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            first_list_gate: None,
        }
    }

    pub fn with_report(self, simulation_id: &str, check: ReportCheck) -> Self {
        self.set_report(simulation_id, Ok(check));
        self
    }

    pub fn with_probe_error(self, simulation_id: &str, err: SourceError) -> Self {
        self.set_report(simulation_id, Err(err));
        self
    }

    pub fn with_hanging_probe(mut self, simulation_id: &str) -> Self {
        self.hanging.insert(simulation_id.to_string());
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    /// First `list_projects` call notifies `entered` and waits for `release`.
    pub fn with_first_list_gate(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.first_list_gate = Some((entered, release));
        self
    }

    pub fn set_report(&self, simulation_id: &str, result: Result<ReportCheck, SourceError>) {
        self.reports
            .lock()
            .unwrap()
            .insert(simulation_id.to_string(), result);
    }

    pub fn fail_projects(&self, err: SourceError) {
        *self.projects.lock().unwrap() = Err(err);
    }

    pub fn set_projects(&self, projects: Vec<Project>) {
        *self.projects.lock().unwrap() = Ok(projects);
    }

    pub fn fail_simulations(&self, err: SourceError) {
        *self.simulations.lock().unwrap() = Err(err);
    }

    pub fn probe_calls(&self) -> Vec<String> {
        self.probe_calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn list_projects(&self, _limit: usize) -> Result<Vec<Project>, SourceError> {
        let call = self.project_calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            if let Some((entered, release)) = &self.first_list_gate {
                entered.notify_one();
                release.notified().await;
            }
        }
        self.projects.lock().unwrap().clone()
    }

    async fn list_simulations(&self) -> Result<Vec<Simulation>, SourceError> {
        self.simulations.lock().unwrap().clone()
    }

    async fn check_report_status(&self, simulation_id: &str) -> Result<ReportCheck, SourceError> {
        self.probe_calls
            .lock()
            .unwrap()
            .push(simulation_id.to_string());

        if self.hanging.contains(simulation_id) {
            std::future::pending::<()>().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        match self.probe_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.reports
            .lock()
            .unwrap()
            .get(simulation_id)
            .cloned()
            .unwrap_or_else(|| Ok(no_report()))
    }
}
