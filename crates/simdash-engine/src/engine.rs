use crate::diagnostics::RefreshDiagnostics;
use crate::error::RefreshError;
use crate::filter::{run_query, DisplayMode, ViewQuery};
use crate::indexer::{index_simulations, SimulationIndex};
use crate::probe::{probe_project, ProjectProbe};
use crate::reconcile::reconcile;
use crate::source::StatusSource;
use chrono::{DateTime, Utc};
use simdash_core::{Project, ProjectView};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

pub const DEFAULT_PROJECT_LIMIT: usize = 50;
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub project_limit: usize,
    /// Upper bound on per-project probe chains in flight; clamped to at least 1.
    pub probe_concurrency: usize,
    /// Chains still running when this elapses are aborted.
    pub probe_deadline: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            project_limit: DEFAULT_PROJECT_LIMIT,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            probe_deadline: None,
        }
    }
}

/// The published result of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub views: Vec<ProjectView>,
    pub diagnostics: RefreshDiagnostics,
}

impl Snapshot {
    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub generation: u64,
    /// False when a newer cycle had already published by the time this one finished.
    pub published: bool,
    pub project_count: usize,
    pub elapsed: Duration,
    pub diagnostics: RefreshDiagnostics,
}

pub struct Engine<S> {
    source: Arc<S>,
    config: EngineConfig,
    next_generation: AtomicU64,
    published: watch::Sender<Arc<Snapshot>>,
}

impl<S> Engine<S>
where
    S: StatusSource + 'static,
{
    pub fn new(source: Arc<S>, config: EngineConfig) -> Self {
        let (published, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            source,
            config,
            next_generation: AtomicU64::new(0),
            published,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.published.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.published.subscribe()
    }

    /// Fetches all three collections and replaces the published snapshot.
    ///
    /// Only a failed project list aborts the cycle. If a newer cycle has
    /// already published, this cycle's result is dropped.
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        let projects = self
            .source
            .list_projects(self.config.project_limit)
            .await
            .map_err(|err| {
                warn!("project_list_error: generation={generation} error={err}");
                RefreshError::Load(err)
            })?;

        let mut diagnostics = RefreshDiagnostics {
            projects: projects.len(),
            ..Default::default()
        };

        let simulations = match self.source.list_simulations().await {
            Ok(simulations) => simulations,
            Err(err) => {
                warn!("simulation_list_degraded: generation={generation} error={err}");
                diagnostics.simulations_degraded = Some(err.to_string());
                Vec::new()
            }
        };
        diagnostics.simulations = simulations.len();

        let index = index_simulations(&simulations);
        let probes = self.probe_all(&projects, &index, &mut diagnostics).await;
        let views = reconcile(&projects, &index, &probes);

        let project_count = views.len();
        let published = self.publish(Snapshot {
            generation,
            refreshed_at: Some(Utc::now()),
            views,
            diagnostics: diagnostics.clone(),
        });
        let elapsed = started.elapsed();

        if published {
            info!(
                "refresh_published: generation={generation} elapsed_ms={} {}",
                elapsed.as_millis(),
                diagnostics.summary()
            );
        } else {
            info!("refresh_superseded: generation={generation}");
        }

        Ok(RefreshReport {
            generation,
            published,
            project_count,
            elapsed,
            diagnostics,
        })
    }

    /// Filters the last published views. No I/O.
    pub fn apply_filter(&self, mode: DisplayMode, query: &str) -> Vec<ProjectView> {
        self.query(&ViewQuery::new(mode, query))
    }

    pub fn query(&self, query: &ViewQuery) -> Vec<ProjectView> {
        let snapshot = self.snapshot();
        run_query(&snapshot.views, query)
            .into_iter()
            .cloned()
            .collect()
    }

    fn publish(&self, snapshot: Snapshot) -> bool {
        self.published.send_if_modified(move |current| {
            if snapshot.generation <= current.generation {
                return false;
            }
            *current = Arc::new(snapshot);
            true
        })
    }

    async fn probe_all(
        &self,
        projects: &[Project],
        index: &SimulationIndex,
        diagnostics: &mut RefreshDiagnostics,
    ) -> HashMap<String, ProjectProbe> {
        let permits = Arc::new(Semaphore::new(self.config.probe_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut spawned = HashSet::new();

        for project in projects {
            let candidates = index.candidates(&project.project_id);
            if candidates.is_empty() || !spawned.insert(project.project_id.clone()) {
                continue;
            }
            let candidates = candidates.to_vec();
            let project_id = project.project_id.clone();
            let source = Arc::clone(&self.source);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (project_id, ProjectProbe::default());
                };
                let probe = probe_project(source.as_ref(), &project_id, &candidates).await;
                (project_id, probe)
            });
        }

        let deadline = self
            .config
            .probe_deadline
            .map(|limit| tokio::time::Instant::now() + limit);
        let mut results = HashMap::with_capacity(spawned.len());
        let mut deadline_hit = false;

        loop {
            let joined = match deadline {
                Some(at) => match tokio::time::timeout_at(at, tasks.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        deadline_hit = true;
                        drain_finished(&mut tasks, &mut results, diagnostics);
                        tasks.shutdown().await;
                        break;
                    }
                },
                None => tasks.join_next().await,
            };
            let Some(joined) = joined else {
                break;
            };
            record_chain(joined, &mut results, diagnostics);
        }

        let mut tallied = HashSet::new();
        for project in projects {
            let project_id = project.project_id.as_str();
            if !tallied.insert(project_id) {
                continue;
            }
            match results.get(project_id) {
                Some(probe) => {
                    diagnostics
                        .probe_failures
                        .extend(probe.failures.iter().cloned());
                    diagnostics.probes_issued += probe.probes_issued;
                    diagnostics.projects_probed += 1;
                    if probe.short_circuited {
                        diagnostics.probes_short_circuited += 1;
                    }
                }
                None if deadline_hit && spawned.contains(project_id) => {
                    warn!("probe_chain_timeout: project={project_id}");
                    diagnostics
                        .probe_chains_timed_out
                        .push(project_id.to_string());
                }
                None => {}
            }
        }

        results
    }
}

type ChainResult = (String, ProjectProbe);

fn record_chain(
    joined: Result<ChainResult, JoinError>,
    results: &mut HashMap<String, ProjectProbe>,
    diagnostics: &mut RefreshDiagnostics,
) {
    match joined {
        Ok((project_id, probe)) => {
            debug!(
                "probe_chain_done: project={project_id} probes={} completed={}",
                probe.probes_issued,
                probe.latest_completed_report.is_some()
            );
            results.insert(project_id, probe);
        }
        Err(err) => {
            warn!("probe_chain_join_error: {err}");
            diagnostics.probe_chains_panicked += 1;
        }
    }
}

/// Collects chains that already finished without waiting on the rest.
fn drain_finished(
    tasks: &mut JoinSet<ChainResult>,
    results: &mut HashMap<String, ProjectProbe>,
    diagnostics: &mut RefreshDiagnostics,
) {
    while let Some(joined) = tasks.try_join_next() {
        record_chain(joined, results, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn finished_chains_survive_a_deadline_shutdown() {
        let mut tasks: JoinSet<ChainResult> = JoinSet::new();
        tasks.spawn(async {
            (
                "p_done".to_string(),
                ProjectProbe {
                    probes_issued: 1,
                    ..ProjectProbe::default()
                },
            )
        });
        tasks.spawn(async {
            pending::<()>().await;
            ("p_stuck".to_string(), ProjectProbe::default())
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut results = HashMap::new();
        let mut diagnostics = RefreshDiagnostics::default();
        drain_finished(&mut tasks, &mut results, &mut diagnostics);
        tasks.shutdown().await;

        assert_eq!(results.len(), 1);
        assert_eq!(results["p_done"].probes_issued, 1);
        assert!(!results.contains_key("p_stuck"));
        assert_eq!(diagnostics.probe_chains_panicked, 0);
    }

    #[tokio::test]
    async fn panicked_chains_are_counted_not_recorded() {
        let mut tasks: JoinSet<ChainResult> = JoinSet::new();
        tasks.spawn(async {
            let chain: Option<ChainResult> = None;
            chain.expect("chain blew up")
        });
        let joined = tasks.join_next().await.expect("one task");

        let mut results = HashMap::new();
        let mut diagnostics = RefreshDiagnostics::default();
        record_chain(joined, &mut results, &mut diagnostics);

        assert!(results.is_empty());
        assert_eq!(diagnostics.probe_chains_panicked, 1);
    }
}
