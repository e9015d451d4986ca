//! Project status reconciliation.
//!
//! A refresh lists projects, lists simulations, indexes the env-ready
//! simulations per project, probes each project's candidates for a report on
//! a bounded pool of tasks, and publishes the merged [`ProjectView`]s as one
//! snapshot. Filtering and sorting run over the last published snapshot.
//!
//! [`ProjectView`]: simdash_core::ProjectView

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod filter;
pub mod indexer;
pub mod probe;
pub mod reconcile;
pub mod source;

pub use diagnostics::{ProbeFailure, RefreshDiagnostics};
pub use engine::{
    Engine, EngineConfig, RefreshReport, Snapshot, DEFAULT_PROBE_CONCURRENCY,
    DEFAULT_PROJECT_LIMIT,
};
pub use error::RefreshError;
pub use filter::{apply_filter, run_query, sort_views, DisplayMode, SortMode, ViewQuery};
pub use indexer::{index_simulations, SimulationIndex};
pub use probe::{probe_project, ProjectProbe};
pub use reconcile::reconcile;
pub use source::{FoundReport, ProbeOutcome, SourceError, StatusSource};
