mod config;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{init_logging, load_config, Config, Overrides};
use render::{render_error_panel, render_list, render_probe, ListOutput};
use simdash_client::HttpStatusSource;
use simdash_core::ProjectView;
use simdash_engine::{
    DisplayMode, Engine, ProbeOutcome, RefreshError, RefreshReport, Snapshot, SortMode,
    StatusSource, ViewQuery,
};
use std::future::{pending, Future};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "simdash")]
#[command(about = "Project status dashboard for the simulation backend", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Maximum projects to request per refresh
    #[arg(long, global = true)]
    limit: Option<usize>,
    /// Per-project probe chains allowed in flight
    #[arg(long, global = true)]
    probe_concurrency: Option<usize>,
    /// Abort probe chains after this many milliseconds (0 = never)
    #[arg(long, global = true)]
    probe_deadline_ms: Option<u64>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[arg(long, global = true)]
    retries: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh once and print the project list
    List(ViewArgs),
    /// Refresh on an interval until interrupted
    Watch {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
    },
    /// Check the report status of a single simulation
    Probe {
        simulation_id: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Clone)]
struct ViewArgs {
    /// all, env or interactive
    #[arg(long, default_value = "all")]
    mode: DisplayMode,
    #[arg(long, default_value = "")]
    query: String,
    /// fetch, updated or name
    #[arg(long, default_value = "fetch")]
    sort: SortMode,
    #[arg(long)]
    json: bool,
}

impl ViewArgs {
    fn view_query(&self) -> ViewQuery {
        ViewQuery::new(self.mode, self.query.clone()).with_sort(self.sort)
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_base: self.api_base.clone(),
            project_limit: self.limit,
            probe_concurrency: self.probe_concurrency,
            probe_deadline_ms: self.probe_deadline_ms,
            timeout_secs: self.timeout_secs,
            retries: self.retries,
        }
    }
}

const LIST_RETRY_HINT: &str = "run `simdash list` again once the backend is reachable";
const WATCH_RETRY_HINT: &str = "retrying on next tick";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli.overrides());
    info!(
        "simdash_start: api_base={} limit={} concurrency={}",
        config.api_base, config.project_limit, config.probe_concurrency
    );

    let succeeded = match cli.command {
        Commands::List(view) => run_list(&config, &view).await?,
        Commands::Watch {
            view,
            interval_secs,
        } => {
            run_watch(&config, &view, interval_secs).await?;
            true
        }
        Commands::Probe {
            simulation_id,
            json,
        } => run_probe(&config, &simulation_id, json).await?,
    };
    if !succeeded {
        // The failure was already rendered; only the exit status is left.
        std::process::exit(1);
    }
    Ok(())
}

fn build_source(config: &Config) -> Result<HttpStatusSource> {
    HttpStatusSource::new(config.client())
        .with_context(|| format!("invalid api base url {:?}", config.api_base))
}

fn build_engine(config: &Config) -> Result<Engine<HttpStatusSource>> {
    let source = Arc::new(build_source(config)?);
    Ok(Engine::new(source, config.engine()))
}

async fn run_list(config: &Config, view: &ViewArgs) -> Result<bool> {
    let engine = build_engine(config)?;
    list_once(&engine, view, &mut io::stdout(), &mut io::stderr()).await
}

/// Refreshes once and renders the result. Returns `false` after a fatal
/// load has been reported on `err_out`.
async fn list_once<S, O, E>(
    engine: &Engine<S>,
    view: &ViewArgs,
    out: &mut O,
    err_out: &mut E,
) -> Result<bool>
where
    S: StatusSource + 'static,
    O: Write,
    E: Write,
{
    if let Err(err) = engine.refresh().await {
        for line in render_error_panel(&err, LIST_RETRY_HINT) {
            writeln!(err_out, "{line}")?;
        }
        return Ok(false);
    }
    let snapshot = engine.snapshot();
    let views = engine.query(&view.view_query());
    write_views(out, &snapshot, &views, view)?;
    Ok(true)
}

async fn run_watch(config: &Config, view: &ViewArgs, interval_secs: u64) -> Result<()> {
    let engine = build_engine(config)?;
    let query = view.view_query();
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("ctrl_c_unavailable: error={err}");
            pending::<()>().await;
        }
    };
    let mut stdout = io::stdout();
    let cycles = watch_loop(
        &engine,
        Duration::from_secs(interval_secs.max(1)),
        shutdown,
        |outcome| render_watch_tick(&engine, &query, view, outcome, &mut stdout),
    )
    .await?;
    info!("watch_stop: reason=ctrl_c cycles={cycles}");
    Ok(())
}

/// Refreshes on every tick until `shutdown` resolves, including while a
/// refresh is still in flight. Returns the number of completed cycles.
async fn watch_loop<S, F, R>(
    engine: &Engine<S>,
    period: Duration,
    shutdown: F,
    mut on_refresh: R,
) -> Result<u64>
where
    S: StatusSource + 'static,
    F: Future<Output = ()>,
    R: FnMut(&Result<RefreshReport, RefreshError>) -> Result<()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    let mut cycles = 0u64;

    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(cycles),
            _ = ticker.tick() => {
                let outcome = tokio::select! {
                    _ = &mut shutdown => {
                        info!("watch_refresh_interrupted: cycles={cycles}");
                        return Ok(cycles);
                    }
                    outcome = engine.refresh() => outcome,
                };
                cycles += 1;
                on_refresh(&outcome)?;
            }
        }
    }
}

/// A failed tick shows the error panel and, once something has loaded, the
/// previous snapshot under it.
fn render_watch_tick<S, W>(
    engine: &Engine<S>,
    query: &ViewQuery,
    view: &ViewArgs,
    outcome: &Result<RefreshReport, RefreshError>,
    out: &mut W,
) -> Result<()>
where
    S: StatusSource + 'static,
    W: Write,
{
    let snapshot = engine.snapshot();
    if let Err(err) = outcome {
        warn!("watch_refresh_failed: error={err}");
        for line in render_error_panel(err, WATCH_RETRY_HINT) {
            writeln!(out, "{line}")?;
        }
        if !snapshot.is_loaded() {
            return Ok(());
        }
    }
    let views = engine.query(query);
    write_views(out, &snapshot, &views, view)
}

async fn run_probe(config: &Config, simulation_id: &str, json: bool) -> Result<bool> {
    let source = build_source(config)?;
    let outcome = ProbeOutcome::from_result(source.check_report_status(simulation_id).await);
    let mut stdout = io::stdout();
    if json {
        let payload = probe_json(simulation_id, &outcome);
        let encoded =
            serde_json::to_string_pretty(&payload).context("failed to encode probe result")?;
        writeln!(stdout, "{encoded}")?;
    } else {
        writeln!(stdout, "{}", render_probe(simulation_id, &outcome))?;
    }
    Ok(!matches!(outcome, ProbeOutcome::Error(_)))
}

fn probe_json(simulation_id: &str, outcome: &ProbeOutcome) -> serde_json::Value {
    match outcome {
        ProbeOutcome::Found(found) => serde_json::json!({
            "simulation_id": simulation_id,
            "outcome": outcome.label(),
            "report_id": found.report_id,
            "report_status": found.status.as_ref().map(|status| status.as_str().to_string()),
            "interview_unlocked": found.unlocked,
        }),
        ProbeOutcome::NotFound => serde_json::json!({
            "simulation_id": simulation_id,
            "outcome": outcome.label(),
        }),
        ProbeOutcome::Error(err) => serde_json::json!({
            "simulation_id": simulation_id,
            "outcome": outcome.label(),
            "error": err.to_string(),
        }),
    }
}

fn write_views<W: Write>(
    out: &mut W,
    snapshot: &Snapshot,
    views: &[ProjectView],
    view: &ViewArgs,
) -> Result<()> {
    if view.json {
        let output = ListOutput {
            generation: snapshot.generation,
            refreshed_at: snapshot.refreshed_at,
            mode: view.mode,
            query: view.query.trim(),
            sort: view.sort,
            total: snapshot.views.len(),
            views,
            diagnostics: &snapshot.diagnostics,
        };
        let encoded =
            serde_json::to_string_pretty(&output).context("failed to encode project list")?;
        writeln!(out, "{encoded}")?;
        return Ok(());
    }
    for line in render_list(views, snapshot, view.mode, &view.query) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
