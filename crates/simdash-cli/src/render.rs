use chrono::{DateTime, Utc};
use serde::Serialize;
use simdash_core::{
    report_status_badge, simulation_status_badge, BadgeCategory, ProjectView, ReportStatus,
    StatusBadge,
};
use simdash_engine::{
    DisplayMode, ProbeOutcome, RefreshDiagnostics, RefreshError, Snapshot, SortMode,
};

const NAME_WIDTH: usize = 28;
const ID_WIDTH: usize = 18;

#[derive(Serialize)]
pub struct ListOutput<'a> {
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub mode: DisplayMode,
    pub query: &'a str,
    pub sort: SortMode,
    pub total: usize,
    pub views: &'a [ProjectView],
    pub diagnostics: &'a RefreshDiagnostics,
}

pub fn category_marker(category: BadgeCategory) -> &'static str {
    match category {
        BadgeCategory::Ok => "●",
        BadgeCategory::Running => "◐",
        BadgeCategory::Bad => "✕",
        BadgeCategory::Neutral => "○",
    }
}

fn chip(badge: &StatusBadge) -> String {
    format!("{} {}", category_marker(badge.category), badge.label)
}

fn env_cell(view: &ProjectView) -> String {
    match &view.latest_ready_simulation {
        Some(sim) => format!(
            "{} {}",
            chip(&simulation_status_badge(&sim.status)),
            ellipsize(&sim.simulation_id, ID_WIDTH)
        ),
        None => "○ no env".to_string(),
    }
}

fn report_cell(view: &ProjectView) -> String {
    if let Some(report) = &view.latest_completed_report {
        return format!(
            "{} {} [interview]",
            chip(&report_status_badge(
                report.report_status.as_ref().unwrap_or(&ReportStatus::Completed)
            )),
            ellipsize(&report.report_id, ID_WIDTH)
        );
    }
    match &view.latest_report {
        Some(report) => {
            let badge = report
                .report_status
                .as_ref()
                .map(report_status_badge)
                .unwrap_or_else(|| StatusBadge {
                    label: "report".to_string(),
                    category: BadgeCategory::Neutral,
                });
            format!("{} {}", chip(&badge), ellipsize(&report.report_id, ID_WIDTH))
        }
        None => "○ no report".to_string(),
    }
}

pub fn view_line(view: &ProjectView) -> String {
    format!(
        "{:<name$}  {:<id$}  {:<36}  {}",
        ellipsize(view.name(), NAME_WIDTH),
        ellipsize(view.project_id(), ID_WIDTH),
        env_cell(view),
        report_cell(view),
        name = NAME_WIDTH,
        id = ID_WIDTH,
    )
}

pub fn render_list(
    views: &[ProjectView],
    snapshot: &Snapshot,
    mode: DisplayMode,
    query: &str,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(views.len() + 3);
    let query_note = if query.trim().is_empty() {
        String::new()
    } else {
        format!(" query=\"{}\"", query.trim())
    };
    lines.push(format!(
        "projects {}/{} mode={}{}",
        views.len(),
        snapshot.views.len(),
        mode.label(),
        query_note
    ));
    if views.is_empty() {
        lines.push("  (no matching projects)".to_string());
    }
    for view in views {
        lines.push(view_line(view));
    }
    lines.push(render_footer(snapshot));
    lines
}

pub fn render_footer(snapshot: &Snapshot) -> String {
    let at = snapshot
        .refreshed_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "-- refreshed {at} gen={} {}",
        snapshot.generation,
        snapshot.diagnostics.summary()
    )
}

pub fn render_error_panel(err: &RefreshError, retry_hint: &str) -> Vec<String> {
    let mut lines = vec![
        "!! could not load projects".to_string(),
        format!("   {err}"),
    ];
    if err.is_retryable() {
        lines.push(format!("   {retry_hint}"));
    }
    lines
}

pub fn render_probe(simulation_id: &str, outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Found(found) => {
            let badge = found
                .status
                .as_ref()
                .map(report_status_badge)
                .unwrap_or_else(|| StatusBadge {
                    label: "report".to_string(),
                    category: BadgeCategory::Neutral,
                });
            format!(
                "{simulation_id}: {} report={} {} interview={}",
                outcome.label(),
                found.report_id,
                chip(&badge),
                if found.unlocked { "unlocked" } else { "locked" }
            )
        }
        ProbeOutcome::NotFound => format!("{simulation_id}: no report"),
        ProbeOutcome::Error(err) => format!("{simulation_id}: probe failed: {err}"),
    }
}

pub fn ellipsize(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    if max <= 3 {
        return ".".repeat(max);
    }
    let mut out: String = input.chars().take(max - 3).collect();
    out.push_str("...");
    out
}
