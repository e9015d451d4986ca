use serde::{Deserialize, Serialize};
use simdash_core::ProjectView;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    All,
    Env,
    Interactive,
}

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::All => "all",
            DisplayMode::Env => "env",
            DisplayMode::Interactive => "interactive",
        }
    }

    pub fn next(self) -> Self {
        match self {
            DisplayMode::All => DisplayMode::Env,
            DisplayMode::Env => DisplayMode::Interactive,
            DisplayMode::Interactive => DisplayMode::All,
        }
    }

    pub fn matches(self, view: &ProjectView) -> bool {
        match self {
            DisplayMode::All => true,
            DisplayMode::Env => view.has_ready_environment(),
            DisplayMode::Interactive => view.is_interactive(),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "all" => Ok(DisplayMode::All),
            "env" | "ready" => Ok(DisplayMode::Env),
            "interactive" | "interview" => Ok(DisplayMode::Interactive),
            other => Err(format!("Unknown display mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Fetch,
    Updated,
    Name,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Fetch => "fetch",
            SortMode::Updated => "updated",
            SortMode::Name => "name",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortMode::Fetch => SortMode::Updated,
            SortMode::Updated => SortMode::Name,
            SortMode::Name => SortMode::Fetch,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "fetch" | "default" => Ok(SortMode::Fetch),
            "updated" | "recent" => Ok(SortMode::Updated),
            "name" => Ok(SortMode::Name),
            other => Err(format!("Unknown sort mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub mode: DisplayMode,
    pub query: String,
    pub sort: SortMode,
}

impl ViewQuery {
    pub fn new(mode: DisplayMode, query: impl Into<String>) -> Self {
        Self {
            mode,
            query: query.into(),
            sort: SortMode::Fetch,
        }
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }
}

/// Mode filter, then substring match on the normalized query.
///
/// Surviving views keep their input order.
pub fn apply_filter<'a>(
    views: &'a [ProjectView],
    mode: DisplayMode,
    query: &str,
) -> Vec<&'a ProjectView> {
    let needle = query.trim().to_lowercase();
    views
        .iter()
        .filter(|view| mode.matches(view))
        .filter(|view| needle.is_empty() || view.search_text().contains(&needle))
        .collect()
}

/// Stable sort; `Fetch` leaves the order untouched.
pub fn sort_views(views: &mut [&ProjectView], sort: SortMode) {
    match sort {
        SortMode::Fetch => {}
        SortMode::Updated => {
            views.sort_by_key(|view| std::cmp::Reverse(view.project.timestamp_ms()));
        }
        SortMode::Name => {
            views.sort_by_cached_key(|view| view.name().to_lowercase());
        }
    }
}

pub fn run_query<'a>(views: &'a [ProjectView], query: &ViewQuery) -> Vec<&'a ProjectView> {
    let mut selected = apply_filter(views, query.mode, &query.query);
    sort_views(&mut selected, query.sort);
    selected
}
