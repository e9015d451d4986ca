use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a simulation environment as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SimulationStatus {
    Created,
    Preparing,
    Ready,
    Running,
    Paused,
    Stopped,
    Completed,
    Failed,
    Other(String),
}

impl Default for SimulationStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl SimulationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SimulationStatus::Created => "created",
            SimulationStatus::Preparing => "preparing",
            SimulationStatus::Ready => "ready",
            SimulationStatus::Running => "running",
            SimulationStatus::Paused => "paused",
            SimulationStatus::Stopped => "stopped",
            SimulationStatus::Completed => "completed",
            SimulationStatus::Failed => "failed",
            SimulationStatus::Other(raw) => raw.as_str(),
        }
    }

    /// Statuses whose environment can be probed for a report and shown as ready.
    pub fn is_env_ready(&self) -> bool {
        matches!(
            self,
            SimulationStatus::Ready
                | SimulationStatus::Running
                | SimulationStatus::Paused
                | SimulationStatus::Stopped
                | SimulationStatus::Completed
        )
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationStatus {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "created" => SimulationStatus::Created,
            "preparing" => SimulationStatus::Preparing,
            "ready" => SimulationStatus::Ready,
            "running" => SimulationStatus::Running,
            "paused" => SimulationStatus::Paused,
            "stopped" => SimulationStatus::Stopped,
            "completed" => SimulationStatus::Completed,
            "failed" => SimulationStatus::Failed,
            _ => SimulationStatus::Other(input.to_string()),
        })
    }
}

impl From<String> for SimulationStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<SimulationStatus> for String {
    fn from(value: SimulationStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Generation state of a report attached to a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportStatus {
    Pending,
    Generating,
    Completed,
    Failed,
    Other(String),
}

impl ReportStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Generating => "generating",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
            ReportStatus::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "pending" => ReportStatus::Pending,
            "generating" | "in_progress" | "in-progress" => ReportStatus::Generating,
            "completed" | "complete" => ReportStatus::Completed,
            "failed" => ReportStatus::Failed,
            _ => ReportStatus::Other(input.to_string()),
        })
    }
}

impl From<String> for ReportStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<ReportStatus> for String {
    fn from(value: ReportStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Ok,
    Running,
    Bad,
    Neutral,
}

impl BadgeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeCategory::Ok => "ok",
            BadgeCategory::Running => "running",
            BadgeCategory::Bad => "bad",
            BadgeCategory::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBadge {
    pub label: String,
    pub category: BadgeCategory,
}

impl StatusBadge {
    fn new(label: impl Into<String>, category: BadgeCategory) -> Self {
        Self {
            label: label.into(),
            category,
        }
    }

    fn passthrough(raw: &str) -> Self {
        let trimmed = raw.trim();
        let label = if trimmed.is_empty() { "unknown" } else { trimmed };
        Self::new(label, BadgeCategory::Neutral)
    }
}

pub fn simulation_status_badge(status: &SimulationStatus) -> StatusBadge {
    match status {
        SimulationStatus::Created => StatusBadge::new("Created", BadgeCategory::Neutral),
        SimulationStatus::Preparing => StatusBadge::new("Preparing", BadgeCategory::Running),
        SimulationStatus::Ready => StatusBadge::new("Ready", BadgeCategory::Ok),
        SimulationStatus::Running => StatusBadge::new("Running", BadgeCategory::Running),
        SimulationStatus::Paused => StatusBadge::new("Paused", BadgeCategory::Neutral),
        SimulationStatus::Stopped => StatusBadge::new("Stopped", BadgeCategory::Neutral),
        SimulationStatus::Completed => StatusBadge::new("Completed", BadgeCategory::Ok),
        SimulationStatus::Failed => StatusBadge::new("Failed", BadgeCategory::Bad),
        SimulationStatus::Other(raw) => StatusBadge::passthrough(raw),
    }
}

pub fn report_status_badge(status: &ReportStatus) -> StatusBadge {
    match status {
        ReportStatus::Pending => StatusBadge::new("Pending", BadgeCategory::Neutral),
        ReportStatus::Generating => StatusBadge::new("Generating", BadgeCategory::Running),
        ReportStatus::Completed => StatusBadge::new("Completed", BadgeCategory::Ok),
        ReportStatus::Failed => StatusBadge::new("Failed", BadgeCategory::Bad),
        ReportStatus::Other(raw) => StatusBadge::passthrough(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_ready_set_matches_lifecycle_states() {
        let ready: Vec<&str> = ["ready", "running", "paused", "stopped", "completed"].to_vec();
        for raw in ready {
            let status: SimulationStatus = raw.parse().unwrap();
            assert!(status.is_env_ready(), "{raw} should be env-ready");
        }
        for raw in ["failed", "created", "preparing", "archived", ""] {
            let status: SimulationStatus = raw.parse().unwrap();
            assert!(!status.is_env_ready(), "{raw} should not be env-ready");
        }
    }

    #[test]
    fn status_parsing_is_case_insensitive_and_keeps_unknown_raw() {
        assert_eq!(
            " Running ".parse::<SimulationStatus>().unwrap(),
            SimulationStatus::Running
        );
        assert_eq!(
            "Archived".parse::<SimulationStatus>().unwrap(),
            SimulationStatus::Other("Archived".to_string())
        );
        assert_eq!(
            "COMPLETED".parse::<ReportStatus>().unwrap(),
            ReportStatus::Completed
        );
    }

    #[test]
    fn statuses_deserialize_from_plain_strings() {
        let status: SimulationStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, SimulationStatus::Paused);
        let report: ReportStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(report, ReportStatus::Other("queued".to_string()));
        assert_eq!(
            serde_json::to_string(&SimulationStatus::Stopped).unwrap(),
            "\"stopped\""
        );
    }

    #[test]
    fn badges_cover_known_values_and_fall_back_to_raw() {
        let badge = simulation_status_badge(&SimulationStatus::Failed);
        assert_eq!(badge.label, "Failed");
        assert_eq!(badge.category, BadgeCategory::Bad);

        let badge = simulation_status_badge(&SimulationStatus::Other("archived".to_string()));
        assert_eq!(badge.label, "archived");
        assert_eq!(badge.category, BadgeCategory::Neutral);

        let badge = report_status_badge(&ReportStatus::Generating);
        assert_eq!(badge.category, BadgeCategory::Running);

        let badge = report_status_badge(&ReportStatus::Other("  ".to_string()));
        assert_eq!(badge.label, "unknown");
        assert_eq!(badge.category, BadgeCategory::Neutral);
    }
}
