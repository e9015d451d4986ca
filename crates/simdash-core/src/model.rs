use crate::status::{ReportStatus, SimulationStatus};
use crate::time::record_timestamp_ms;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "deserialize_id")]
    pub project_id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub simulation_requirement: String,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub graph_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub updated_at: Option<String>,
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Project {
    pub fn new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
            simulation_requirement: String::new(),
            graph_id: None,
            created_at: None,
            updated_at: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        record_timestamp_ms(self.updated_at.as_deref(), self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub simulation_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: SimulationStatus,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub updated_at: Option<String>,
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Simulation {
    pub fn new(
        simulation_id: impl Into<String>,
        project_id: impl Into<String>,
        status: SimulationStatus,
    ) -> Self {
        Self {
            simulation_id: Some(simulation_id.into()),
            project_id: Some(project_id.into()),
            status,
            created_at: None,
            updated_at: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn timestamp_ms(&self) -> i64 {
        record_timestamp_ms(self.updated_at.as_deref(), self.created_at.as_deref())
    }

    /// Raw timestamp string shown for this simulation, `updated_at` first.
    pub fn display_timestamp(&self) -> Option<String> {
        self.updated_at
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .or(self.created_at.as_deref())
            .map(str::to_string)
    }
}

/// Standard `{success, data, error}` wrapper the backend puts around payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl<T> ApiEnvelope<T> {
    /// A missing `success` flag counts as success; only an explicit `false` rejects.
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.is_rejected() {
            return Err(self
                .error
                .unwrap_or_else(|| "request rejected by server".to_string()));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportCheck {
    #[serde(default)]
    pub has_report: bool,
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub report_status: Option<ReportStatus>,
    #[serde(default)]
    pub interview_unlocked: bool,
}

impl ReportCheck {
    pub fn report_id(&self) -> Option<&str> {
        self.report_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("expected string or number for id")),
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<Value>::deserialize(deserializer)?;
    Ok(match val {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Strings pass through; any other non-null value keeps its JSON text so it
/// lands in `Other` instead of failing the record.
fn deserialize_status<'de, D>(deserializer: D) -> Result<SimulationStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<Value>::deserialize(deserializer)?;
    Ok(match val {
        None | Some(Value::Null) => SimulationStatus::default(),
        Some(Value::String(s)) => SimulationStatus::from(s),
        Some(other) => SimulationStatus::Other(other.to_string()),
    })
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<Value>::deserialize(deserializer)?;
    Ok(match val {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_opt_text(deserializer)?.unwrap_or_default())
}

/// A list element that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// Decodes list elements one at a time so a single malformed element is
/// dropped instead of failing the whole list.
pub fn decode_records<T>(values: Vec<Value>) -> (Vec<T>, Vec<SkippedRecord>)
where
    T: DeserializeOwned,
{
    let mut records = Vec::with_capacity(values.len());
    let mut skipped = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(err) => skipped.push(SkippedRecord {
                index,
                reason: err.to_string(),
            }),
        }
    }
    (records, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_keeps_unknown_fields_in_extra() {
        let project: Project = serde_json::from_value(json!({
            "project_id": "proj_1",
            "name": "Campus rumor",
            "simulation_requirement": "simulate spread",
            "graph_id": null,
            "status": "graph_completed",
            "files": [{"filename": "a.md"}]
        }))
        .unwrap();
        assert_eq!(project.project_id, "proj_1");
        assert_eq!(project.graph_id, None);
        assert_eq!(project.extra.get("status"), Some(&json!("graph_completed")));
        assert!(project.extra.contains_key("files"));

        let back = serde_json::to_value(&project).unwrap();
        assert_eq!(back["status"], json!("graph_completed"));
    }

    #[test]
    fn simulation_tolerates_missing_ids_and_numeric_ids() {
        let sim: Simulation = serde_json::from_value(json!({
            "simulation_id": 42,
            "status": "ready"
        }))
        .unwrap();
        assert_eq!(sim.simulation_id.as_deref(), Some("42"));
        assert_eq!(sim.project_id, None);
        assert_eq!(sim.status, SimulationStatus::Ready);

        let sim: Simulation = serde_json::from_value(json!({
            "simulation_id": "",
            "project_id": "p1"
        }))
        .unwrap();
        assert_eq!(sim.simulation_id, None);
        assert_eq!(sim.status, SimulationStatus::Other(String::new()));
    }

    #[test]
    fn simulation_with_odd_field_types_still_decodes() {
        let sims: Vec<Simulation> = serde_json::from_value(json!([
            {"simulation_id": "s1", "project_id": "p1", "status": "ready", "updated_at": "2024-01-02"},
            {"simulation_id": "s2", "project_id": "p1", "status": 3, "updated_at": 1704153600},
            {"simulation_id": "s3", "project_id": "p1", "status": {"phase": "x"}, "created_at": false}
        ]))
        .unwrap();
        assert_eq!(sims.len(), 3);
        assert_eq!(sims[1].status, SimulationStatus::Other("3".to_string()));
        assert!(!sims[1].status.is_env_ready());
        assert_eq!(sims[1].updated_at.as_deref(), Some("1704153600"));
        assert_eq!(sims[2].created_at, None);
        assert!(!sims[2].status.is_env_ready());
    }

    #[test]
    fn project_text_fields_accept_numbers_and_ignore_other_types() {
        let project: Project = serde_json::from_value(json!({
            "project_id": 7,
            "name": 2024,
            "graph_id": ["g"],
            "updated_at": 1704153600
        }))
        .unwrap();
        assert_eq!(project.project_id, "7");
        assert_eq!(project.name, "2024");
        assert_eq!(project.graph_id, None);
        assert_eq!(project.timestamp_ms(), 1_704_153_600_000);
    }

    #[test]
    fn decode_records_drops_only_the_bad_elements() {
        let (projects, skipped) = decode_records::<Project>(vec![
            json!({"project_id": "p1", "name": "Alpha"}),
            json!({"name": "no id"}),
            json!("not an object"),
            json!({"project_id": "p2", "name": "Beta"}),
        ]);
        let ids: Vec<&str> = projects.iter().map(|p| p.project_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(
            skipped.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(skipped[0].reason.contains("project_id"));
    }

    #[test]
    fn display_timestamp_prefers_updated_at() {
        let sim = Simulation::new("s1", "p1", SimulationStatus::Ready)
            .with_created_at("2024-01-01")
            .with_updated_at("2024-01-05");
        assert_eq!(sim.display_timestamp().as_deref(), Some("2024-01-05"));

        let sim = Simulation::new("s1", "p1", SimulationStatus::Ready)
            .with_created_at("2024-01-01")
            .with_updated_at(" ");
        assert_eq!(sim.display_timestamp().as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn envelope_rejects_only_on_explicit_false() {
        let ok: ApiEnvelope<ReportCheck> = serde_json::from_value(json!({
            "data": {"has_report": true, "report_id": "r1", "interview_unlocked": false}
        }))
        .unwrap();
        let data = ok.into_result().unwrap().unwrap();
        assert!(data.has_report);
        assert_eq!(data.report_id(), Some("r1"));

        let rejected: ApiEnvelope<ReportCheck> =
            serde_json::from_value(json!({"success": false, "error": "not found"})).unwrap();
        assert_eq!(rejected.into_result().unwrap_err(), "not found");
    }

    #[test]
    fn blank_report_id_is_treated_as_absent() {
        let check = ReportCheck {
            has_report: true,
            report_id: Some("  ".to_string()),
            report_status: None,
            interview_unlocked: true,
        };
        assert_eq!(check.report_id(), None);
    }
}
