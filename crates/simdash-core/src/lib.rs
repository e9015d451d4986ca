pub mod model;
pub mod status;
pub mod time;
pub mod view;

pub use model::{decode_records, ApiEnvelope, Project, ReportCheck, Simulation, SkippedRecord};
pub use status::{
    report_status_badge, simulation_status_badge, BadgeCategory, ReportStatus, SimulationStatus,
    StatusBadge,
};
pub use time::{parse_timestamp_ms, record_timestamp_ms};
pub use view::{ProjectView, ReportSummary, SimulationSummary};
