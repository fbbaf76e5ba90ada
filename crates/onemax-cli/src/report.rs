use chrono::{DateTime, Utc};
use onemax_sweep::{config::SweepConfig, sweep::SweepReport};
use serde::{Deserialize, Serialize};

/// JSON document written by `onemax sweep --json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweepReportFile {
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub config: SweepConfig,
    pub report: SweepReport,
}
