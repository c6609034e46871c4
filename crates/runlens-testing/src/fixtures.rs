use chrono::TimeZone;
use serde_json::json;

use runlens_types::{HistoryRow, RunInfo};

/// The canonical two-point loss history used across the test suite:
/// `[{"_step":0,"loss":0.9},{"_step":1,"loss":0.5}]`.
pub fn loss_history() -> Vec<HistoryRow> {
    [json!({"_step": 0, "loss": 0.9}), json!({"_step": 1, "loss": 0.5})]
        .iter()
        .filter_map(HistoryRow::from_value)
        .collect()
}

/// A fully populated run detail record.
pub fn sample_run_info(id: &str) -> RunInfo {
    let mut info = RunInfo::new(id, format!("run-{}", id), "finished");
    info.created_at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single();
    info.finished_at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
    info.duration_seconds = Some(1800.0);
    info.tags = vec!["baseline".to_string()];
    info.notes = Some("first full sweep".to_string());
    info.url = format!("https://wandb.ai/acme/vision/runs/{}", id);
    info.config.insert("lr".to_string(), json!(0.01));
    info.config.insert("batch_size".to_string(), json!(32));
    info.summary.insert("loss".to_string(), json!(0.5));
    info
}
