//! Renders run detail records into the four-section text layout.

use runlens_types::{RunInfo, display_value};

/// Assemble the Overview / Config / Summary / System Info sections, in
/// that fixed order. Sections with nothing to show render `(No data)`.
pub fn format_run_details(run: &RunInfo) -> String {
    let mut output = String::new();
    output.push_str(&format_section("Overview", &overview_entries(run)));
    output.push_str(&format_section("Config", &map_entries(&run.config)));
    output.push_str(&format_section("Summary", &map_entries(&run.summary)));
    output.push_str(&format_section("System Info", &system_entries(run)));
    output
}

fn format_section(title: &str, entries: &[(String, String)]) -> String {
    if entries.is_empty() {
        return format!("\n### {}\n(No data)\n", title);
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    format!("\n### {}\n{}\n", title, lines.join("\n"))
}

fn overview_entries(run: &RunInfo) -> Vec<(String, String)> {
    let timestamp = |value: &Option<chrono::DateTime<chrono::Utc>>| match value {
        Some(at) => at.to_rfc3339(),
        None => "unknown".to_string(),
    };
    vec![
        ("name".to_string(), run.name.clone()),
        ("id".to_string(), run.id.clone()),
        ("state".to_string(), run.state.clone()),
        ("created_at".to_string(), timestamp(&run.created_at)),
        ("finished_at".to_string(), timestamp(&run.finished_at)),
        (
            "duration (s)".to_string(),
            match run.duration_seconds {
                Some(seconds) => format!("{}", seconds),
                None => "unknown".to_string(),
            },
        ),
        ("tags".to_string(), run.tags.join(", ")),
        (
            "notes".to_string(),
            run.notes.clone().unwrap_or_default(),
        ),
        ("url".to_string(), run.url.clone()),
    ]
}

fn map_entries(map: &std::collections::BTreeMap<String, serde_json::Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(key, value)| (key.clone(), display_value(value)))
        .collect()
}

fn system_entries(run: &RunInfo) -> Vec<(String, String)> {
    match &run.system_metrics {
        Some(metrics) => map_entries(metrics),
        None => vec![(
            "info".to_string(),
            "System metrics not available.".to_string(),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runlens_types::RunInfo;
    use serde_json::json;

    #[test]
    fn sections_appear_in_fixed_order() {
        let run = RunInfo::new("r1", "brisk-dawn-1", "finished");
        let text = format_run_details(&run);

        let overview = text.find("### Overview").unwrap();
        let config = text.find("### Config").unwrap();
        let summary = text.find("### Summary").unwrap();
        let system = text.find("### System Info").unwrap();
        assert!(overview < config && config < summary && summary < system);
    }

    #[test]
    fn empty_sections_render_no_data() {
        let run = RunInfo::new("r1", "brisk-dawn-1", "finished");
        let text = format_run_details(&run);
        assert!(text.contains("### Config\n(No data)\n"));
        assert!(text.contains("### Summary\n(No data)\n"));
    }

    #[test]
    fn missing_system_metrics_render_fallback_notice() {
        let run = RunInfo::new("r1", "run", "finished");
        let text = format_run_details(&run);
        assert!(text.contains("### System Info\ninfo: System metrics not available.\n"));
    }

    #[test]
    fn present_system_metrics_render_key_values() {
        let mut run = RunInfo::new("r1", "run", "finished");
        run.system_metrics = Some(
            [("gpu".to_string(), json!("A100"))]
                .into_iter()
                .collect(),
        );
        let text = format_run_details(&run);
        assert!(text.contains("### System Info\ngpu: A100\n"));
    }

    #[test]
    fn overview_lists_identity_fields_in_order() {
        let mut run = RunInfo::new("r1", "brisk-dawn-1", "finished");
        run.tags = vec!["prod".to_string(), "v2".to_string()];
        run.url = "https://wandb.ai/acme/vision/runs/r1".to_string();
        let text = format_run_details(&run);
        assert!(text.contains("name: brisk-dawn-1\nid: r1\nstate: finished\n"));
        assert!(text.contains("tags: prod, v2"));
        assert!(text.contains("url: https://wandb.ai/acme/vision/runs/r1"));
    }

    #[test]
    fn config_values_render_without_json_quotes() {
        let mut run = RunInfo::new("r1", "run", "finished");
        run.config.insert("optimizer".to_string(), json!("adam"));
        run.config.insert("lr".to_string(), json!(0.01));
        let text = format_run_details(&run);
        assert!(text.contains("optimizer: adam"));
        assert!(text.contains("lr: 0.01"));
    }
}
