use chrono::{DateTime, NaiveDateTime, Utc};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use runlens_types::{HistoryRow, Project, RunInfo, RunSummary, is_internal_key};

use crate::api::TrackingApi;
use crate::config::{Config, DEFAULT_BASE_URL};
use crate::error::{Error, Result};

const PROJECTS_QUERY: &str = r#"
query Projects($entity: String!) {
  models(entityName: $entity, first: 500) {
    edges { node { name } }
  }
}"#;

const RUNS_QUERY: &str = r#"
query Runs($entity: String!, $project: String!) {
  project(entityName: $entity, name: $project) {
    runs(first: 500) {
      edges { node { name displayName state } }
    }
  }
}"#;

const RUN_INFO_QUERY: &str = r#"
query RunInfo($entity: String!, $project: String!, $run: String!) {
  project(entityName: $entity, name: $project) {
    run(name: $run) {
      name displayName state notes tags
      createdAt heartbeatAt
      config summaryMetrics systemMetrics
    }
  }
}"#;

const HISTORY_QUERY: &str = r#"
query RunHistory($entity: String!, $project: String!, $run: String!, $samples: Int) {
  project(entityName: $entity, name: $project) {
    run(name: $run) {
      history(samples: $samples)
    }
  }
}"#;

/// GraphQL backend for the hosted (or self-hosted) W&B API.
///
/// Authentication is HTTP basic with the literal user `api` and the API
/// key as password, matching the service's published client behavior.
pub struct WandbHttp {
    http: reqwest::Client,
    config: Config,
}

impl WandbHttp {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("runlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let url = format!("{}/graphql", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        if let Some(message) = body
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
        {
            return Err(Error::Api(message.to_string()));
        }
        body.get("data")
            .cloned()
            .ok_or_else(|| Error::Api("response has no data field".to_string()))
    }

    fn run_url(&self, entity: &str, project: &str, run_id: &str) -> String {
        if self.config.base_url == DEFAULT_BASE_URL {
            format!("https://wandb.ai/{}/{}/runs/{}", entity, project, run_id)
        } else {
            format!(
                "{}/{}/{}/runs/{}",
                self.config.base_url.trim_end_matches('/'),
                entity,
                project,
                run_id
            )
        }
    }
}

#[async_trait]
impl TrackingApi for WandbHttp {
    async fn projects(&self, entity: &str) -> Result<Vec<Project>> {
        let data = self
            .graphql(PROJECTS_QUERY, json!({ "entity": entity }))
            .await?;
        parse_projects(&data)
    }

    async fn runs(&self, entity: &str, project: &str) -> Result<Vec<RunSummary>> {
        let data = self
            .graphql(RUNS_QUERY, json!({ "entity": entity, "project": project }))
            .await?;
        parse_runs(&data, entity, project)
    }

    async fn run_info(&self, entity: &str, project: &str, run_id: &str) -> Result<RunInfo> {
        let data = self
            .graphql(
                RUN_INFO_QUERY,
                json!({ "entity": entity, "project": project, "run": run_id }),
            )
            .await?;
        let url = self.run_url(entity, project, run_id);
        parse_run_info(&data, entity, project, run_id, url)
    }

    async fn history(
        &self,
        entity: &str,
        project: &str,
        run_id: &str,
        samples: Option<usize>,
    ) -> Result<Vec<HistoryRow>> {
        let data = self
            .graphql(
                HISTORY_QUERY,
                json!({
                    "entity": entity,
                    "project": project,
                    "run": run_id,
                    "samples": samples,
                }),
            )
            .await?;
        parse_history(&data, entity, project, run_id)
    }
}

fn edges<'a>(connection: &'a Value) -> impl Iterator<Item = &'a Value> {
    connection
        .get("edges")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|edge| edge.get("node"))
}

fn parse_projects(data: &Value) -> Result<Vec<Project>> {
    let models = data
        .get("models")
        .filter(|m| !m.is_null())
        .ok_or_else(|| Error::Api("response has no models field".to_string()))?;

    Ok(edges(models)
        .filter_map(|node| node.get("name").and_then(Value::as_str))
        .map(Project::new)
        .collect())
}

fn parse_runs(data: &Value, entity: &str, project: &str) -> Result<Vec<RunSummary>> {
    let project_node = data
        .get("project")
        .filter(|p| !p.is_null())
        .ok_or_else(|| Error::NotFound(format!("project '{}/{}'", entity, project)))?;
    let runs = project_node
        .get("runs")
        .filter(|r| !r.is_null())
        .ok_or_else(|| Error::Api("project has no runs field".to_string()))?;

    Ok(edges(runs)
        .filter_map(|node| {
            // "name" is the stable run id; displayName is the human label.
            let id = node.get("name").and_then(Value::as_str)?;
            let name = node
                .get("displayName")
                .and_then(Value::as_str)
                .unwrap_or(id);
            let state = node.get("state").and_then(Value::as_str).unwrap_or("unknown");
            Some(RunSummary::new(id, name, state))
        })
        .collect())
}

fn run_node<'a>(data: &'a Value, entity: &str, project: &str, run_id: &str) -> Result<&'a Value> {
    data.get("project")
        .filter(|p| !p.is_null())
        .ok_or_else(|| Error::NotFound(format!("project '{}/{}'", entity, project)))?
        .get("run")
        .filter(|r| !r.is_null())
        .ok_or_else(|| Error::NotFound(format!("run '{}' in {}/{}", run_id, entity, project)))
}

fn parse_run_info(
    data: &Value,
    entity: &str,
    project: &str,
    run_id: &str,
    url: String,
) -> Result<RunInfo> {
    let node = run_node(data, entity, project, run_id)?;

    let id = node
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(run_id)
        .to_string();
    let name = node
        .get("displayName")
        .and_then(Value::as_str)
        .unwrap_or(&id)
        .to_string();
    let state = node
        .get("state")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let created_at = parse_timestamp(node.get("createdAt"));
    let finished_at = parse_timestamp(node.get("heartbeatAt"));
    let duration_seconds = match (created_at, finished_at) {
        (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
        _ => None,
    };

    Ok(RunInfo {
        id,
        name,
        state,
        created_at,
        finished_at,
        duration_seconds,
        tags: node
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        notes: node
            .get("notes")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        url,
        config: parse_config(node.get("config")),
        summary: parse_json_object(node.get("summaryMetrics")).unwrap_or_default(),
        system_metrics: parse_json_object(node.get("systemMetrics")),
    })
}

fn parse_history(data: &Value, entity: &str, project: &str, run_id: &str) -> Result<Vec<HistoryRow>> {
    let node = run_node(data, entity, project, run_id)?;
    let rows = node
        .get("history")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    // The service serializes each history row as a JSON string; tolerate
    // plain objects as well.
    Ok(rows
        .iter()
        .filter_map(|row| match row {
            Value::String(encoded) => serde_json::from_str::<Value>(encoded)
                .ok()
                .as_ref()
                .and_then(HistoryRow::from_value),
            other => HistoryRow::from_value(other),
        })
        .collect())
}

/// W&B encodes timestamps either as RFC 3339 or as a bare ISO datetime.
fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Decode a field the service stores as a JSON-encoded object string.
fn parse_json_object(value: Option<&Value>) -> Option<BTreeMap<String, Value>> {
    let value = value?;
    let object = match value {
        Value::String(encoded) => serde_json::from_str::<Value>(encoded).ok()?,
        other => other.clone(),
    };
    let object = object.as_object()?;
    Some(
        object
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

/// The config object wraps every hyperparameter in `{"value": ..}` and
/// mixes in `_wandb` bookkeeping; unwrap and drop the internal entries.
fn parse_config(value: Option<&Value>) -> BTreeMap<String, Value> {
    let Some(raw) = parse_json_object(value) else {
        return BTreeMap::new();
    };
    raw.into_iter()
        .filter(|(k, _)| !is_internal_key(k))
        .map(|(k, v)| {
            let unwrapped = v
                .as_object()
                .and_then(|o| o.get("value"))
                .cloned()
                .unwrap_or(v);
            (k, unwrapped)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_project_listing() {
        let data = json!({
            "models": {
                "edges": [
                    {"node": {"name": "vision"}},
                    {"node": {"name": "nlp"}},
                ]
            }
        });
        let projects = parse_projects(&data).unwrap();
        assert_eq!(
            projects,
            vec![Project::new("vision"), Project::new("nlp")]
        );
    }

    #[test]
    fn empty_project_listing_is_ok() {
        let data = json!({"models": {"edges": []}});
        assert!(parse_projects(&data).unwrap().is_empty());
    }

    #[test]
    fn parses_run_listing_in_order() {
        let data = json!({
            "project": {
                "runs": {
                    "edges": [
                        {"node": {"name": "r2", "displayName": "warm-salad-2", "state": "finished"}},
                        {"node": {"name": "r1", "displayName": "brisk-dawn-1", "state": "running"}},
                    ]
                }
            }
        });
        let runs = parse_runs(&data, "acme", "vision").unwrap();
        assert_eq!(
            runs,
            vec![
                RunSummary::new("r2", "warm-salad-2", "finished"),
                RunSummary::new("r1", "brisk-dawn-1", "running"),
            ]
        );
    }

    #[test]
    fn missing_project_is_not_found() {
        let data = json!({"project": null});
        let err = parse_runs(&data, "acme", "nope").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn parses_run_info_fields() {
        let data = json!({
            "project": {
                "run": {
                    "name": "r1",
                    "displayName": "brisk-dawn-1",
                    "state": "finished",
                    "notes": "baseline",
                    "tags": ["prod", "v2"],
                    "createdAt": "2024-05-01T12:00:00Z",
                    "heartbeatAt": "2024-05-01T12:30:00Z",
                    "config": r#"{"lr": {"value": 0.01, "desc": null}, "_wandb": {"value": {}}}"#,
                    "summaryMetrics": r#"{"loss": 0.5, "_runtime": 1800}"#,
                    "systemMetrics": r#"{"gpu": "A100"}"#,
                }
            }
        });
        let info = parse_run_info(&data, "acme", "vision", "r1", "u".into()).unwrap();
        assert_eq!(info.id, "r1");
        assert_eq!(info.name, "brisk-dawn-1");
        assert_eq!(info.state, "finished");
        assert_eq!(info.notes.as_deref(), Some("baseline"));
        assert_eq!(info.tags, vec!["prod", "v2"]);
        assert_eq!(info.duration_seconds, Some(1800.0));
        assert_eq!(info.config.get("lr"), Some(&json!(0.01)));
        assert!(!info.config.contains_key("_wandb"));
        assert_eq!(info.summary.get("loss"), Some(&json!(0.5)));
        assert_eq!(
            info.system_metrics.as_ref().and_then(|m| m.get("gpu")),
            Some(&json!("A100"))
        );
    }

    #[test]
    fn missing_run_is_not_found() {
        let data = json!({"project": {"run": null}});
        let err = parse_run_info(&data, "acme", "vision", "ghost", "u".into()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn run_info_tolerates_absent_optionals() {
        let data = json!({"project": {"run": {"name": "r1", "state": "running"}}});
        let info = parse_run_info(&data, "acme", "vision", "r1", "u".into()).unwrap();
        assert_eq!(info.name, "r1");
        assert_eq!(info.created_at, None);
        assert_eq!(info.duration_seconds, None);
        assert!(info.config.is_empty());
        assert!(info.summary.is_empty());
        assert_eq!(info.system_metrics, None);
    }

    #[test]
    fn parses_history_rows_from_encoded_strings() {
        let data = json!({
            "project": {
                "run": {
                    "history": [
                        r#"{"_step": 0, "loss": 0.9}"#,
                        r#"{"_step": 1, "loss": 0.5}"#,
                    ]
                }
            }
        });
        let rows = parse_history(&data, "acme", "vision", "r1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].step, Some(0));
        assert_eq!(rows[1].number("loss"), Some(0.5));
    }

    #[test]
    fn history_skips_malformed_rows() {
        let data = json!({
            "project": {
                "run": {"history": ["not json", {"_step": 2, "loss": 0.1}]}
            }
        });
        let rows = parse_history(&data, "acme", "vision", "r1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].step, Some(2));
    }

    #[test]
    fn timestamps_parse_in_both_shapes() {
        let rfc = parse_timestamp(Some(&json!("2024-05-01T12:00:00Z")));
        let bare = parse_timestamp(Some(&json!("2024-05-01T12:00:00")));
        assert_eq!(rfc, bare);
        assert_eq!(parse_timestamp(Some(&json!("soon"))), None);
        assert_eq!(parse_timestamp(None), None);
    }
}
