use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A project namespace owned by an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One row of a run listing: just enough to identify the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: String,
    pub name: String,
    pub state: String,
}

impl RunSummary {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: state.into(),
        }
    }
}

/// Full detail view of a single run.
///
/// `config` holds user-defined hyperparameters, `summary` the final logged
/// value per metric. `system_metrics` is `None` when the service does not
/// expose environment/hardware data for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: String,
    pub name: String,
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub url: String,
    pub config: BTreeMap<String, Value>,
    pub summary: BTreeMap<String, Value>,
    pub system_metrics: Option<BTreeMap<String, Value>>,
}

impl RunInfo {
    /// A minimal record with every optional section absent.
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: state.into(),
            created_at: None,
            finished_at: None,
            duration_seconds: None,
            tags: Vec::new(),
            notes: None,
            url: String::new(),
            config: BTreeMap::new(),
            summary: BTreeMap::new(),
            system_metrics: None,
        }
    }
}
