//! Tool argument schemas and the boundary result types.
//!
//! Every argument field is `#[serde(default)]`: an omitted field and an
//! empty one both take the guidance-string path inside the handler, and
//! no remote call is made for either.

use schemars::JsonSchema;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ListProjectsArgs {
    /// Entity (user or team) that owns the projects.
    pub entity: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ListRunsArgs {
    /// Entity (user or team) that owns the project.
    pub entity: String,
    /// Project to list runs from.
    pub project_name: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ListMetricsArgs {
    /// Entity (user or team) that owns the project.
    pub entity: String,
    /// Project to discover metric names in.
    pub project_name: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PlotRunMetricsArgs {
    /// Entity (user or team) that owns the project.
    pub entity: String,
    /// Project the run belongs to.
    pub project_name: String,
    /// Run identifier to plot metrics from.
    pub run_id: String,
    /// Metric names to plot.
    pub metric_names: Vec<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GetRunDetailsArgs {
    /// Entity (user or team) that owns the project.
    pub entity: String,
    /// Project the run belongs to.
    pub project_name: String,
    /// Run identifier to fetch details for.
    pub run_id: String,
}

/// Successful tool payload.
#[derive(Debug)]
pub enum ToolOutput {
    Text(String),
    Png(Vec<u8>),
}

/// Which fetch a [`ToolError::Fetch`] belongs to; decides the error prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchWhat {
    Projects,
    Runs(String),
    Metrics(String),
    RunDetails(String),
}

/// Typed failure at the tool boundary.
///
/// The transport layer renders this to its exact agent-readable string
/// and returns it as a normal text payload: no tool failure ever becomes
/// a JSON-RPC error or escapes the operation.
#[derive(Debug)]
pub enum ToolError {
    /// A required parameter was missing or empty; the payload is the
    /// fixed guidance string.
    MissingArgs(&'static str),
    Fetch {
        what: FetchWhat,
        source: runlens_client::Error,
    },
    Plot {
        run_id: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::MissingArgs(guidance) => f.write_str(guidance),
            ToolError::Fetch { what, source } => match what {
                FetchWhat::Projects => write!(f, "Error fetching projects: {}", source),
                FetchWhat::Runs(project) => {
                    write!(f, "Error fetching runs for '{}': {}", project, source)
                }
                FetchWhat::Metrics(project) => {
                    write!(f, "Error fetching metrics for '{}': {}", project, source)
                }
                FetchWhat::RunDetails(run_id) => {
                    write!(f, "Error fetching run details for '{}': {}", run_id, source)
                }
            },
            ToolError::Plot { run_id, source } => {
                write!(f, "Error plotting metrics from run '{}': {}", run_id, source)
            }
        }
    }
}

impl std::error::Error for ToolError {}
