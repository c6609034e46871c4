//! Test doubles for runlens.
//!
//! [`MockApi`] is an in-memory [`TrackingApi`] seeded through a builder.
//! It records how many remote calls were made so tests can assert that
//! guidance-string paths short-circuit before touching the backend.

mod fixtures;

pub use fixtures::{loss_history, sample_run_info};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use runlens_client::{Error, Result, TrackingApi};
use runlens_types::{HistoryRow, Project, RunInfo, RunSummary};

#[derive(Default)]
pub struct MockApi {
    projects: HashMap<String, Vec<Project>>,
    runs: HashMap<String, Vec<RunSummary>>,
    run_infos: HashMap<String, RunInfo>,
    histories: HashMap<String, Vec<HistoryRow>>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_project(mut self, entity: &str, name: &str) -> Self {
        self.projects
            .entry(entity.to_string())
            .or_default()
            .push(Project::new(name));
        self
    }

    pub fn with_run(mut self, entity: &str, project: &str, run: RunSummary) -> Self {
        self.runs
            .entry(path(entity, project))
            .or_default()
            .push(run);
        self
    }

    pub fn with_run_info(mut self, entity: &str, project: &str, info: RunInfo) -> Self {
        self.run_infos
            .insert(run_path(entity, project, &info.id), info);
        self
    }

    pub fn with_history(
        mut self,
        entity: &str,
        project: &str,
        run_id: &str,
        rows: Vec<HistoryRow>,
    ) -> Self {
        self.histories.insert(run_path(entity, project, run_id), rows);
        self
    }

    /// Number of backend calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(Error::Api(message.clone())),
            None => Ok(()),
        }
    }
}

fn path(entity: &str, project: &str) -> String {
    format!("{}/{}", entity, project)
}

fn run_path(entity: &str, project: &str, run_id: &str) -> String {
    format!("{}/{}/{}", entity, project, run_id)
}

#[async_trait]
impl TrackingApi for MockApi {
    async fn projects(&self, entity: &str) -> Result<Vec<Project>> {
        self.record_call()?;
        Ok(self.projects.get(entity).cloned().unwrap_or_default())
    }

    async fn runs(&self, entity: &str, project: &str) -> Result<Vec<RunSummary>> {
        self.record_call()?;
        Ok(self
            .runs
            .get(&path(entity, project))
            .cloned()
            .unwrap_or_default())
    }

    async fn run_info(&self, entity: &str, project: &str, run_id: &str) -> Result<RunInfo> {
        self.record_call()?;
        self.run_infos
            .get(&run_path(entity, project, run_id))
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!("run '{}' in {}/{}", run_id, entity, project))
            })
    }

    async fn history(
        &self,
        entity: &str,
        project: &str,
        run_id: &str,
        samples: Option<usize>,
    ) -> Result<Vec<HistoryRow>> {
        self.record_call()?;
        let rows = self
            .histories
            .get(&run_path(entity, project, run_id))
            .cloned()
            .unwrap_or_default();
        Ok(match samples {
            Some(limit) => rows.into_iter().take(limit).collect(),
            None => rows,
        })
    }
}
