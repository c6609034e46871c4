use std::sync::Arc;

use runlens_types::{HistoryRow, Project, RunInfo, RunSummary};

use crate::api::TrackingApi;
use crate::config::Config;
use crate::error::Result;
use crate::wandb::WandbHttp;

/// Shared handle to one tracking-service backend.
///
/// Built once at process start and cloned into every tool handler. Holds
/// no mutable state, so concurrent calls need no coordination.
#[derive(Clone)]
pub struct Client {
    api: Arc<dyn TrackingApi>,
}

impl Client {
    /// Connect to the real service described by `config`.
    pub fn connect(config: Config) -> Result<Self> {
        Ok(Self {
            api: Arc::new(WandbHttp::new(config)?),
        })
    }

    /// Wrap an arbitrary backend. This is the test seam.
    pub fn from_api(api: Arc<dyn TrackingApi>) -> Self {
        Self { api }
    }

    pub async fn projects(&self, entity: &str) -> Result<Vec<Project>> {
        self.api.projects(entity).await
    }

    pub async fn runs(&self, entity: &str, project: &str) -> Result<Vec<RunSummary>> {
        self.api.runs(entity, project).await
    }

    pub async fn run_info(&self, entity: &str, project: &str, run_id: &str) -> Result<RunInfo> {
        self.api.run_info(entity, project, run_id).await
    }

    pub async fn history(
        &self,
        entity: &str,
        project: &str,
        run_id: &str,
        samples: Option<usize>,
    ) -> Result<Vec<HistoryRow>> {
        self.api.history(entity, project, run_id, samples).await
    }
}
