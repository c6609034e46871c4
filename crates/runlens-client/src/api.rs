use async_trait::async_trait;
use runlens_types::{HistoryRow, Project, RunInfo, RunSummary};

use crate::error::Result;

/// The read-only operations runlens needs from a tracking service.
///
/// Implemented over GraphQL by [`WandbHttp`](crate::WandbHttp) and by the
/// in-memory mock in `runlens-testing`.
#[async_trait]
pub trait TrackingApi: Send + Sync {
    /// All projects owned by `entity`, in service iteration order.
    async fn projects(&self, entity: &str) -> Result<Vec<Project>>;

    /// All runs in `entity/project`, in service iteration order.
    async fn runs(&self, entity: &str, project: &str) -> Result<Vec<RunSummary>>;

    /// Full detail for one run.
    async fn run_info(&self, entity: &str, project: &str, run_id: &str) -> Result<RunInfo>;

    /// Logged history rows for one run, oldest first. `samples` caps the
    /// number of rows the service returns; `None` fetches the service
    /// default window.
    async fn history(
        &self,
        entity: &str,
        project: &str,
        run_id: &str,
        samples: Option<usize>,
    ) -> Result<Vec<HistoryRow>>;
}
