//! Core domain types for runlens.
//!
//! Everything here is a transient view over objects owned by the remote
//! tracking service. Nothing is created, mutated, or persisted locally;
//! values are fetched fresh per tool call and dropped afterwards.

mod history;
mod run;
mod value;

pub use history::{HistoryRow, MetricSeries, is_internal_key};
pub use run::{Project, RunInfo, RunSummary};
pub use value::display_value;
