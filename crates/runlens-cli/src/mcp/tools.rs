//! MCP tool handlers.
//!
//! Each handler is a stateless request/response cycle over the shared
//! client: fetch, reshape, return. Failures become typed [`ToolError`]s;
//! the transport layer turns them into agent-readable strings.

use std::collections::BTreeSet;

use runlens_client::Client;
use runlens_types::MetricSeries;

use super::dto::{
    FetchWhat, GetRunDetailsArgs, ListMetricsArgs, ListProjectsArgs, ListRunsArgs,
    PlotRunMetricsArgs, ToolError, ToolOutput,
};
use super::presenter::format_run_details;

pub async fn handle_list_projects(
    client: &Client,
    args: ListProjectsArgs,
) -> Result<ToolOutput, ToolError> {
    let projects = client
        .projects(&args.entity)
        .await
        .map_err(|source| ToolError::Fetch {
            what: FetchWhat::Projects,
            source,
        })?;

    if projects.is_empty() {
        return Ok(ToolOutput::Text(format!(
            "No projects found for '{}'.",
            args.entity
        )));
    }

    let lines: Vec<String> = projects.iter().map(|p| format!("- {}", p.name)).collect();
    Ok(ToolOutput::Text(lines.join("\n")))
}

pub async fn handle_list_runs(
    client: &Client,
    args: ListRunsArgs,
) -> Result<ToolOutput, ToolError> {
    if args.project_name.is_empty() {
        return Err(ToolError::MissingArgs("Project name is required."));
    }

    let runs = client
        .runs(&args.entity, &args.project_name)
        .await
        .map_err(|source| ToolError::Fetch {
            what: FetchWhat::Runs(args.project_name.clone()),
            source,
        })?;

    if runs.is_empty() {
        return Ok(ToolOutput::Text(format!(
            "No runs found in '{}'.",
            args.project_name
        )));
    }

    let lines: Vec<String> = runs
        .iter()
        .map(|r| format!("- {} (id: {}, state: {})", r.name, r.id, r.state))
        .collect();
    Ok(ToolOutput::Text(lines.join("\n")))
}

pub async fn handle_list_metrics(
    client: &Client,
    args: ListMetricsArgs,
) -> Result<ToolOutput, ToolError> {
    if args.project_name.is_empty() {
        return Err(ToolError::MissingArgs("Project name is required."));
    }

    let fetch_err = |source| ToolError::Fetch {
        what: FetchWhat::Metrics(args.project_name.clone()),
        source,
    };

    let runs = client
        .runs(&args.entity, &args.project_name)
        .await
        .map_err(&fetch_err)?;

    // One sampled row per run; union the non-internal keys. BTreeSet
    // gives the sorted, deduplicated output regardless of run order.
    let mut metrics: BTreeSet<String> = BTreeSet::new();
    for run in &runs {
        let rows = client
            .history(&args.entity, &args.project_name, &run.id, Some(1))
            .await
            .map_err(&fetch_err)?;
        if let Some(row) = rows.first() {
            metrics.extend(row.metric_keys().map(str::to_string));
        }
    }

    if metrics.is_empty() {
        return Ok(ToolOutput::Text(format!(
            "No metrics found in '{}'.",
            args.project_name
        )));
    }

    Ok(ToolOutput::Text(
        metrics.into_iter().collect::<Vec<_>>().join("\n"),
    ))
}

pub async fn handle_plot_run_metrics(
    client: &Client,
    args: PlotRunMetricsArgs,
) -> Result<ToolOutput, ToolError> {
    if args.project_name.is_empty() || args.run_id.is_empty() || args.metric_names.is_empty() {
        return Err(ToolError::MissingArgs(
            "project_name, run_id, and metric_names are required.",
        ));
    }

    let plot_err = |source: Box<dyn std::error::Error + Send + Sync>| ToolError::Plot {
        run_id: args.run_id.clone(),
        source,
    };

    let info = client
        .run_info(&args.entity, &args.project_name, &args.run_id)
        .await
        .map_err(|e| plot_err(Box::new(e)))?;

    let rows = client
        .history(&args.entity, &args.project_name, &args.run_id, None)
        .await
        .map_err(|e| plot_err(Box::new(e)))?;

    if rows.is_empty() {
        return Ok(ToolOutput::Text(format!(
            "No metric data found in run '{}'.",
            args.run_id
        )));
    }

    let series = MetricSeries::from_rows(&rows, &args.metric_names);
    if series.available().is_empty() {
        return Ok(ToolOutput::Text(format!(
            "None of the requested metrics found in run '{}'.",
            args.run_id
        )));
    }

    let png = runlens_chart::render_metric_chart(&info.name, &series)
        .map_err(|e| plot_err(Box::new(e)))?;
    Ok(ToolOutput::Png(png))
}

pub async fn handle_get_run_details(
    client: &Client,
    args: GetRunDetailsArgs,
) -> Result<ToolOutput, ToolError> {
    if args.project_name.is_empty() || args.run_id.is_empty() {
        return Err(ToolError::MissingArgs(
            "Both project_name and run_id are required.",
        ));
    }

    let run = client
        .run_info(&args.entity, &args.project_name, &args.run_id)
        .await
        .map_err(|source| ToolError::Fetch {
            what: FetchWhat::RunDetails(args.run_id.clone()),
            source,
        })?;

    Ok(ToolOutput::Text(format_run_details(&run)))
}
