//! MCP JSON-RPC server.

use base64::Engine;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};

use runlens_client::Client;

use super::dto::{
    GetRunDetailsArgs, ListMetricsArgs, ListProjectsArgs, ListRunsArgs, PlotRunMetricsArgs,
    ToolError, ToolOutput,
};
use super::tools::{
    handle_get_run_details, handle_list_metrics, handle_list_projects, handle_list_runs,
    handle_plot_run_metrics,
};

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Names and one-line descriptions of every tool, in listing order.
pub fn tool_descriptions() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "list_projects",
            "List the projects a W&B entity owns, one bullet per project.",
        ),
        (
            "list_runs",
            "List the runs in a project: name, run id, and state per line.",
        ),
        (
            "list_metrics",
            "Discover the metric names logged anywhere in a project (sorted).",
        ),
        (
            "plot_run_metrics",
            "Render the requested metrics of one run as a PNG line chart.",
        ),
        (
            "get_run_details",
            "Fetch one run's overview, config, summary, and system info.",
        ),
    ]
}

pub struct RunlensServer {
    client: Client,
}

impl RunlensServer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Convert serde deserialization error to MCP-compliant JSON-RPC error
    fn parse_validation_error(tool_name: &str, error: serde_json::Error) -> JsonRpcError {
        let error_msg = error.to_string();

        // Check if it's a "missing field" error
        if error_msg.contains("missing field") {
            if let Some(field_start) = error_msg.find('`') {
                if let Some(field_end) = error_msg[field_start + 1..].find('`') {
                    let field_name = &error_msg[field_start + 1..field_start + 1 + field_end];
                    return JsonRpcError {
                        code: -32602,
                        message: format!(
                            "Invalid params: missing required field \"{}\"",
                            field_name
                        ),
                        data: Some(json!({
                            "missing": [field_name],
                            "tool": tool_name,
                        })),
                    };
                }
            }
        }

        JsonRpcError {
            code: -32602,
            message: format!("Invalid params: {}", error),
            data: Some(json!({
                "tool": tool_name,
                "detail": error_msg,
            })),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        // MCP requires all requests to have an id, use a default if missing
        let id = request
            .id
            .clone()
            .unwrap_or_else(|| Value::Number(serde_json::Number::from(0)));

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params).await,
            "tools/list" => self.handle_list_tools(id).await,
            "tools/call" => self.handle_call_tool(id, request.params).await,
            _ => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(JsonRpcError {
                    code: -32601,
                    message: format!("Method not found: {}", request.method),
                    data: None,
                }),
            },
        }
    }

    async fn handle_initialize(&self, id: Value, _params: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "runlens",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": "runlens MCP server - read-only access to Weights & Biases experiment data. Use these tools to browse projects and runs, discover logged metrics, plot metric curves, and inspect run configuration and results."
            })),
            error: None,
        }
    }

    async fn handle_list_tools(&self, id: Value) -> JsonRpcResponse {
        // Generate JSON Schemas from Rust types - single source of truth!
        let list_projects_schema = schema_for!(ListProjectsArgs);
        let list_runs_schema = schema_for!(ListRunsArgs);
        let list_metrics_schema = schema_for!(ListMetricsArgs);
        let plot_run_metrics_schema = schema_for!(PlotRunMetricsArgs);
        let get_run_details_schema = schema_for!(GetRunDetailsArgs);

        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(json!({
                "tools": [
                    {
                        "name": "list_projects",
                        "description": "List all projects owned by a W&B entity. WORKFLOW: Call this first to discover project names, then use them with list_runs or list_metrics.",
                        "inputSchema": serde_json::to_value(&list_projects_schema).unwrap_or_default(),
                    },
                    {
                        "name": "list_runs",
                        "description": "List all runs in a project with name, run id, and state. Run ids feed plot_run_metrics and get_run_details.",
                        "inputSchema": serde_json::to_value(&list_runs_schema).unwrap_or_default(),
                    },
                    {
                        "name": "list_metrics",
                        "description": "List the unique metric names logged in a project, sorted. Samples one history row per run, so cost scales with run count.",
                        "inputSchema": serde_json::to_value(&list_metrics_schema).unwrap_or_default(),
                    },
                    {
                        "name": "plot_run_metrics",
                        "description": "Plot the requested metrics of a run as a line chart and return the PNG inline. Metrics with no logged data are skipped; if none remain a text explanation is returned instead.",
                        "inputSchema": serde_json::to_value(&plot_run_metrics_schema).unwrap_or_default(),
                    },
                    {
                        "name": "get_run_details",
                        "description": "Get detailed information about one run: overview, user config, final summary metrics, and system info.",
                        "inputSchema": serde_json::to_value(&get_run_details_schema).unwrap_or_default(),
                    }
                ]
            })),
            error: None,
        }
    }

    async fn handle_call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => {
                return JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32602,
                        message: "Missing params".to_string(),
                        data: None,
                    }),
                };
            }
        };

        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32602,
                        message: "Missing tool name".to_string(),
                        data: None,
                    }),
                };
            }
        };

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = match tool_name {
            "list_projects" => match serde_json::from_value::<ListProjectsArgs>(arguments) {
                Ok(args) => handle_list_projects(&self.client, args).await,
                Err(e) => return self.invalid_params(id, tool_name, e),
            },
            "list_runs" => match serde_json::from_value::<ListRunsArgs>(arguments) {
                Ok(args) => handle_list_runs(&self.client, args).await,
                Err(e) => return self.invalid_params(id, tool_name, e),
            },
            "list_metrics" => match serde_json::from_value::<ListMetricsArgs>(arguments) {
                Ok(args) => handle_list_metrics(&self.client, args).await,
                Err(e) => return self.invalid_params(id, tool_name, e),
            },
            "plot_run_metrics" => match serde_json::from_value::<PlotRunMetricsArgs>(arguments) {
                Ok(args) => handle_plot_run_metrics(&self.client, args).await,
                Err(e) => return self.invalid_params(id, tool_name, e),
            },
            "get_run_details" => match serde_json::from_value::<GetRunDetailsArgs>(arguments) {
                Ok(args) => handle_get_run_details(&self.client, args).await,
                Err(e) => return self.invalid_params(id, tool_name, e),
            },
            _ => {
                return JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32602,
                        message: format!("Unknown tool: {}", tool_name),
                        data: None,
                    }),
                };
            }
        };

        // Tool failures never become JSON-RPC errors: the error text is
        // the payload, rendered here at the transport boundary.
        let content = match result {
            Ok(output) => render_output(output),
            Err(error) => render_error(error),
        };

        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(json!({ "content": content })),
            error: None,
        }
    }

    fn invalid_params(
        &self,
        id: Value,
        tool_name: &str,
        error: serde_json::Error,
    ) -> JsonRpcResponse {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(Self::parse_validation_error(tool_name, error)),
        }
    }
}

fn render_output(output: ToolOutput) -> Value {
    match output {
        ToolOutput::Text(text) => json!([{ "type": "text", "text": text }]),
        ToolOutput::Png(bytes) => json!([{
            "type": "image",
            "data": base64::engine::general_purpose::STANDARD.encode(bytes),
            "mimeType": "image/png",
        }]),
    }
}

fn render_error(error: ToolError) -> Value {
    json!([{ "type": "text", "text": error.to_string() }])
}

/// Run the MCP server over stdio.
pub async fn run_server(client: Client) -> anyhow::Result<()> {
    let server = RunlensServer::new(client);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin);

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(req) => req,
            Err(e) => {
                // For parse errors, we can't get a valid id, so we use a sentinel value
                let error_response = JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id: Value::Number(serde_json::Number::from(-1)),
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32700,
                        message: format!("Parse error: {}", e),
                        data: None,
                    }),
                };
                let response_json = serde_json::to_string(&error_response)?;
                writeln!(stdout, "{}", response_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let response = server.handle_request(request).await;
        let response_json = serde_json::to_string(&response)?;
        writeln!(stdout, "{}", response_json)?;
        stdout.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use runlens_testing::{MockApi, loss_history, sample_run_info};
    use runlens_types::RunSummary;
    use std::sync::Arc;

    fn server(api: MockApi) -> RunlensServer {
        RunlensServer::new(Client::from_api(Arc::new(api)))
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    fn result(response: JsonRpcResponse) -> Value {
        assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
        response.result.expect("result")
    }

    #[tokio::test]
    async fn initialize_reports_server_info_and_tools_capability() {
        let server = server(MockApi::new());
        let result = result(server.handle_request(request("initialize", json!({}))).await);
        assert_eq!(result["serverInfo"]["name"], "runlens");
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_exposes_all_five_tools_with_schemas() {
        let server = server(MockApi::new());
        let result = result(server.handle_request(request("tools/list", json!({}))).await);
        let tools = result["tools"].as_array().unwrap();
        let names: Vec<&str> = tools
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "list_projects",
                "list_runs",
                "list_metrics",
                "plot_run_metrics",
                "get_run_details"
            ]
        );
        for tool in tools {
            assert!(tool["inputSchema"].is_object());
        }
        // One entry per tool in the human-readable table too.
        assert_eq!(tool_descriptions().len(), tools.len());
    }

    #[tokio::test]
    async fn tool_call_returns_text_content() {
        let server = server(MockApi::new().with_project("acme", "vision"));
        let result = result(
            server
                .handle_request(request(
                    "tools/call",
                    json!({"name": "list_projects", "arguments": {"entity": "acme"}}),
                ))
                .await,
        );
        let content = &result["content"][0];
        assert_eq!(content["type"], "text");
        assert_eq!(content["text"], "- vision");
    }

    #[tokio::test]
    async fn tool_failure_stays_a_successful_response() {
        let server = server(MockApi::failing("down"));
        let response = server
            .handle_request(request(
                "tools/call",
                json!({"name": "list_projects", "arguments": {"entity": "acme"}}),
            ))
            .await;
        let result = result(response);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error fetching projects: "));
    }

    #[tokio::test]
    async fn plot_call_returns_inline_png_image_content() {
        let server = server(
            MockApi::new()
                .with_run_info("acme", "vision", sample_run_info("r1"))
                .with_history("acme", "vision", "r1", loss_history()),
        );
        let result = result(
            server
                .handle_request(request(
                    "tools/call",
                    json!({
                        "name": "plot_run_metrics",
                        "arguments": {
                            "entity": "acme",
                            "project_name": "vision",
                            "run_id": "r1",
                            "metric_names": ["loss"]
                        }
                    }),
                ))
                .await,
        );
        let content = &result["content"][0];
        assert_eq!(content["type"], "image");
        assert_eq!(content["mimeType"], "image/png");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(content["data"].as_str().unwrap())
            .unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn run_listing_round_trips_through_the_wire_format() {
        let server = server(
            MockApi::new()
                .with_run("acme", "vision", RunSummary::new("r1", "brisk-dawn-1", "running")),
        );
        let result = result(
            server
                .handle_request(request(
                    "tools/call",
                    json!({
                        "name": "list_runs",
                        "arguments": {"entity": "acme", "project_name": "vision"}
                    }),
                ))
                .await,
        );
        assert_eq!(
            result["content"][0]["text"],
            "- brisk-dawn-1 (id: r1, state: running)"
        );
    }

    #[tokio::test]
    async fn unknown_method_is_32601() {
        let server = server(MockApi::new());
        let response = server.handle_request(request("resources/list", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn unknown_tool_is_32602() {
        let server = server(MockApi::new());
        let response = server
            .handle_request(request(
                "tools/call",
                json!({"name": "drop_tables", "arguments": {}}),
            ))
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn missing_params_is_32602() {
        let server = server(MockApi::new());
        let mut req = request("tools/call", json!({}));
        req.params = None;
        let response = server.handle_request(req).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn wrongly_typed_arguments_are_32602() {
        let server = server(MockApi::new());
        let response = server
            .handle_request(request(
                "tools/call",
                json!({"name": "list_runs", "arguments": {"project_name": 42}}),
            ))
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn omitted_arguments_take_the_guidance_path() {
        // All fields default, so an empty arguments object reaches the
        // handler and returns the fixed guidance string.
        let server = server(MockApi::new());
        let result = result(
            server
                .handle_request(request(
                    "tools/call",
                    json!({"name": "list_runs", "arguments": {}}),
                ))
                .await,
        );
        assert_eq!(result["content"][0]["text"], "Project name is required.");
    }
}
