use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{DriveMcpError, Result};
use crate::tools::{ToolHandler, DEFAULT_LIST_MAX, DEFAULT_SEARCH_MAX, DEFAULT_SEARCH_TERM};

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

/// Line-delimited JSON-RPC over stdio, one request in flight at a time.
/// Tool failures never surface here; the tool layer already folded them
/// into its string results.
pub async fn run_stdio(handler: Arc<ToolHandler>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = reader.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let req: RpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                write_response(
                    &mut stdout,
                    RpcResponse {
                        jsonrpc: "2.0",
                        id: Value::Null,
                        result: None,
                        error: Some(RpcError {
                            code: -32700,
                            message: format!("parse error: {e}"),
                        }),
                    },
                )
                .await?;
                continue;
            }
        };

        let resp = match req.method.as_str() {
            "initialize" => handle_initialize(&req),
            "notifications/initialized" => {
                // Notifications carry no id and expect no response.
                if req.id.is_null() {
                    continue;
                }
                RpcResponse {
                    jsonrpc: "2.0",
                    id: req.id,
                    result: Some(Value::Bool(true)),
                    error: None,
                }
            }
            "tools/list" | "list_tools" => handle_list_tools(&req),
            "tools/call" | "call_tool" => handle_call(&handler, &req).await,
            // Direct dispatch for hosts that invoke tools as plain methods.
            "list_drive_files" | "read_drive_file" | "analyze_hpc_log" | "search_hpc_logs" => {
                match dispatch_tool(&handler, &req.method, req.params.clone()).await {
                    Ok(text) => RpcResponse {
                        jsonrpc: "2.0",
                        id: req.id.clone(),
                        result: Some(tool_result(text)),
                        error: None,
                    },
                    Err(e) => rpc_error(&req, -32602, e.to_string()),
                }
            }
            _ => rpc_error(&req, -32601, format!("method not found: {}", req.method)),
        };

        write_response(&mut stdout, resp).await?;
    }

    Ok(())
}

fn handle_initialize(req: &RpcRequest) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0",
        id: req.id.clone(),
        result: Some(serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "gdrive-hpc-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        })),
        error: None,
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

async fn handle_call(handler: &ToolHandler, req: &RpcRequest) -> RpcResponse {
    let params: CallParams = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => return rpc_error(req, -32602, format!("invalid params: {e}")),
    };

    match dispatch_tool(handler, &params.name, params.arguments).await {
        Ok(text) => RpcResponse {
            jsonrpc: "2.0",
            id: req.id.clone(),
            result: Some(tool_result(text)),
            error: None,
        },
        Err(e) => rpc_error(req, -32602, e.to_string()),
    }
}

async fn dispatch_tool(handler: &ToolHandler, name: &str, args: Value) -> Result<String> {
    match name {
        "list_drive_files" => {
            let p: ListFilesParams = parse_args(args)?;
            Ok(handler
                .list_drive_files(&p.query, p.max_results, p.folder_id.as_deref())
                .await)
        }
        "read_drive_file" => {
            let p: FileIdParams = parse_args(args)?;
            Ok(handler.read_drive_file(&p.file_id).await)
        }
        "analyze_hpc_log" => {
            let p: FileIdParams = parse_args(args)?;
            Ok(handler.analyze_hpc_log(&p.file_id).await)
        }
        "search_hpc_logs" => {
            let p: SearchLogsParams = parse_args(args)?;
            Ok(handler
                .search_hpc_logs(&p.search_term, p.folder_id.as_deref(), p.max_results)
                .await)
        }
        other => Err(DriveMcpError::InvalidRequest(format!(
            "unknown tool: {other}"
        ))),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    // Hosts send missing arguments as null; treat that as an empty object.
    let args = if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| DriveMcpError::InvalidRequest(format!("invalid arguments: {e}")))
}

fn tool_result(text: String) -> Value {
    serde_json::json!({
        "content": [{ "type": "text", "text": text }]
    })
}

#[derive(Debug, Deserialize)]
struct ListFilesParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_list_max")]
    pub max_results: u32,
    #[serde(default)]
    pub folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileIdParams {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchLogsParams {
    #[serde(default = "default_search_term")]
    pub search_term: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default = "default_search_max")]
    pub max_results: u32,
}

fn default_list_max() -> u32 {
    DEFAULT_LIST_MAX
}

fn default_search_max() -> u32 {
    DEFAULT_SEARCH_MAX
}

fn default_search_term() -> String {
    DEFAULT_SEARCH_TERM.to_string()
}

fn handle_list_tools(req: &RpcRequest) -> RpcResponse {
    let tools = vec![
        serde_json::json!({
            "name": "list_drive_files",
            "description": "List files in Google Drive matching an optional query, scoped to a folder if given.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Drive search query, e.g. \"name contains 'log'\"" },
                    "max_results": { "type": "integer", "default": DEFAULT_LIST_MAX },
                    "folder_id": { "type": ["string", "null"] }
                }
            }
        }),
        serde_json::json!({
            "name": "read_drive_file",
            "description": "Read the full content of a Google Drive file as text.",
            "inputSchema": {
                "type": "object",
                "required": ["file_id"],
                "properties": {
                    "file_id": { "type": "string" }
                }
            }
        }),
        serde_json::json!({
            "name": "analyze_hpc_log",
            "description": "Download an HPC job log from Google Drive and report error/warning lines with remediation suggestions.",
            "inputSchema": {
                "type": "object",
                "required": ["file_id"],
                "properties": {
                    "file_id": { "type": "string" }
                }
            }
        }),
        serde_json::json!({
            "name": "search_hpc_logs",
            "description": "Search Google Drive for HPC log files (.log/.out/.err by default, or by name).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "search_term": { "type": "string", "default": DEFAULT_SEARCH_TERM },
                    "folder_id": { "type": ["string", "null"] },
                    "max_results": { "type": "integer", "default": DEFAULT_SEARCH_MAX }
                }
            }
        }),
    ];

    RpcResponse {
        jsonrpc: "2.0",
        id: req.id.clone(),
        result: Some(serde_json::json!({ "tools": tools })),
        error: None,
    }
}

async fn write_response(stdout: &mut tokio::io::Stdout, resp: RpcResponse) -> Result<()> {
    let line = serde_json::to_string(&resp).unwrap_or_else(|_| "{}".to_string());
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

fn rpc_error(req: &RpcRequest, code: i32, message: String) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0",
        id: req.id.clone(),
        result: None,
        error: Some(RpcError { code, message }),
    }
}
