//! img2mosaic MCP (Model Context Protocol) server
//!
//! A standalone binary speaking line-delimited JSON-RPC on stdin/stdout. It
//! exposes a single `generate_mosaic` tool.

use img2mosaic::{convert, MosaicOptions};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// MCP Request structure
#[derive(Debug, serde::Deserialize)]
struct McpRequest {
    #[serde(default)]
    #[allow(dead_code)]
    jsonrpc: String,
    #[serde(flatten)]
    kind: RequestKind,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "method")]
enum RequestKind {
    #[serde(rename = "initialize")]
    Initialize {
        id: Value,
        #[serde(default)]
        params: Value,
    },
    #[serde(rename = "tools/list")]
    ToolsList { id: Value },
    #[serde(rename = "tools/call")]
    ToolsCall { id: Value, params: ToolCallParams },
}

#[derive(Debug, serde::Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// MCP Response structure
#[derive(Debug, serde::Serialize)]
struct McpResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, serde::Serialize)]
struct McpError {
    code: i32,
    message: String,
}

impl McpResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError { code, message }),
        }
    }
}

struct MosaicMcpServer;

impl MosaicMcpServer {
    fn handle_initialize(&self, _params: Value, id: Value) -> McpResponse {
        McpResponse::ok(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {
                    "name": "img2mosaic",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> McpResponse {
        McpResponse::ok(
            id,
            json!({
                "tools": [
                    {
                        "name": "generate_mosaic",
                        "description": "Convert a raster image (PNG, JPEG, etc.) into an SVG artificial mosaic. Square tiles are laid along lines that follow the image edges, gaps are filled with a second pass of tiles, and every tile takes the average color of the pixels it covers.",
                        "inputSchema": {
                            "type": "object",
                            "properties": {
                                "input_path": {
                                    "type": "string",
                                    "description": "Path to the input image file (PNG, JPEG, etc.)"
                                },
                                "output_path": {
                                    "type": "string",
                                    "description": "Path where the SVG mosaic will be saved"
                                },
                                "half_tile": {
                                    "type": "number",
                                    "description": "Nominal tile radius in pixels (default: 8). Smaller tiles follow detail more closely but produce many more paths.",
                                    "minimum": 1.0,
                                    "default": 8.0
                                },
                                "seed": {
                                    "type": "integer",
                                    "description": "Random seed for tile size jitter (default: 0). The same seed reproduces the same mosaic.",
                                    "minimum": 0,
                                    "default": 0
                                },
                                "make_convex": {
                                    "type": "boolean",
                                    "description": "Replace concave tiles by convex ones (default: true)",
                                    "default": true
                                }
                            },
                            "required": ["input_path", "output_path"]
                        }
                    }
                ]
            }),
        )
    }

    fn handle_tools_call(&self, params: ToolCallParams, id: Value) -> McpResponse {
        if params.name != "generate_mosaic" {
            return McpResponse::error(id, -32601, format!("Unknown tool: {}", params.name));
        }
        let Value::Object(args) = params.arguments else {
            return McpResponse::error(id, -32602, "Invalid arguments: expected object".to_string());
        };

        let input_path = args.get("input_path").and_then(|v| v.as_str());
        let output_path = args.get("output_path").and_then(|v| v.as_str());
        let (Some(input), Some(output)) = (input_path, output_path) else {
            return McpResponse::error(
                id,
                -32602,
                "Missing required parameters: input_path and output_path".to_string(),
            );
        };

        let defaults = MosaicOptions::default();
        let options = MosaicOptions {
            half_tile: args.get("half_tile").and_then(|v| v.as_f64()).unwrap_or(defaults.half_tile),
            seed: args.get("seed").and_then(|v| v.as_u64()).unwrap_or(defaults.seed),
            make_convex: args.get("make_convex").and_then(|v| v.as_bool()).unwrap_or(defaults.make_convex),
            ..defaults
        };

        match convert(Path::new(input), Path::new(output), &options) {
            Ok(mosaic) => {
                let mut text = format!(
                    "Generated a mosaic of {} tiles from {} at {}",
                    mosaic.final_tiles.len(),
                    input,
                    output
                );
                for warning in &mosaic.warnings {
                    text.push_str(&format!("\nwarning: {warning}"));
                }
                McpResponse::ok(
                    id,
                    json!({
                        "content": [
                            {
                                "type": "text",
                                "text": text
                            }
                        ]
                    }),
                )
            }
            Err(e) => McpResponse::error(id, -32000, format!("Mosaic generation failed: {}", e)),
        }
    }

    fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let req = serde_json::from_str::<McpRequest>(line).ok()?;
        Some(match req.kind {
            RequestKind::Initialize { id, params } => self.handle_initialize(params, id),
            RequestKind::ToolsList { id } => self.handle_tools_list(id),
            RequestKind::ToolsCall { id, params } => self.handle_tools_call(params, id),
        })
    }

    fn run(&self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout_lock = stdout.lock();

        for line in stdin.lock().lines().map_while(Result::ok) {
            if let Some(response) = self.handle_line(&line) {
                if let Ok(response_json) = serde_json::to_string(&response) {
                    writeln!(stdout_lock, "{}", response_json).ok();
                    stdout_lock.flush().ok();
                }
            }
        }
    }
}

fn main() {
    let server = MosaicMcpServer;
    server.run();
}
