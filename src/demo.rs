//! Small MCP server exposing `hello`, `add` and `multiply`.
//!
//! Serves as a stand-in upstream for the `demo-upstream` binary and for
//! tests. Every invocation is appended to an optional [`CallLog`], which lets
//! tests prove whether a call ever reached the upstream.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, JsonObject, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Names of the tools invoked on a [`DemoServer`], in arrival order
pub type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Default)]
pub struct DemoServer {
    calls: CallLog,
}

impl DemoServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record invocations into a log shared with the caller
    pub fn with_call_log(calls: CallLog) -> Self {
        Self { calls }
    }

    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    pub fn tools() -> Vec<Tool> {
        vec![
            Tool::new(
                "hello",
                "Say hello to someone",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "The name to say hello to" }
                    },
                    "required": ["name"]
                })),
            ),
            Tool::new("add", "Add two numbers", number_pair_schema()),
            Tool::new("multiply", "Multiply two numbers", number_pair_schema()),
        ]
    }

    fn run(&self, name: &str, args: &JsonObject) -> Result<CallToolResult, McpError> {
        match name {
            "hello" => {
                let who = match args.get("name") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => return Err(McpError::invalid_params("Missing argument 'name'", None)),
                };
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Hello, {}!",
                    who
                ))]))
            }
            "add" => {
                let (a, b) = number_pair(args)?;
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Result: {}",
                    a + b
                ))]))
            }
            "multiply" => {
                let (a, b) = number_pair(args)?;
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Result: {}",
                    a * b
                ))]))
            }
            other => Err(McpError::invalid_params(
                format!("Unknown tool: {}", other),
                None,
            )),
        }
    }
}

fn schema(value: Value) -> Arc<JsonObject> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

fn number_pair_schema() -> Arc<JsonObject> {
    schema(json!({
        "type": "object",
        "properties": {
            "a": { "type": "number", "description": "First number" },
            "b": { "type": "number", "description": "Second number" }
        },
        "required": ["a", "b"]
    }))
}

fn number_pair(args: &JsonObject) -> Result<(f64, f64), McpError> {
    let get = |key: &str| {
        args.get(key).and_then(Value::as_f64).ok_or_else(|| {
            McpError::invalid_params(format!("Missing numeric argument '{}'", key), None)
        })
    };
    Ok((get("a")?, get("b")?))
}

impl ServerHandler for DemoServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Demo MCP server with hello, add and multiply tools".to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            meta: None,
            tools: Self::tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Demo server calling tool: {}", params.name);
        self.calls.lock().await.push(params.name.to_string());

        let args = params.arguments.unwrap_or_default();
        self.run(&params.name, &args)
    }
}
