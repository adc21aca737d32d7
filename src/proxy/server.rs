// Downstream MCP server that exposes the filtered tool catalog and forwards
// allowed calls to the upstream session.

use crate::error::{Result, WrapperError};
use crate::mcp::ToolBackend;
use crate::routing::{filter_tools, unmatched_names, AllowList};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, ServiceError};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// MCP server handler that only lets allow-listed tools through.
///
/// The catalog is a snapshot taken once when the proxy is built; later
/// upstream changes are not observed.
#[derive(Clone)]
pub struct FilteringProxy {
    backend: Arc<dyn ToolBackend>,
    allowed: Arc<AllowList>,
    tools: Arc<Vec<Tool>>,
    upstream_name: String,
}

impl FilteringProxy {
    /// Build a proxy over an already filtered catalog
    pub fn new(
        backend: Arc<dyn ToolBackend>,
        allowed: AllowList,
        tools: Vec<Tool>,
        upstream_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            allowed: Arc::new(allowed),
            tools: Arc::new(tools),
            upstream_name: upstream_name.into(),
        }
    }

    /// Fetch the upstream catalog once and build a proxy over its allowed part
    pub async fn from_backend(
        backend: Arc<dyn ToolBackend>,
        allowed: AllowList,
        upstream_name: impl Into<String>,
    ) -> Result<Self> {
        let upstream_name = upstream_name.into();
        let catalog = backend.fetch_tools().await.map_err(|e| {
            error!("Failed to list tools for {}: {}", upstream_name, e);
            WrapperError::connection(&upstream_name, format!("failed to list tools: {}", e))
        })?;

        let tools = filter_tools(&catalog, &allowed);
        let unmatched = unmatched_names(&catalog, &allowed);
        if !unmatched.is_empty() {
            warn!(
                "Allowed tools not offered by {}: {}",
                upstream_name,
                unmatched.join(", ")
            );
        }

        info!(
            "Exposing {} of {} tools from {}",
            tools.len(),
            catalog.len(),
            upstream_name
        );

        Ok(Self::new(backend, allowed, tools, upstream_name))
    }

    /// The filtered catalog served to downstream clients
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn allowed(&self) -> &AllowList {
        &self.allowed
    }

    /// Forward a call to the upstream if its tool is allowed.
    ///
    /// Disallowed names are rejected without contacting the upstream. The
    /// upstream's result, and any MCP error it reports, is returned unchanged.
    pub async fn forward_call(
        &self,
        params: CallToolRequestParams,
    ) -> std::result::Result<CallToolResult, McpError> {
        if !self.allowed.allows(&params.name) {
            warn!("Rejected call to tool not in allow list: {}", params.name);
            return Err(WrapperError::ToolNotFound(params.name.to_string()).into_mcp_error());
        }

        let name = params.name.clone();
        debug!("Forwarding call to tool '{}' on {}", name, self.upstream_name);

        match self.backend.invoke_tool(params).await {
            Ok(result) => Ok(result),
            Err(ServiceError::McpError(err)) => {
                debug!("Upstream reported an error for '{}': {}", name, err.message);
                Err(err)
            }
            Err(e) => {
                error!(
                    "Failed to call tool '{}' on {}: {}",
                    name, self.upstream_name, e
                );
                Err(WrapperError::UpstreamCall(e.to_string()).into_mcp_error())
            }
        }
    }
}

impl ServerHandler for FilteringProxy {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "Filtered proxy to {} MCP server",
                self.upstream_name
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        debug!("Proxy listing {} tools", self.tools.len());
        Ok(ListToolsResult {
            meta: None,
            tools: self.tools.as_ref().clone(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.forward_call(params).await
    }
}
