use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, Tool};
use rmcp::service::{Peer, RoleClient, ServiceError};

/// The upstream operations the proxy depends on.
///
/// Implemented for the rmcp client peer; tests substitute recording fakes.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Fetch the complete tool catalog, following pagination
    async fn fetch_tools(&self) -> Result<Vec<Tool>, ServiceError>;

    /// Invoke a tool and return the upstream's answer untouched
    async fn invoke_tool(
        &self,
        params: CallToolRequestParams,
    ) -> Result<CallToolResult, ServiceError>;
}

#[async_trait]
impl ToolBackend for Peer<RoleClient> {
    async fn fetch_tools(&self) -> Result<Vec<Tool>, ServiceError> {
        self.list_all_tools().await
    }

    async fn invoke_tool(
        &self,
        params: CallToolRequestParams,
    ) -> Result<CallToolResult, ServiceError> {
        self.call_tool(params).await
    }
}
