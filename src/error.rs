use rmcp::ErrorData as McpError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WrapperError {
    #[error("Unsupported upstream target: {0}")]
    UnsupportedTarget(String),

    #[error("Failed to connect to upstream {target}: {reason}")]
    Connection { target: String, reason: String },

    #[error("MCP handshake with upstream {target} timed out after {timeout:?}")]
    HandshakeTimeout { target: String, timeout: Duration },

    #[error("Invalid upstream module: {0}")]
    InvalidUpstreamModule(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Upstream call failed: {0}")]
    UpstreamCall(String),

    #[error("Failed to start downstream server: {0}")]
    Downstream(String),

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    #[error("Invalid wrapper state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, WrapperError>;

impl WrapperError {
    pub(crate) fn connection(target: &str, reason: impl std::fmt::Display) -> Self {
        WrapperError::Connection {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the upstream could not be reached or initialized.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            WrapperError::UnsupportedTarget(_)
                | WrapperError::Connection { .. }
                | WrapperError::HandshakeTimeout { .. }
        )
    }

    /// Convert into the JSON-RPC error returned to a downstream caller
    pub fn into_mcp_error(self) -> McpError {
        match self {
            WrapperError::ToolNotFound(name) => McpError::invalid_params(
                format!("Tool not found: {}", name),
                Some(serde_json::json!({ "tool": name })),
            ),
            other => McpError::internal_error(other.to_string(), None),
        }
    }
}

impl From<WrapperError> for McpError {
    fn from(err: WrapperError) -> Self {
        err.into_mcp_error()
    }
}
