use super::UpstreamSession;
use crate::error::Result;
use crate::mcp::handshake;
use rmcp::transport::StreamableHttpClientTransport;
use std::time::Duration;
use tracing::info;

/// Connect to an upstream served over streamable HTTP
pub(crate) async fn connect(url: &str, timeout: Duration) -> Result<UpstreamSession> {
    info!("Connecting to remote upstream MCP server at {}", url);

    let transport = StreamableHttpClientTransport::from_uri(url);
    let client = handshake(url, transport, timeout).await?;

    Ok(UpstreamSession::Remote { client })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_unreachable_remote_fails() {
        // Nothing listens on port 9 of the loopback interface
        let result = connect("http://127.0.0.1:9/mcp", Duration::from_secs(5)).await;

        let err = result.err().expect("connection should fail");
        assert!(err.is_connection_error());
    }
}
