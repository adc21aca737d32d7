use crate::error::{Result, WrapperError};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::IntoTransport;
use rmcp::ServiceExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client side of an initialized upstream MCP connection
pub type UpstreamClient = RunningService<RoleClient, ()>;

/// Run the MCP handshake over `transport`, bounded by `timeout`.
///
/// On timeout the pending handshake is cancelled before the error is returned.
pub(crate) async fn handshake<T, E, A>(
    target: &str,
    transport: T,
    timeout: Duration,
) -> Result<UpstreamClient>
where
    T: IntoTransport<RoleClient, E, A>,
    E: std::error::Error + Send + Sync + 'static,
{
    info!("Initializing MCP client for upstream: {}", target);

    let ct = CancellationToken::new();
    let ct_clone = ct.clone();

    let client = tokio::time::timeout(timeout, async {
        ().serve_with_ct(transport, ct_clone).await
    })
    .await
    .map_err(|_| {
        ct.cancel();
        WrapperError::HandshakeTimeout {
            target: target.to_string(),
            timeout,
        }
    })?
    .map_err(|e| WrapperError::connection(target, format!("MCP handshake failed: {}", e)))?;

    if let Some(info) = client.peer_info() {
        debug!(
            "Upstream {} identified as {} {}",
            target, info.server_info.name, info.server_info.version
        );
    }

    info!("MCP client initialized for upstream: {}", target);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handshake_times_out_on_silent_peer() {
        // Nobody ever answers on the other end of the pipe
        let (client_io, _server_io) = tokio::io::duplex(1024);
        let transport = tokio::io::split(client_io);

        let result = handshake("silent", transport, Duration::from_millis(100)).await;
        match result {
            Err(WrapperError::HandshakeTimeout { target, timeout }) => {
                assert_eq!(target, "silent");
                assert_eq!(timeout, Duration::from_millis(100));
            }
            Err(other) => panic!("expected handshake timeout, got {}", other),
            Ok(_) => panic!("handshake should not succeed without a server"),
        }
    }

    #[tokio::test]
    async fn test_handshake_fails_on_closed_peer() {
        let (client_io, server_io) = tokio::io::duplex(1024);
        drop(server_io);
        let transport = tokio::io::split(client_io);

        let err = handshake("closed", transport, Duration::from_secs(5))
            .await
            .err()
            .expect("handshake should fail");
        assert!(err.is_connection_error());
    }
}
