pub mod embedded;
pub(crate) mod local;
pub(crate) mod remote;
pub mod target;

pub use embedded::{BoxedServer, ModuleLoader, ModuleRegistry};
pub use target::{Interpreter, LaunchCommand, PackageRegistry, UpstreamTarget};

use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::mcp::UpstreamClient;
use rmcp::service::{Peer, RoleClient, RoleServer, RunningService};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A live connection to the wrapped MCP server.
///
/// Each variant owns exactly the resources its connection mode needs, so
/// teardown never has to guess which of them exist.
pub enum UpstreamSession {
    /// Child process speaking MCP over its stdin/stdout
    Spawned {
        child: Child,
        client: UpstreamClient,
        stderr_task: Option<JoinHandle<()>>,
    },
    /// In-process server from a module loader, connected over a memory pipe
    Embedded {
        server: RunningService<RoleServer, BoxedServer>,
        client: UpstreamClient,
    },
    /// Streamable HTTP endpoint
    Remote { client: UpstreamClient },
}

impl UpstreamSession {
    /// Peer used to list and call tools on the upstream
    pub fn peer(&self) -> &Peer<RoleClient> {
        match self {
            UpstreamSession::Spawned { client, .. }
            | UpstreamSession::Embedded { client, .. }
            | UpstreamSession::Remote { client } => client.peer(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamSession::Spawned { .. } => "spawned",
            UpstreamSession::Embedded { .. } => "embedded",
            UpstreamSession::Remote { .. } => "remote",
        }
    }

    /// OS process id of a spawned upstream that has not been reaped yet
    pub fn process_id(&self) -> Option<u32> {
        match self {
            UpstreamSession::Spawned { child, .. } => child.id(),
            _ => None,
        }
    }

    /// Close the client connection, then terminate whatever backs it.
    ///
    /// Every step runs even if an earlier one failed; the first failure is
    /// returned.
    pub async fn close(self) -> Result<()> {
        let kind = self.kind();
        debug!("Closing {} upstream session", kind);

        let mut first_error = None;
        let mut record = |err: WrapperError| {
            warn!("{}", err);
            if first_error.is_none() {
                first_error = Some(err);
            }
        };

        match self {
            UpstreamSession::Spawned {
                mut child,
                client,
                stderr_task,
            } => {
                if let Err(e) = client.cancel().await {
                    record(WrapperError::Cleanup(format!(
                        "failed to close upstream client: {}",
                        e
                    )));
                }
                if let Err(e) = child.kill().await {
                    record(WrapperError::Cleanup(format!(
                        "failed to kill upstream process: {}",
                        e
                    )));
                }
                if let Some(task) = stderr_task {
                    task.abort();
                }
            }
            UpstreamSession::Embedded { server, client } => {
                if let Err(e) = client.cancel().await {
                    record(WrapperError::Cleanup(format!(
                        "failed to close upstream client: {}",
                        e
                    )));
                }
                if let Err(e) = server.cancel().await {
                    record(WrapperError::Cleanup(format!(
                        "failed to stop in-process upstream server: {}",
                        e
                    )));
                }
            }
            UpstreamSession::Remote { client } => {
                if let Err(e) = client.cancel().await {
                    record(WrapperError::Cleanup(format!(
                        "failed to close upstream client: {}",
                        e
                    )));
                }
            }
        }

        info!("Closed {} upstream session", kind);
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Establish a session with the upstream named by the configuration.
///
/// Module targets need a `loader`; without one they are unsupported.
pub async fn connect(
    config: &WrapperConfig,
    loader: Option<&dyn ModuleLoader>,
) -> Result<UpstreamSession> {
    let target = UpstreamTarget::parse(config.upstream_target())?;
    let timeout = config.connect_timeout();
    debug!(
        "Upstream target {} classified as {}",
        config.upstream_target(),
        target.kind()
    );

    match &target {
        UpstreamTarget::Remote { url } => remote::connect(url, timeout).await,
        UpstreamTarget::Module { name } => match loader {
            Some(loader) => embedded::connect(name, loader, timeout).await,
            None => Err(WrapperError::UnsupportedTarget(format!(
                "'{}' is not a local path, package reference or URL",
                name
            ))),
        },
        _ => {
            let command = target.launch_command().ok_or_else(|| {
                WrapperError::UnsupportedTarget(config.upstream_target().to_string())
            })?;
            local::spawn(config.upstream_target(), &command, config.env(), timeout).await
        }
    }
}
