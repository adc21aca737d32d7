use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::mcp::ToolBackend;
use crate::proxy::FilteringProxy;
use crate::upstream::{self, ModuleLoader, UpstreamSession};
use rmcp::service::{RoleServer, RunningService};
use rmcp::transport::IntoTransport;
use rmcp::ServiceExt;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Lifecycle of a [`ServerWrapper`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperState {
    Idle,
    Connecting,
    Serving,
    Stopping,
    Stopped,
}

impl fmt::Display for WrapperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WrapperState::Idle => "idle",
            WrapperState::Connecting => "connecting",
            WrapperState::Serving => "serving",
            WrapperState::Stopping => "stopping",
            WrapperState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Connects to one upstream MCP server and re-serves a filtered subset of
/// its tools to a single downstream client.
pub struct ServerWrapper {
    config: WrapperConfig,
    loader: Option<Arc<dyn ModuleLoader>>,
    state: WrapperState,
    downstream: Option<RunningService<RoleServer, FilteringProxy>>,
    upstream: Option<UpstreamSession>,
}

impl ServerWrapper {
    pub fn new(config: WrapperConfig) -> Self {
        Self {
            config,
            loader: None,
            state: WrapperState::Idle,
            downstream: None,
            upstream: None,
        }
    }

    /// Resolve module targets through `loader`
    pub fn with_module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn state(&self) -> WrapperState {
        self.state
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    /// Names of the tools offered downstream; empty unless serving
    pub fn exposed_tools(&self) -> Vec<String> {
        self.downstream
            .as_ref()
            .map(|service| {
                service
                    .service()
                    .tools()
                    .iter()
                    .map(|tool| tool.name.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The live upstream session, if connected
    pub fn upstream(&self) -> Option<&UpstreamSession> {
        self.upstream.as_ref()
    }

    /// Connect to the upstream and serve the filtered tools on stdio
    pub async fn start(&mut self) -> Result<()> {
        self.start_with(rmcp::transport::stdio()).await
    }

    /// Connect to the upstream and serve the filtered tools on `transport`.
    ///
    /// Only valid from `Idle` or `Stopped`. On failure everything acquired so
    /// far is released, the wrapper ends up `Stopped` and the original error
    /// is returned.
    pub async fn start_with<T, E, A>(&mut self, transport: T) -> Result<()>
    where
        T: IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        match self.state {
            WrapperState::Idle | WrapperState::Stopped => {}
            other => {
                return Err(WrapperError::InvalidState(format!(
                    "cannot start while {}",
                    other
                )))
            }
        }

        info!("Starting wrapper for upstream: {}", self.config.upstream_target());
        self.state = WrapperState::Connecting;

        match self.try_start(transport).await {
            Ok(()) => {
                self.state = WrapperState::Serving;
                info!(
                    "Serving {} filtered tools from {}",
                    self.exposed_tools().len(),
                    self.config.upstream_target()
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to start wrapper: {}", e);
                self.shutdown().await;
                Err(e)
            }
        }
    }

    async fn try_start<T, E, A>(&mut self, transport: T) -> Result<()>
    where
        T: IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let session = upstream::connect(&self.config, self.loader.as_deref()).await?;
        let backend: Arc<dyn ToolBackend> = Arc::new(session.peer().clone());
        self.upstream = Some(session);

        // The catalog fetch is part of connecting and shares its deadline
        let timeout = self.config.connect_timeout();
        let proxy = tokio::time::timeout(
            timeout,
            FilteringProxy::from_backend(
                backend,
                self.config.allowed_tools().clone(),
                self.config.upstream_target(),
            ),
        )
        .await
        .map_err(|_| {
            WrapperError::connection(
                self.config.upstream_target(),
                format!("listing tools timed out after {:?}", timeout),
            )
        })??;

        let service = proxy
            .serve(transport)
            .await
            .map_err(|e| WrapperError::Downstream(e.to_string()))?;
        self.downstream = Some(service);

        Ok(())
    }

    /// Tear everything down. Safe to call in any state, any number of times.
    pub async fn stop(&mut self) {
        if self.state == WrapperState::Stopped
            && self.downstream.is_none()
            && self.upstream.is_none()
        {
            return;
        }
        info!("Stopping wrapper for upstream: {}", self.config.upstream_target());
        self.shutdown().await;
    }

    async fn shutdown(&mut self) {
        self.state = WrapperState::Stopping;

        if let Some(downstream) = self.downstream.take() {
            if let Err(e) = downstream.cancel().await {
                warn!("Failed to stop downstream server: {}", e);
            }
        }

        if let Some(upstream) = self.upstream.take() {
            // close() already logs each failed step
            let _ = upstream.close().await;
        }

        self.state = WrapperState::Stopped;
        info!("Wrapper stopped");
    }
}
