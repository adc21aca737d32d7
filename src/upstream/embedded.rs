//! In-process upstream servers.
//!
//! A target that is neither a local path, a package reference nor a URL names
//! a module. The embedding application decides what modules exist by
//! supplying a [`ModuleLoader`]; the loader hands back a server built by the
//! module's `create_server` factory, which is then driven over an in-memory
//! pipe exactly like a spawned process would be driven over its stdio.

use super::UpstreamSession;
use crate::error::{Result, WrapperError};
use crate::mcp::handshake;
use async_trait::async_trait;
use dashmap::DashMap;
use rmcp::service::{DynService, RoleServer};
use rmcp::{ServerHandler, ServiceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Type-erased MCP server produced by a module factory
pub type BoxedServer = Box<dyn DynService<RoleServer>>;

type ServerFactory = Arc<dyn Fn() -> BoxedServer + Send + Sync>;

const PIPE_BUFFER: usize = 64 * 1024;

/// Resolves module names to in-process MCP servers
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Build a fresh server for `module`, or `None` if the module has no
    /// `create_server` factory.
    async fn create_server(&self, module: &str) -> Option<BoxedServer>;
}

/// [`ModuleLoader`] backed by factories registered at runtime
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    factories: Arc<DashMap<String, ServerFactory>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `create_server` factory of a module, replacing any
    /// previous one under the same name
    pub fn register<F, S>(&self, module: impl Into<String>, factory: F)
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: ServerHandler,
    {
        let module = module.into();
        debug!("Registering in-process MCP module: {}", module);
        self.factories
            .insert(module, Arc::new(move || factory().into_dyn()));
    }

    pub fn contains(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[async_trait]
impl ModuleLoader for ModuleRegistry {
    async fn create_server(&self, module: &str) -> Option<BoxedServer> {
        let factory = self.factories.get(module).map(|f| Arc::clone(f.value()))?;
        Some(factory())
    }
}

/// Load `module` through `loader` and connect a client to it
pub(crate) async fn connect(
    module: &str,
    loader: &dyn ModuleLoader,
    timeout: Duration,
) -> Result<UpstreamSession> {
    info!("Loading in-process upstream module: {}", module);

    let server = loader.create_server(module).await.ok_or_else(|| {
        WrapperError::InvalidUpstreamModule(format!(
            "module '{}' does not provide a create_server factory",
            module
        ))
    })?;

    let (server_io, client_io) = tokio::io::duplex(PIPE_BUFFER);
    let server_task = tokio::spawn(async move { server.serve(tokio::io::split(server_io)).await });

    let client = match handshake(module, tokio::io::split(client_io), timeout).await {
        Ok(client) => client,
        Err(e) => {
            server_task.abort();
            return Err(e);
        }
    };

    let server = server_task
        .await
        .map_err(|e| WrapperError::connection(module, format!("server task failed: {}", e)))?
        .map_err(|e| {
            WrapperError::connection(module, format!("server failed to initialize: {}", e))
        })?;

    Ok(UpstreamSession::Embedded { server, client })
}
