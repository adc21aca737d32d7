use anyhow::Result;
use rmcp::{transport::stdio, ServiceExt};
use rusted_wrapper::demo::DemoServer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Stand-alone demo MCP server on stdio, used as a spawnable upstream
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .init();

    info!("Starting demo upstream MCP server");
    let service = DemoServer::new().serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
