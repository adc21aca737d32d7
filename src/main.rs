use anyhow::{Context, Result};
use clap::Parser;
use rusted_wrapper::config::{self, AppConfig, WrapperConfig};
use rusted_wrapper::ServerWrapper;
use std::path::PathBuf;
use tracing::{error, info};

const USAGE: &str = "Usage: rusted-wrapper [OPTIONS] <UPSTREAM_TARGET> <TOOL>...

  UPSTREAM_TARGET  local script or executable, npm:/jsr:/pypi: package, or http(s) URL
  TOOL             name of an upstream tool to expose (at least one)

Run with --help for all options.";

#[derive(Parser, Debug)]
#[command(name = "rusted-wrapper")]
#[command(about = "Expose a filtered subset of an MCP server's tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Upstream MCP server: local path, npm:/jsr:/pypi: package or http(s) URL
    upstream_target: Option<String>,

    /// Tool names to expose downstream
    tools: Vec<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to wait for the upstream MCP handshake
    #[arg(long, env = "RUSTED_WRAPPER_CONNECT_TIMEOUT")]
    connect_timeout: Option<u64>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Override log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Remote upstreams use reqwest over rustls; pick the provider before any TLS
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.config.is_none() && (cli.upstream_target.is_none() || cli.tools.is_empty()) {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let mut app_config = match &cli.config {
        Some(path) => config::load_config(path).with_context(|| {
            format!("Failed to load configuration from: {}", path.display())
        })?,
        None => AppConfig::default(),
    };

    if let Some(log_level) = cli.log_level {
        app_config.logging.level = log_level;
    }
    if let Some(log_format) = cli.log_format {
        app_config.logging.format = log_format;
    }
    config::validate_logging(&app_config.logging)?;

    init_logging(&app_config.logging)?;

    let wrapper_config = config::build_wrapper_config(
        &app_config,
        cli.upstream_target,
        cli.tools,
        cli.connect_timeout,
    )?;

    print_banner(&wrapper_config);

    run(ServerWrapper::new(wrapper_config)).await
}

async fn run(mut wrapper: ServerWrapper) -> Result<()> {
    let started = tokio::select! {
        result = wrapper.start() => Some(result),
        _ = shutdown_signal() => None,
    };

    match started {
        Some(Ok(())) => {
            info!("Wrapper ready; waiting for shutdown signal");
            shutdown_signal().await;
            wrapper.stop().await;
            Ok(())
        }
        Some(Err(e)) => {
            error!("Wrapper failed to start: {}", e);
            wrapper.stop().await;
            Err(e).context("Failed to start MCP server wrapper")
        }
        None => {
            info!("Shutdown requested during startup");
            wrapper.stop().await;
            Ok(())
        }
    }
}

fn init_logging(config: &config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // stdout carries the MCP protocol, so logs always go to stderr
    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn print_banner(config: &WrapperConfig) {
    info!("rusted-wrapper v{}", env!("CARGO_PKG_VERSION"));
    info!("  → Upstream: {}", config.upstream_target());
    info!(
        "  → Allowed tools: {}",
        config.allowed_tools().iter().collect::<Vec<_>>().join(", ")
    );
    info!("  → Connect timeout: {:?}", config.connect_timeout());
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
