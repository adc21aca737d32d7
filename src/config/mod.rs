pub mod types;

use anyhow::{Context, Result};
use config::{Config, File};
use std::path::Path;
use std::time::Duration;
pub use types::*;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();

    let config = Config::builder()
        .add_source(File::from(path))
        .build()
        .with_context(|| format!("Failed to load config from: {}", path.display()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    validate_logging(&app_config.logging)?;

    Ok(app_config)
}

/// Validate the logging section
pub fn validate_logging(logging: &LoggingConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&logging.level.as_str()) {
        anyhow::bail!(
            "Invalid log level '{}'. Valid levels: {}",
            logging.level,
            valid_levels.join(", ")
        );
    }

    let valid_formats = ["pretty", "json"];
    if !valid_formats.contains(&logging.format.as_str()) {
        anyhow::bail!(
            "Invalid log format '{}'. Valid formats: {}",
            logging.format,
            valid_formats.join(", ")
        );
    }

    Ok(())
}

/// Build the wrapper configuration from the file config.
///
/// `target` and `tools` come from the command line and take precedence: a
/// target replaces the file's target, a non-empty tool list replaces the
/// file's allow list.
pub fn build_wrapper_config(
    app: &AppConfig,
    target: Option<String>,
    tools: Vec<String>,
    connect_timeout_secs: Option<u64>,
) -> Result<WrapperConfig> {
    let target = target
        .or_else(|| app.upstream.target.clone())
        .filter(|t| !t.trim().is_empty())
        .context("No upstream target configured")?;

    let tools = if tools.is_empty() {
        app.tools.allow.clone()
    } else {
        tools
    };
    if tools.is_empty() {
        anyhow::bail!("At least one tool name must be allowed");
    }
    if let Some(name) = tools.iter().find(|t| t.trim().is_empty()) {
        anyhow::bail!("Invalid tool name '{}'", name);
    }

    let timeout_secs = connect_timeout_secs.unwrap_or(app.upstream.connect_timeout_secs);
    if timeout_secs == 0 {
        anyhow::bail!("Connect timeout must be greater than zero");
    }

    Ok(WrapperConfig::new(target, tools)
        .with_connect_timeout(Duration::from_secs(timeout_secs))
        .with_env(app.upstream.env.clone()))
}
