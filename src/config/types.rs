use crate::routing::AllowList;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default timeout for the upstream MCP handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Contents of the optional TOML configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub target: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            env: HashMap::new(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Runtime configuration of a single wrapper instance.
///
/// Built once and never mutated afterwards; the upstream target's shape
/// decides how the upstream is reached (see [`crate::upstream::UpstreamTarget`]).
#[derive(Debug, Clone)]
pub struct WrapperConfig {
    upstream_target: String,
    allowed_tools: AllowList,
    connect_timeout: Duration,
    env: HashMap<String, String>,
}

impl WrapperConfig {
    pub fn new<I, S>(upstream_target: impl Into<String>, allowed_tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            upstream_target: upstream_target.into(),
            allowed_tools: allowed_tools.into_iter().collect(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            env: HashMap::new(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn upstream_target(&self) -> &str {
        &self.upstream_target
    }

    pub fn allowed_tools(&self) -> &AllowList {
        &self.allowed_tools
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_config_deduplicates_tools() {
        let config = WrapperConfig::new("./server.ts", ["hello", "add", "hello"]);

        assert_eq!(config.upstream_target(), "./server.ts");
        assert_eq!(config.allowed_tools().len(), 2);
        assert!(config.allowed_tools().allows("hello"));
        assert!(config.allowed_tools().allows("add"));
        assert_eq!(config.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_wrapper_config_builders() {
        let mut env = HashMap::new();
        env.insert("API_KEY".to_string(), "secret".to_string());

        let config = WrapperConfig::new("npm:@scope/server", vec!["tool1".to_string()])
            .with_connect_timeout(Duration::from_secs(5))
            .with_env(env);

        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.env().get("API_KEY").map(String::as_str), Some("secret"));
    }
}
