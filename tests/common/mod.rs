#![allow(dead_code)]

use rmcp::model::{CallToolRequestParams, CallToolResult};
use rmcp::service::{RoleClient, RunningService};
use rmcp::ServiceExt;
use rusted_wrapper::config::WrapperConfig;
use rusted_wrapper::demo::{CallLog, DemoServer};
use rusted_wrapper::upstream::ModuleRegistry;
use rusted_wrapper::ServerWrapper;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub type TestClient = RunningService<RoleClient, ()>;

/// Allow list used by most end-to-end tests; `multiply` is deliberately left out.
pub const ALLOWED: [&str; 2] = ["hello", "add"];

// ──────────────────────────────────────────────
// Tier 1: In-process upstreams
// ──────────────────────────────────────────────

/// Registry serving the demo server under the module name `demo`.
/// Every instance it creates records calls into the returned log.
pub fn demo_registry() -> (ModuleRegistry, CallLog) {
    let calls = CallLog::default();
    let registry = ModuleRegistry::new();
    let shared = calls.clone();
    registry.register("demo", move || DemoServer::with_call_log(shared.clone()));
    (registry, calls)
}

/// Wrapper around the in-process demo module exposing [`ALLOWED`].
pub fn embedded_wrapper() -> (ServerWrapper, CallLog) {
    let (registry, calls) = demo_registry();
    let wrapper = ServerWrapper::new(WrapperConfig::new("demo", ALLOWED))
        .with_module_loader(Arc::new(registry));
    (wrapper, calls)
}

// ──────────────────────────────────────────────
// Tier 2: Spawned upstreams (built binaries)
// ──────────────────────────────────────────────

/// Absolute path of the `demo-upstream` binary built with this package
pub fn demo_upstream_path() -> &'static str {
    env!("CARGO_BIN_EXE_demo-upstream")
}

/// Absolute path of the `rusted-wrapper` binary
pub fn wrapper_binary_path() -> &'static str {
    env!("CARGO_BIN_EXE_rusted-wrapper")
}

/// Whether a process with this pid still exists
pub fn process_alive(pid: u32) -> bool {
    let pid = pid.to_string();
    std::process::Command::new("kill")
        .args(["-0", pid.as_str()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Wrapper that spawns the demo upstream binary and exposes [`ALLOWED`].
pub fn spawned_wrapper() -> ServerWrapper {
    ServerWrapper::new(
        WrapperConfig::new(demo_upstream_path(), ALLOWED)
            .with_connect_timeout(Duration::from_secs(10)),
    )
}

// ──────────────────────────────────────────────
// Shared helpers
// ──────────────────────────────────────────────

/// Start `wrapper` on an in-memory transport and connect a client to it.
pub async fn start_with_client(wrapper: &mut ServerWrapper) -> TestClient {
    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let (started, client) = tokio::join!(
        wrapper.start_with(tokio::io::split(server_io)),
        ().serve(tokio::io::split(client_io))
    );
    started.unwrap();
    client.unwrap()
}

pub fn call_params(name: &str, arguments: Value) -> CallToolRequestParams {
    CallToolRequestParams {
        meta: None,
        name: name.to_string().into(),
        arguments: arguments.as_object().cloned(),
        task: None,
    }
}

/// Concatenated text content of a tool result
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect()
}

pub async fn tool_names(client: &TestClient) -> Vec<String> {
    client
        .list_all_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name.to_string())
        .collect()
}
