use super::target::LaunchCommand;
use super::UpstreamSession;
use crate::error::{Result, WrapperError};
use crate::mcp::handshake;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Spawn the upstream as a child process and initialize MCP over its stdio.
///
/// The child is killed before returning if the handshake does not complete.
pub(crate) async fn spawn(
    target: &str,
    command: &LaunchCommand,
    env: &HashMap<String, String>,
    timeout: Duration,
) -> Result<UpstreamSession> {
    info!("Spawning upstream MCP server: {}", target);
    debug!("Command: {} {}", command.program, command.args.join(" "));

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .envs(env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        error!("Failed to spawn '{}': {}", command.program, e);
        WrapperError::connection(
            target,
            format!("failed to spawn '{}': {}", command.program, e),
        )
    })?;

    let stderr_task = child
        .stderr
        .take()
        .map(|stderr| drain_stderr(target.to_string(), stderr));

    let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
        (Some(stdin), Some(stdout)) => (stdin, stdout),
        _ => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill upstream process {}: {}", target, e);
            }
            return Err(WrapperError::connection(
                target,
                "child process stdio pipes are unavailable",
            ));
        }
    };

    match handshake(target, (stdout, stdin), timeout).await {
        Ok(client) => {
            info!(
                "Upstream process {} running (pid {:?})",
                target,
                child.id()
            );
            Ok(UpstreamSession::Spawned {
                child,
                client,
                stderr_task,
            })
        }
        Err(e) => {
            warn!("Handshake with spawned upstream {} failed: {}", target, e);
            if let Err(kill_err) = child.kill().await {
                warn!("Failed to kill upstream process {}: {}", target, kill_err);
            }
            if let Some(task) = stderr_task {
                task.abort();
            }
            Err(e)
        }
    }
}

/// Forward the child's stderr to the log, line by line
fn drain_stderr(target: String, stderr: ChildStderr) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!(upstream = %target, "stderr: {}", line),
                Ok(None) => break,
                Err(e) => {
                    warn!(upstream = %target, "Failed to read upstream stderr: {}", e);
                    break;
                }
            }
        }
    })
}
