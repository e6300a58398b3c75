//! Docker CLI backed runtime

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use summerlog_core::CaptureWindow;
use tokio::process::Command;

use crate::runtime::{ContainerRuntime, RuntimeError};

/// Talks to the daemon through the `docker` binary
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: PathBuf,
    timeout: Duration,
}

impl DockerCli {
    /// Locate `docker` on PATH.
    pub fn locate(timeout: Duration) -> Result<Self, RuntimeError> {
        let binary = which::which("docker").map_err(|_| {
            RuntimeError::Unavailable(
                "'docker' command not found. Is Docker installed and in your PATH?".to_string(),
            )
        })?;
        Ok(Self::with_binary(binary, timeout))
    }

    pub fn with_binary(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    async fn exec(&self, args: &[String]) -> Result<std::process::Output, RuntimeError> {
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RuntimeError::Unavailable(format!("failed to run docker: {}", e)))?;

        let operation = args.first().cloned().unwrap_or_default();
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(RuntimeError::Unavailable(format!(
                "docker {} failed: {}",
                operation, e
            ))),
            Err(_) => Err(RuntimeError::Timeout {
                operation: format!("docker {}", operation),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

fn ps_args() -> Vec<String> {
    vec!["ps".into(), "--format".into(), "{{.Names}}".into()]
}

fn logs_args(name: &str, window: &CaptureWindow) -> Vec<String> {
    let mut args = vec![
        "logs".to_string(),
        "--since".to_string(),
        window.since.unix_timestamp().to_string(),
        "--until".to_string(),
        window.until.unix_timestamp().to_string(),
    ];
    if let Some(lines) = window.max_lines {
        args.push("--tail".to_string());
        args.push(lines.to_string());
    }
    args.push(name.to_string());
    args
}

fn parse_names(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn list_containers(&self) -> Result<Vec<String>, RuntimeError> {
        let output = match self.exec(&ps_args()).await {
            Err(RuntimeError::Timeout { operation, secs }) => {
                return Err(RuntimeError::Unavailable(format!(
                    "{} timed out after {}s",
                    operation, secs
                )));
            }
            other => other?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RuntimeError::Unavailable(format!(
                "docker ps failed: {}",
                stderr.trim()
            )));
        }

        Ok(parse_names(&output.stdout))
    }

    async fn fetch_logs(
        &self,
        name: &str,
        window: &CaptureWindow,
    ) -> Result<String, RuntimeError> {
        let output = self.exec(&logs_args(name, window)).await?;

        // docker logs replays the container's stderr on our stderr
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(RuntimeError::Fetch {
                container: name.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        Ok(text)
    }
}
