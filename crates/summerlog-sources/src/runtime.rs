//! Container runtime boundary

use async_trait::async_trait;
use summerlog_core::CaptureWindow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The runtime itself cannot be reached; nothing can be collected.
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),

    #[error("failed to fetch logs for {container}: {reason}")]
    Fetch { container: String, reason: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },
}

/// Read-only access to the local container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Names of the currently running containers
    async fn list_containers(&self) -> Result<Vec<String>, RuntimeError>;

    /// Combined stdout/stderr for one container within the window
    async fn fetch_logs(&self, name: &str, window: &CaptureWindow)
        -> Result<String, RuntimeError>;
}
