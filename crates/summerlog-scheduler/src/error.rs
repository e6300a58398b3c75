use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("{tool} is not available: {remediation}")]
    NotAvailable {
        tool: &'static str,
        remediation: &'static str,
    },

    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchedulerError {
    pub(crate) fn command(command: &str, stderr: &str) -> Self {
        SchedulerError::Command {
            command: command.to_string(),
            stderr: stderr.trim().to_string(),
        }
    }
}

impl From<SchedulerError> for summerlog_core::Error {
    fn from(err: SchedulerError) -> Self {
        summerlog_core::Error::SchedulerInstall(err.to_string())
    }
}
