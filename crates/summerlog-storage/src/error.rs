//! Error types for summerlog-storage

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt run state: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to encode run state: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Timed out waiting for lock {}", .0.display())]
    LockTimeout(PathBuf),
}

impl From<StorageError> for summerlog_core::Error {
    fn from(err: StorageError) -> Self {
        summerlog_core::Error::State(err.to_string())
    }
}
