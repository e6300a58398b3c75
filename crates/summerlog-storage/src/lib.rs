//! Run-state persistence for summerlog
//!
//! This crate provides:
//! - The on-disk run record (`state.toml`)
//! - A lock file guarding the marker check-and-set
//! - `RunGuard`, which clears its own marker when the run ends

pub mod error;
pub mod lock;
pub mod state;

pub use error::{Result, StorageError};
pub use lock::StateLock;
pub use state::{BeginOutcome, RunGuard, RunStateTracker};
