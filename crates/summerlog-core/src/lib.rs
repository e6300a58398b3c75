//! Core domain models for summerlog
//!
//! This crate contains:
//! - Domain models (LogBundle, RunRecord, ScheduleEntry)
//! - The error taxonomy and process exit codes
//! - The bounded retry combinator shared by the outbound boundaries

pub mod bundle;
pub mod error;
pub mod retry;
pub mod run;
pub mod schedule;

pub use bundle::{CaptureWindow, LogBundle, LogText};
pub use error::{Error, Result, exit_code};
pub use retry::{RetryPolicy, Transient, retry_with_backoff};
pub use run::{RunOutcome, RunRecord, Stage};
pub use schedule::{Cadence, InstallStatus, ScheduleEntry, SchedulerBackend};
