//! Run record persistence and the in-progress marker

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use summerlog_core::RunRecord;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::Result;
use crate::lock::StateLock;

const LOCK_WAIT: StdDuration = StdDuration::from_secs(5);
const LOCK_STALE_AFTER: StdDuration = StdDuration::from_secs(30);

/// Reads and updates `state.toml`
#[derive(Debug, Clone)]
pub struct RunStateTracker {
    path: PathBuf,
    lock_path: PathBuf,
    stale_after: Duration,
}

/// Result of trying to start a run
#[derive(Debug)]
pub enum BeginOutcome {
    Started(RunGuard),
    /// Another run holds a fresh marker.
    Skipped { since: OffsetDateTime },
}

impl RunStateTracker {
    pub fn new(path: impl Into<PathBuf>, stale_after: Duration) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            stale_after,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Current record without taking the lock. Missing file reads as empty.
    pub fn peek(&self) -> Result<RunRecord> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RunRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check-and-set the in-progress marker.
    pub fn begin(&self, now: OffsetDateTime) -> Result<BeginOutcome> {
        let _lock = self.lock()?;
        let mut record = self.peek()?;

        if record.has_fresh_marker(now, self.stale_after) {
            let since = record.in_progress_since.unwrap_or(now);
            tracing::info!(since = %since, "another run is in progress");
            return Ok(BeginOutcome::Skipped { since });
        }

        if let Some(since) = record.in_progress_since {
            tracing::warn!(since = %since, "overriding stale in-progress marker");
        }

        let token = Uuid::new_v4().to_string();
        record.mark_in_progress(now, token.clone());
        self.write(&record)?;

        Ok(BeginOutcome::Started(RunGuard {
            tracker: self.clone(),
            token,
            started_at: now,
            last_success: record.last_success,
            finished: false,
        }))
    }

    fn lock(&self) -> Result<StateLock> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        StateLock::acquire(&self.lock_path, LOCK_WAIT, LOCK_STALE_AFTER)
    }

    fn write(&self, record: &RunRecord) -> Result<()> {
        let content = toml::to_string_pretty(record)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Clear our marker and optionally advance `last_success`.
    fn finish(&self, token: &str, success: Option<OffsetDateTime>) -> Result<()> {
        let _lock = self.lock()?;
        let mut record = self.peek()?;

        if record.in_progress_token.as_deref() == Some(token) {
            record.clear_marker();
        } else {
            tracing::warn!("in-progress marker was taken over by another run");
        }

        if let Some(until) = success
            && record.last_success.is_none_or(|prev| prev < until)
        {
            record.last_success = Some(until);
        }

        self.write(&record)
    }
}

/// Ownership of the in-progress marker for one run
#[derive(Debug)]
pub struct RunGuard {
    tracker: RunStateTracker,
    token: String,
    started_at: OffsetDateTime,
    last_success: Option<OffsetDateTime>,
    finished: bool,
}

impl RunGuard {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    /// `last_success` as it was when the run started
    pub fn last_success(&self) -> Option<OffsetDateTime> {
        self.last_success
    }

    /// Successful run: record `until` as the new last success.
    pub fn complete(mut self, until: OffsetDateTime) -> Result<()> {
        self.finished = true;
        self.tracker.finish(&self.token, Some(until))
    }

    /// Failed run: clear the marker, keep `last_success`.
    pub fn release(mut self) -> Result<()> {
        self.finished = true;
        self.tracker.finish(&self.token, None)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.tracker.finish(&self.token, None) {
            tracing::warn!(error = %e, "failed to clear in-progress marker");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-03-02 08:00 UTC);

    fn tracker(dir: &TempDir) -> RunStateTracker {
        RunStateTracker::new(dir.path().join("state.toml"), Duration::hours(2))
    }

    fn seed(tracker: &RunStateTracker, record: &RunRecord) {
        fs::write(tracker.path(), toml::to_string(record).unwrap()).unwrap();
    }

    fn started(outcome: BeginOutcome) -> RunGuard {
        match outcome {
            BeginOutcome::Started(guard) => guard,
            BeginOutcome::Skipped { since } => panic!("skipped, running since {since}"),
        }
    }

    #[test]
    fn test_peek_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(tracker(&dir).peek().unwrap(), RunRecord::default());
    }

    #[test]
    fn test_begin_sets_marker_and_complete_advances() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);

        let guard = started(tracker.begin(NOW).unwrap());
        let record = tracker.peek().unwrap();
        assert_eq!(record.in_progress_since, Some(NOW));
        assert_eq!(record.in_progress_token.as_deref(), Some(guard.token()));

        guard.complete(NOW).unwrap();
        let record = tracker.peek().unwrap();
        assert_eq!(record.last_success, Some(NOW));
        assert_eq!(record.in_progress_since, None);
        assert!(!dir.path().join("state.lock").exists());
    }

    #[test]
    fn test_fresh_marker_skips_and_leaves_record_unchanged() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let mut record = RunRecord {
            last_success: Some(NOW - Duration::days(1)),
            ..Default::default()
        };
        record.mark_in_progress(NOW - Duration::minutes(5), "other".into());
        seed(&tracker, &record);

        match tracker.begin(NOW).unwrap() {
            BeginOutcome::Skipped { since } => assert_eq!(since, NOW - Duration::minutes(5)),
            BeginOutcome::Started(_) => panic!("expected skip"),
        }
        assert_eq!(tracker.peek().unwrap(), record);
    }

    #[test]
    fn test_stale_marker_is_overridden() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let mut record = RunRecord::default();
        record.mark_in_progress(NOW - Duration::hours(3), "abandoned".into());
        seed(&tracker, &record);

        let guard = started(tracker.begin(NOW).unwrap());
        let record = tracker.peek().unwrap();
        assert_eq!(record.in_progress_since, Some(NOW));
        assert_ne!(record.in_progress_token.as_deref(), Some("abandoned"));
        guard.release().unwrap();
    }

    #[test]
    fn test_release_keeps_last_success() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let previous = NOW - Duration::days(1);
        seed(
            &tracker,
            &RunRecord {
                last_success: Some(previous),
                ..Default::default()
            },
        );

        let guard = started(tracker.begin(NOW).unwrap());
        assert_eq!(guard.last_success(), Some(previous));
        guard.release().unwrap();

        let record = tracker.peek().unwrap();
        assert_eq!(record.last_success, Some(previous));
        assert_eq!(record.in_progress_since, None);
    }

    #[test]
    fn test_dropped_guard_clears_marker() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);

        drop(started(tracker.begin(NOW).unwrap()));

        let record = tracker.peek().unwrap();
        assert_eq!(record.in_progress_since, None);
        assert_eq!(record.last_success, None);
    }

    #[test]
    fn test_foreign_marker_is_not_cleared() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let guard = started(tracker.begin(NOW).unwrap());

        // Another process took over after treating our marker as stale.
        let mut record = tracker.peek().unwrap();
        record.mark_in_progress(NOW + Duration::hours(3), "newer".into());
        seed(&tracker, &record);

        guard.release().unwrap();
        let record = tracker.peek().unwrap();
        assert_eq!(record.in_progress_token.as_deref(), Some("newer"));
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        fs::write(tracker.path(), "last_success = \"yesterday\"").unwrap();

        let err: summerlog_core::Error = tracker.begin(NOW).unwrap_err().into();
        assert_eq!(err.exit_code(), summerlog_core::exit_code::RUN_STATE);
    }
}
