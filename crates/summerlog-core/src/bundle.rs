use time::{Duration, OffsetDateTime};

/// Time span a run captures logs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWindow {
    pub since: OffsetDateTime,
    pub until: OffsetDateTime,
    /// Optional bound on the number of trailing lines per container.
    pub max_lines: Option<usize>,
}

impl CaptureWindow {
    /// Window starting at the last successful run, or `fallback_hours` back
    /// from `now` when there has never been one.
    pub fn since_last_run(
        last_success: Option<OffsetDateTime>,
        fallback_hours: u32,
        now: OffsetDateTime,
    ) -> Self {
        let since = last_success
            .filter(|ts| *ts < now)
            .unwrap_or_else(|| now - Duration::hours(i64::from(fallback_hours)));
        Self {
            since,
            until: now,
            max_lines: None,
        }
    }

    pub fn with_max_lines(mut self, max_lines: Option<usize>) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Human-readable description used in prompts and emails.
    pub fn describe(&self) -> String {
        let hours = (self.until - self.since).whole_hours();
        format!(
            "the last {} hour(s) (since unix time {})",
            hours.max(0),
            self.since.unix_timestamp()
        )
    }
}

/// Raw log text for one container, or why it could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogText {
    Captured(String),
    Failed { reason: String },
}

/// One container's logs for a single run. Never persisted.
#[derive(Debug, Clone)]
pub struct LogBundle {
    pub container: String,
    pub window: CaptureWindow,
    pub text: LogText,
}

impl LogBundle {
    pub fn captured(container: impl Into<String>, window: CaptureWindow, text: String) -> Self {
        Self {
            container: container.into(),
            window,
            text: LogText::Captured(text),
        }
    }

    pub fn failed(container: impl Into<String>, window: CaptureWindow, reason: String) -> Self {
        Self {
            container: container.into(),
            window,
            text: LogText::Failed { reason },
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self.text, LogText::Captured(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.text {
            LogText::Failed { reason } => Some(reason),
            LogText::Captured(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_window_uses_last_success() {
        let now = datetime!(2026-03-02 08:00 UTC);
        let last = datetime!(2026-03-01 08:00 UTC);
        let window = CaptureWindow::since_last_run(Some(last), 24, now);
        assert_eq!(window.since, last);
        assert_eq!(window.until, now);
    }

    #[test]
    fn test_window_falls_back_on_first_run() {
        let now = datetime!(2026-03-02 08:00 UTC);
        let window = CaptureWindow::since_last_run(None, 6, now);
        assert_eq!(window.since, datetime!(2026-03-02 02:00 UTC));
    }

    #[test]
    fn test_window_ignores_future_last_success() {
        let now = datetime!(2026-03-02 08:00 UTC);
        let skewed = datetime!(2026-03-03 08:00 UTC);
        let window = CaptureWindow::since_last_run(Some(skewed), 24, now);
        assert_eq!(window.since, datetime!(2026-03-01 08:00 UTC));
    }

    #[test]
    fn test_bundle_failure_reason() {
        let window = CaptureWindow::since_last_run(None, 1, OffsetDateTime::UNIX_EPOCH);
        let ok = LogBundle::captured("web", window, "hello".into());
        let bad = LogBundle::failed("db", window, "no such container".into());
        assert!(ok.is_captured());
        assert_eq!(ok.failure_reason(), None);
        assert_eq!(bad.failure_reason(), Some("no such container"));
    }
}
