//! Run orchestration: Idle → Collecting → Redacting → Summarizing → Emailing → Done

use summerlog_config::Config;
use summerlog_core::{CaptureWindow, LogBundle, RunOutcome, Stage, retry_with_backoff};
use summerlog_notify::{Mailer, compose_summary_email};
use summerlog_security::{RedactedBundle, Redactor};
use summerlog_sources::{ContainerRuntime, LogCollector};
use summerlog_storage::{BeginOutcome, RunGuard, RunStateTracker};
use summerlog_summary::{SummaryRequest, SummaryResult, Summarizer, build_prompt};
use summerlog_tokens::TokenEstimator;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    /// Collect and redact only; no lock, no state change, no outbound calls.
    DryRun,
}

/// Everything the caller needs to report on a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Stages entered, in order
    pub stages: Vec<Stage>,
    pub window: Option<CaptureWindow>,
    /// Containers whose logs were captured
    pub collected: Vec<String>,
    /// Containers whose logs could not be fetched
    pub failed: Vec<String>,
    pub redactions: usize,
    pub estimated_tokens: Option<usize>,
    /// Summary, kept even when delivery failed
    pub summary: Option<SummaryResult>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            outcome: RunOutcome::Done,
            stages: vec![Stage::Idle],
            window: None,
            collected: Vec::new(),
            failed: Vec::new(),
            redactions: 0,
            estimated_tokens: None,
            summary: None,
        }
    }

    fn enter(&mut self, next: Stage) {
        let current = self.stage();
        debug_assert!(current.can_advance_to(next), "illegal transition {current} -> {next}");
        tracing::debug!(from = %current, to = %next, "stage transition");
        self.stages.push(next);
    }

    /// Stage the run is currently in
    pub fn stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Idle)
    }

    pub fn exit_code(&self) -> u8 {
        self.outcome.exit_code()
    }
}

pub struct Orchestrator<'a> {
    config: &'a Config,
    tracker: RunStateTracker,
    runtime: &'a dyn ContainerRuntime,
    summarizer: &'a dyn Summarizer,
    mailer: &'a dyn Mailer,
    redactor: Redactor,
    estimator: Option<TokenEstimator>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        tracker: RunStateTracker,
        runtime: &'a dyn ContainerRuntime,
        summarizer: &'a dyn Summarizer,
        mailer: &'a dyn Mailer,
    ) -> summerlog_core::Result<Self> {
        let redactor = Redactor::with_custom(&config.redaction.custom_patterns)?;
        let estimator = match TokenEstimator::for_model(&config.summary.model) {
            Ok(estimator) => Some(estimator),
            Err(e) => {
                tracing::warn!(error = %e, "token estimation unavailable");
                None
            }
        };

        Ok(Self {
            config,
            tracker,
            runtime,
            summarizer,
            mailer,
            redactor,
            estimator,
        })
    }

    pub async fn run(&self, mode: RunMode) -> RunReport {
        self.run_at(mode, OffsetDateTime::now_utc()).await
    }

    /// Run with an explicit start time, which also ends the capture window.
    pub async fn run_at(&self, mode: RunMode, now: OffsetDateTime) -> RunReport {
        match mode {
            RunMode::Live => self.live(now).await,
            RunMode::DryRun => self.dry_run(now).await,
        }
    }

    fn window(&self, last_success: Option<OffsetDateTime>, now: OffsetDateTime) -> CaptureWindow {
        CaptureWindow::since_last_run(last_success, self.config.collection.since_hours, now)
            .with_max_lines(self.config.collection.max_lines)
    }

    async fn live(&self, now: OffsetDateTime) -> RunReport {
        let mut report = RunReport::new();

        let guard = match self.tracker.begin(now) {
            Ok(BeginOutcome::Started(guard)) => guard,
            Ok(BeginOutcome::Skipped { since }) => {
                report.outcome = RunOutcome::Skipped {
                    running_since: since,
                };
                return report;
            }
            Err(e) => return fail(report, None, Stage::Idle, e.to_string()),
        };

        let window = self.window(guard.last_success(), now);
        report.window = Some(window);

        let bundles = match self.collect_and_redact(&mut report, &window).await {
            Ok(bundles) => bundles,
            Err((stage, reason)) => return fail(report, Some(guard), stage, reason),
        };

        if report.collected.is_empty() && report.failed.is_empty() {
            tracing::info!("no running containers found to analyze");
            report.enter(Stage::Done);
            return done_without_advancing(report, guard);
        }

        let bundles: Vec<RedactedBundle> = bundles.into_iter().filter(|b| !b.is_empty()).collect();
        if bundles.is_empty() {
            tracing::info!("no new logs to analyze");
            report.enter(Stage::Done);
            return finish(report, guard, window);
        }

        report.enter(Stage::Summarizing);
        let request = SummaryRequest {
            window,
            bundles,
            failed: report.failed.clone(),
        };
        if let Some(estimator) = &self.estimator {
            let prompt = build_prompt(&request, self.config.summary.max_log_chars);
            report.estimated_tokens = Some(estimator.estimate_chat(&prompt.system, &prompt.user));
        }

        let policy = self.config.retry.policy();
        let text = match retry_with_backoff(&policy, "summarize", |_| {
            self.summarizer.summarize(&request)
        })
        .await
        {
            Ok(text) => text,
            Err(e) => return fail(report, Some(guard), Stage::Summarizing, e.to_string()),
        };
        let summary = SummaryResult::for_request(&request, text);
        report.summary = Some(summary.clone());

        report.enter(Stage::Emailing);
        let email = compose_summary_email(&summary, guard.started_at(), &report.failed);
        if let Err(e) = retry_with_backoff(&policy, "send email", |_| self.mailer.send(&email)).await {
            tracing::error!(
                summary = %summary.text,
                "email delivery failed; summary follows in this log entry"
            );
            return fail(report, Some(guard), Stage::Emailing, e.to_string());
        }

        report.enter(Stage::Done);
        finish(report, guard, window)
    }

    async fn dry_run(&self, now: OffsetDateTime) -> RunReport {
        let mut report = RunReport::new();

        let record = match self.tracker.peek() {
            Ok(record) => record,
            Err(e) => return fail(report, None, Stage::Idle, e.to_string()),
        };

        let window = self.window(record.last_success, now);
        report.window = Some(window);

        let bundles = match self.collect_and_redact(&mut report, &window).await {
            Ok(bundles) => bundles,
            Err((stage, reason)) => return fail(report, None, stage, reason),
        };

        let chars: usize = bundles.iter().map(|b| b.text().chars().count()).sum();
        let request = SummaryRequest {
            window,
            bundles: bundles.into_iter().filter(|b| !b.is_empty()).collect(),
            failed: report.failed.clone(),
        };
        if let Some(estimator) = &self.estimator {
            let prompt = build_prompt(&request, self.config.summary.max_log_chars);
            report.estimated_tokens = Some(estimator.estimate_chat(&prompt.system, &prompt.user));
        }

        tracing::info!(
            window = %window.describe(),
            containers = ?report.collected,
            failed = ?report.failed,
            chars,
            estimated_tokens = ?report.estimated_tokens,
            redactions = report.redactions,
            recipients = ?self.config.mail.to,
            "dry run: would summarize and email"
        );

        report.outcome = RunOutcome::DryRun;
        report
    }

    /// Collecting and Redacting. Nothing unredacted leaves this function.
    async fn collect_and_redact(
        &self,
        report: &mut RunReport,
        window: &CaptureWindow,
    ) -> Result<Vec<RedactedBundle>, (Stage, String)> {
        report.enter(Stage::Collecting);
        let collector = LogCollector::new(self.runtime, self.config.collection.containers.clone());
        let bundles = collector
            .collect(window)
            .await
            .map_err(|e| (Stage::Collecting, e.to_string()))?;

        if bundles.is_empty() {
            return Ok(Vec::new());
        }

        let (captured, failed): (Vec<LogBundle>, Vec<LogBundle>) =
            bundles.into_iter().partition(LogBundle::is_captured);
        report.failed = failed.into_iter().map(|b| b.container).collect();

        if captured.is_empty() {
            return Err((
                Stage::Collecting,
                format!("could not fetch logs from any container ({})", report.failed.join(", ")),
            ));
        }

        report.enter(Stage::Redacting);
        let mut redacted = Vec::with_capacity(captured.len());
        for bundle in captured {
            let bundle = self
                .redactor
                .redact_bundle(bundle)
                .map_err(|e| (Stage::Redacting, e.to_string()))?;
            report.redactions += bundle.redaction_count();
            report.collected.push(bundle.container().to_string());
            redacted.push(bundle);
        }

        Ok(redacted)
    }
}

fn fail(mut report: RunReport, guard: Option<RunGuard>, stage: Stage, reason: String) -> RunReport {
    tracing::error!(stage = %stage, reason = %reason, "run failed");
    if let Some(guard) = guard
        && let Err(e) = guard.release()
    {
        tracing::warn!(error = %e, "failed to clear in-progress marker");
    }
    report.outcome = RunOutcome::Failed { stage, reason };
    report
}

/// Nothing to look at: end cleanly but keep the window where it was.
fn done_without_advancing(mut report: RunReport, guard: RunGuard) -> RunReport {
    if let Err(e) = guard.release() {
        tracing::warn!(error = %e, "failed to clear in-progress marker");
    }
    report.outcome = RunOutcome::Done;
    report
}

fn finish(mut report: RunReport, guard: RunGuard, window: CaptureWindow) -> RunReport {
    match guard.complete(window.until) {
        Ok(()) => {
            tracing::info!(
                containers = report.collected.len(),
                failed = report.failed.len(),
                "run complete"
            );
            report.outcome = RunOutcome::Done;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to record successful run");
            report.outcome = RunOutcome::Failed {
                stage: Stage::Idle,
                reason: format!("run finished but state could not be saved: {}", e),
            };
        }
    }
    report
}
