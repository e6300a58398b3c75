use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};

use crate::error::exit_code;

/// States of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Collecting,
    Redacting,
    Summarizing,
    Emailing,
    Done,
}

impl Stage {
    /// Whether `next` is a legal forward transition from `self`.
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Idle, Stage::Collecting)
                | (Stage::Collecting, Stage::Redacting)
                | (Stage::Collecting, Stage::Done)
                | (Stage::Redacting, Stage::Summarizing)
                | (Stage::Redacting, Stage::Done)
                | (Stage::Summarizing, Stage::Emailing)
                | (Stage::Emailing, Stage::Done)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Collecting => "collecting",
            Stage::Redacting => "redacting",
            Stage::Summarizing => "summarizing",
            Stage::Emailing => "emailing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Done,
    /// Another run holds a fresh in-progress marker.
    Skipped { running_since: OffsetDateTime },
    /// Dry run stopped after redaction.
    DryRun,
    Failed { stage: Stage, reason: String },
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Done | RunOutcome::Skipped { .. } | RunOutcome::DryRun => {
                exit_code::SUCCESS
            }
            RunOutcome::Failed { stage, .. } => match stage {
                Stage::Collecting => exit_code::COLLECTION,
                Stage::Redacting => exit_code::REDACTION,
                Stage::Summarizing => exit_code::SUMMARY,
                Stage::Emailing => exit_code::EMAIL,
                Stage::Idle => exit_code::RUN_STATE,
                Stage::Done => exit_code::UNEXPECTED,
            },
        }
    }
}

/// Persisted run state: last success and the in-progress marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(
        default,
        with = "time::serde::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_success: Option<OffsetDateTime>,

    #[serde(
        default,
        with = "time::serde::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_progress_since: Option<OffsetDateTime>,

    /// Token of the run that owns the marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress_token: Option<String>,
}

impl RunRecord {
    /// A marker that has not yet exceeded `stale_after`.
    pub fn has_fresh_marker(&self, now: OffsetDateTime, stale_after: Duration) -> bool {
        self.in_progress_since
            .is_some_and(|since| now - since < stale_after)
    }

    pub fn has_stale_marker(&self, now: OffsetDateTime, stale_after: Duration) -> bool {
        self.in_progress_since
            .is_some_and(|since| now - since >= stale_after)
    }

    pub fn mark_in_progress(&mut self, now: OffsetDateTime, token: String) {
        self.in_progress_since = Some(now);
        self.in_progress_token = Some(token);
    }

    pub fn clear_marker(&mut self) {
        self.in_progress_since = None;
        self.in_progress_token = None;
    }
}
