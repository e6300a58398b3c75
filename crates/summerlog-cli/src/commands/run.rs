use anyhow::Result;
use std::time::Duration;
use summerlog_config::ConfigStore;
use summerlog_core::{RunOutcome, Stage};
use summerlog_engine::{Orchestrator, RunMode, RunReport};
use summerlog_notify::SmtpMailer;
use summerlog_sources::DockerCli;
use summerlog_storage::RunStateTracker;
use summerlog_summary::OpenAiSummarizer;

pub async fn handle(store: &ConfigStore, dry_run: bool) -> Result<u8> {
    let config = store.load()?;
    config.validate()?;

    let runtime = DockerCli::locate(Duration::from_secs(config.collection.timeout_secs))
        .map_err(|e| summerlog_core::Error::DockerUnavailable(e.to_string()))?;
    let summarizer = OpenAiSummarizer::from_config(&config.summary)
        .map_err(summerlog_core::Error::from)?;
    let mailer = SmtpMailer::from_config(&config.mail).map_err(summerlog_core::Error::from)?;
    let tracker = RunStateTracker::new(store.state_path(), config.run.stale_after());

    let orchestrator = Orchestrator::new(&config, tracker, &runtime, &summarizer, &mailer)?;
    let mode = if dry_run { RunMode::DryRun } else { RunMode::Live };
    let report = orchestrator.run(mode).await;

    print_report(&report, &mailer.recipients());
    Ok(report.exit_code())
}

fn print_report(report: &RunReport, recipients: &[String]) {
    match &report.outcome {
        RunOutcome::Done => {
            if report.collected.is_empty() && report.failed.is_empty() {
                println!("No running containers found to analyze.");
            } else if report.summary.is_some() {
                println!(
                    "✓ Summary emailed ({} container(s), {} failed)",
                    report.collected.len(),
                    report.failed.len()
                );
            } else {
                println!("✓ No new logs to analyze");
            }
        }
        RunOutcome::Skipped { running_since } => {
            println!("Another run has been in progress since {}; skipping.", running_since);
        }
        RunOutcome::DryRun => {
            if let Some(window) = &report.window {
                println!("Window: {}", window.describe());
            }
            println!("Containers: {}", report.collected.join(", "));
            if !report.failed.is_empty() {
                println!("Unavailable: {}", report.failed.join(", "));
            }
            println!("Redactions: {}", report.redactions);
            if let Some(tokens) = report.estimated_tokens {
                println!("Estimated prompt tokens: {}", tokens);
            }
            println!("Would email: {}", recipients.join(", "));
        }
        RunOutcome::Failed { stage, reason } => {
            eprintln!("Run failed while {}: {}", stage, reason);
            if *stage == Stage::Emailing
                && let Some(summary) = &report.summary
            {
                println!("{}", summary.text);
            }
        }
    }
}
