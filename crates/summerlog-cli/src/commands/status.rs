use anyhow::Result;
use summerlog_config::ConfigStore;
use summerlog_storage::RunStateTracker;
use time::OffsetDateTime;

pub fn handle(store: &ConfigStore) -> Result<u8> {
    println!("Config: {}", store.config_path().display());

    if !store.exists() {
        println!("  not configured; run `summerlog configure`");
        return Ok(0);
    }

    let config = store.load()?;
    match config.validate() {
        Ok(()) => println!("  valid"),
        Err(e) => println!("  incomplete: {}", e),
    }
    println!(
        "Schedule: {} via {}",
        config.schedule.cadence, config.schedule.backend
    );
    println!("Model: {} ({})", config.summary.model, config.summary.api_base);
    println!("Recipients: {}", config.mail.to.join(", "));
    if !config.redaction.custom_patterns.is_empty() {
        println!("Custom redaction patterns: {}", config.redaction.custom_patterns.len());
    }

    let stale_after = config.run.stale_after();
    let tracker = RunStateTracker::new(store.state_path(), stale_after);
    let record = tracker.peek().map_err(summerlog_core::Error::from)?;
    let now = OffsetDateTime::now_utc();

    match record.last_success {
        Some(ts) => println!("Last success: {}", ts),
        None => println!("Last success: never"),
    }
    match record.in_progress_since {
        Some(since) if record.has_stale_marker(now, stale_after) => {
            println!("In progress: since {} (stale, will be overridden)", since)
        }
        Some(since) => println!("In progress: since {}", since),
        None => println!("In progress: no"),
    }

    Ok(0)
}
