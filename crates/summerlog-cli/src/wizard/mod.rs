//! Interactive configuration: desktop dialogs when available, terminal otherwise

pub mod dialog;
pub mod form;
pub mod probe;
pub mod terminal;

use summerlog_config::{Config, ConfigStore};
use summerlog_scheduler::{InstallReport, SchedulerInstaller};
use summerlog_security::validate_custom_pattern;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("desktop dialogs unavailable: {0}")]
    GuiUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Core(#[from] summerlog_core::Error),
}

/// A way of asking the user for a complete configuration.
pub trait ConfigPrompter {
    /// `Ok(None)` when the user cancelled; nothing must be persisted then.
    fn collect(&mut self, current: &Config) -> Result<Option<Config>, WizardError>;
}

#[derive(Debug)]
pub struct Applied {
    pub schedule: InstallReport,
    /// The entry of a previously configured backend was taken down
    pub removed_previous: bool,
}

/// Persist `next` and install its schedule.
///
/// The schedule is installed before the config is written, so a failed
/// install leaves the saved config untouched.
pub fn apply(
    store: &ConfigStore,
    installer: &SchedulerInstaller,
    previous: &Config,
    next: &Config,
) -> summerlog_core::Result<Applied> {
    next.validate()?;
    for pattern in &next.redaction.custom_patterns {
        validate_custom_pattern(pattern)?;
    }

    let schedule = installer.install(next.schedule.cadence, next.schedule.backend)?;
    tracing::info!(
        backend = %schedule.entry.backend,
        cadence = %schedule.entry.cadence,
        status = %schedule.status,
        "schedule installed"
    );

    let mut removed_previous = false;
    if store.exists() && previous.schedule.backend != next.schedule.backend {
        match installer.remove(previous.schedule.backend) {
            Ok(removed) => removed_previous = removed,
            Err(e) => tracing::warn!(
                backend = %previous.schedule.backend,
                error = %e,
                "could not remove the previous schedule entry"
            ),
        }
    }

    store.save(next)?;

    Ok(Applied {
        schedule,
        removed_previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use summerlog_core::{Cadence, InstallStatus, SchedulerBackend};
    use summerlog_scheduler::{CommandOutput, CommandRunner};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Calls {
        crontab: Mutex<Option<String>>,
        log: Mutex<Vec<String>>,
    }

    struct FakeRunner(Arc<Calls>);

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str], stdin: Option<&str>) -> io::Result<CommandOutput> {
            self.0.log.lock().unwrap().push(format!("{} {}", program, args.join(" ")));
            Ok(match (program, args) {
                ("crontab", ["-l"]) => match self.0.crontab.lock().unwrap().clone() {
                    Some(table) => CommandOutput::ok(table),
                    None => CommandOutput::failed(1, "no crontab for tester"),
                },
                ("crontab", ["-"]) => {
                    *self.0.crontab.lock().unwrap() = stdin.map(str::to_string);
                    CommandOutput::ok("")
                }
                _ => CommandOutput::ok(""),
            })
        }
    }

    fn setup() -> (TempDir, ConfigStore, SchedulerInstaller, Arc<Calls>) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config"));
        let calls = Arc::new(Calls::default());
        let installer = SchedulerInstaller::new(
            Box::new(FakeRunner(calls.clone())),
            "/usr/local/bin/summerlog",
            dir.path().join("units"),
        );
        (dir, store, installer, calls)
    }

    fn valid() -> Config {
        let mut config = Config::default();
        config.summary.api_key = "sk-test".to_string();
        config.mail.host = "smtp.example.com".to_string();
        config.mail.from = "bot@example.com".to_string();
        config.mail.to = vec!["ops@example.com".to_string()];
        config.schedule.cadence = Cadence::Daily;
        config.schedule.backend = SchedulerBackend::Cron;
        config
    }

    #[test]
    fn test_apply_saves_and_installs() {
        let (_dir, store, installer, calls) = setup();
        let next = valid();

        let applied = apply(&store, &installer, &Config::default(), &next).unwrap();

        assert_eq!(applied.schedule.status, InstallStatus::Installed);
        assert!(!applied.removed_previous);
        assert_eq!(store.load().unwrap(), next);
        let table = calls.crontab.lock().unwrap().clone().unwrap();
        assert_eq!(table.lines().filter(|l| l.contains("summerlog")).count(), 1);
    }

    #[test]
    fn test_backend_change_removes_previous_entry() {
        let (_dir, store, installer, calls) = setup();
        let previous = valid();
        apply(&store, &installer, &Config::default(), &previous).unwrap();

        let mut next = previous.clone();
        next.schedule.backend = SchedulerBackend::Systemd;
        let applied = apply(&store, &installer, &previous, &next).unwrap();

        assert!(applied.removed_previous);
        assert_eq!(store.load().unwrap().schedule.backend, SchedulerBackend::Systemd);
        let table = calls.crontab.lock().unwrap().clone().unwrap_or_default();
        assert!(!table.contains("summerlog"));
    }

    #[test]
    fn test_invalid_config_changes_nothing() {
        let (_dir, store, installer, calls) = setup();
        let mut next = valid();
        next.mail.to.clear();

        assert!(apply(&store, &installer, &Config::default(), &next).is_err());
        assert!(!store.exists());
        assert!(calls.log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_bad_custom_pattern_changes_nothing() {
        let (_dir, store, installer, calls) = setup();
        let mut next = valid();
        next.redaction.custom_patterns = vec!["(".to_string()];

        assert!(apply(&store, &installer, &Config::default(), &next).is_err());
        assert!(!store.exists());
        assert!(calls.log.lock().unwrap().is_empty());
    }
}
