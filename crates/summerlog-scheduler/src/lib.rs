//! Periodic trigger installation
//!
//! Two backends share one contract: installing the same cadence twice is a
//! no-op, a different cadence replaces the old entry, and there is never
//! more than one entry.

pub mod cron;
pub mod error;
pub mod runner;
pub mod systemd;

use std::path::{Path, PathBuf};

use summerlog_core::{Cadence, InstallStatus, ScheduleEntry, SchedulerBackend};

pub use error::SchedulerError;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

/// What `install` did and the entry now in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub entry: ScheduleEntry,
    pub status: InstallStatus,
}

pub struct SchedulerInstaller {
    runner: Box<dyn CommandRunner>,
    exe: PathBuf,
    unit_dir: PathBuf,
}

impl SchedulerInstaller {
    pub fn new(runner: Box<dyn CommandRunner>, exe: impl Into<PathBuf>, unit_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            exe: exe.into(),
            unit_dir: unit_dir.into(),
        }
    }

    /// Installer for the running binary using real processes.
    pub fn for_current_exe() -> Result<Self, SchedulerError> {
        let exe = std::env::current_exe()?;
        let unit_dir = systemd::default_unit_dir().ok_or(SchedulerError::NotAvailable {
            tool: "systemd",
            remediation: "could not determine the home directory for user units",
        })?;
        Ok(Self::new(Box::new(SystemRunner), exe, unit_dir))
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn install(
        &self,
        cadence: Cadence,
        backend: SchedulerBackend,
    ) -> Result<InstallReport, SchedulerError> {
        let (invocation, status, location) = match backend {
            SchedulerBackend::Cron => {
                let (line, status) = cron::install(self.runner(), cadence, &self.exe)?;
                (line, status, "user crontab".to_string())
            }
            SchedulerBackend::Systemd => {
                let (exec, status) =
                    systemd::install(self.runner(), &self.unit_dir, cadence, &self.exe)?;
                let location = self.unit_dir.join(systemd::TIMER_NAME).display().to_string();
                (exec, status, location)
            }
        };

        Ok(InstallReport {
            entry: ScheduleEntry {
                backend,
                cadence,
                invocation,
                location,
            },
            status,
        })
    }

    /// Remove our entry from `backend`. Returns whether anything was removed.
    pub fn remove(&self, backend: SchedulerBackend) -> Result<bool, SchedulerError> {
        match backend {
            SchedulerBackend::Cron => cron::remove(self.runner()),
            SchedulerBackend::Systemd => systemd::remove(self.runner(), &self.unit_dir),
        }
    }
}
