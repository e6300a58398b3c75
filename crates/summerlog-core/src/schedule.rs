use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// How often the scheduled job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    #[default]
    Daily,
    Weekly,
}

impl Cadence {
    pub const ALL: [Cadence; 3] = [Cadence::Hourly, Cadence::Daily, Cadence::Weekly];

    /// Five-field cron expression.
    pub fn cron_expression(self) -> &'static str {
        match self {
            Cadence::Hourly => "0 * * * *",
            Cadence::Daily => "0 8 * * *",
            Cadence::Weekly => "0 8 * * 0",
        }
    }

    /// systemd `OnCalendar=` value.
    pub fn on_calendar(self) -> &'static str {
        match self {
            Cadence::Hourly => "hourly",
            Cadence::Daily => "*-*-* 08:00:00",
            Cadence::Weekly => "Sun *-*-* 08:00:00",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Hourly => "hourly",
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Cadence::Hourly),
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            other => Err(Error::Config(format!(
                "unknown schedule cadence '{}'; expected hourly, daily or weekly",
                other
            ))),
        }
    }
}

/// Periodic trigger mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerBackend {
    #[default]
    Cron,
    Systemd,
}

impl SchedulerBackend {
    pub const ALL: [SchedulerBackend; 2] = [SchedulerBackend::Cron, SchedulerBackend::Systemd];

    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerBackend::Cron => "cron",
            SchedulerBackend::Systemd => "systemd",
        }
    }
}

impl fmt::Display for SchedulerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cron" => Ok(SchedulerBackend::Cron),
            "systemd" | "timer" => Ok(SchedulerBackend::Systemd),
            other => Err(Error::Config(format!(
                "unknown scheduler backend '{}'; expected cron or systemd",
                other
            ))),
        }
    }
}

/// Description of an installed periodic trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub backend: SchedulerBackend,
    pub cadence: Cadence,
    /// The exact crontab line or `ExecStart=` command installed.
    pub invocation: String,
    /// Where the entry lives (crontab or unit file path).
    pub location: String,
}

/// What an install call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Installed,
    AlreadyPresent,
    Replaced,
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InstallStatus::Installed => "installed",
            InstallStatus::AlreadyPresent => "already present",
            InstallStatus::Replaced => "replaced",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_parse() {
        assert_eq!("Daily".parse::<Cadence>().unwrap(), Cadence::Daily);
        assert_eq!(" weekly ".parse::<Cadence>().unwrap(), Cadence::Weekly);
        assert!("monthly".parse::<Cadence>().is_err());
    }

    #[test]
    fn test_cadence_expressions() {
        assert_eq!(Cadence::Hourly.cron_expression(), "0 * * * *");
        assert_eq!(Cadence::Weekly.cron_expression(), "0 8 * * 0");
        assert_eq!(Cadence::Daily.on_calendar(), "*-*-* 08:00:00");
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("cron".parse::<SchedulerBackend>().unwrap(), SchedulerBackend::Cron);
        assert_eq!(
            "SYSTEMD".parse::<SchedulerBackend>().unwrap(),
            SchedulerBackend::Systemd
        );
        assert!("launchd".parse::<SchedulerBackend>().is_err());
    }
}
