//! systemd user timer backend

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use summerlog_core::{Cadence, InstallStatus};

use crate::error::SchedulerError;
use crate::runner::CommandRunner;

pub const SERVICE_NAME: &str = "summerlog.service";
pub const TIMER_NAME: &str = "summerlog.timer";

const SYSTEMD_REMEDIATION: &str =
    "systemd user sessions are required (`systemctl --user` must work); choose the cron backend otherwise";

fn exec_word(exe: &Path) -> String {
    let text = exe.to_string_lossy();
    if text.contains(char::is_whitespace) {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text.into_owned()
    }
}

/// `ExecStart=` command line.
pub fn exec_start(exe: &Path) -> String {
    format!("{} run", exec_word(exe))
}

pub fn service_unit(exe: &Path) -> String {
    format!(
        "[Unit]\n\
         Description=Summarize container logs and email the digest\n\
         After=network-online.target\n\
         \n\
         [Service]\n\
         Type=oneshot\n\
         ExecStart={}\n",
        exec_start(exe)
    )
}

pub fn timer_unit(cadence: Cadence) -> String {
    format!(
        "[Unit]\n\
         Description=Run summerlog {}\n\
         \n\
         [Timer]\n\
         OnCalendar={}\n\
         Persistent=true\n\
         Unit={}\n\
         \n\
         [Install]\n\
         WantedBy=timers.target\n",
        cadence,
        cadence.on_calendar(),
        SERVICE_NAME
    )
}

/// Default user unit directory (`~/.config/systemd/user`)
pub fn default_unit_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("systemd").join("user"))
}

fn read_optional(path: &Path) -> Result<Option<String>, SchedulerError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn restore(path: &Path, previous: Option<&str>) {
    let result = match previous {
        Some(content) => fs::write(path, content),
        None => match fs::remove_file(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        },
    };
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "failed to restore unit file");
    }
}

fn systemctl(runner: &dyn CommandRunner, args: &[&str]) -> Result<(), SchedulerError> {
    let mut full = vec!["--user"];
    full.extend_from_slice(args);

    let output = match runner.run("systemctl", &full, None) {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SchedulerError::NotAvailable {
                tool: "systemctl",
                remediation: SYSTEMD_REMEDIATION,
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !output.success() {
        return Err(SchedulerError::command(
            &format!("systemctl {}", full.join(" ")),
            &output.stderr,
        ));
    }
    Ok(())
}

fn write_and_enable(
    runner: &dyn CommandRunner,
    unit_dir: &Path,
    units: [(&Path, &str); 2],
) -> Result<(), SchedulerError> {
    fs::create_dir_all(unit_dir)?;
    for (path, content) in units {
        fs::write(path, content)?;
    }
    systemctl(runner, &["daemon-reload"])?;
    systemctl(runner, &["enable", "--now", TIMER_NAME])
}

pub(crate) fn install(
    runner: &dyn CommandRunner,
    unit_dir: &Path,
    cadence: Cadence,
    exe: &Path,
) -> Result<(String, InstallStatus), SchedulerError> {
    let service_path = unit_dir.join(SERVICE_NAME);
    let timer_path = unit_dir.join(TIMER_NAME);
    let service = service_unit(exe);
    let timer = timer_unit(cadence);

    let old_service = read_optional(&service_path)?;
    let old_timer = read_optional(&timer_path)?;

    if old_service.as_deref() == Some(service.as_str()) && old_timer.as_deref() == Some(timer.as_str()) {
        return Ok((exec_start(exe), InstallStatus::AlreadyPresent));
    }

    let status = if old_service.is_some() || old_timer.is_some() {
        InstallStatus::Replaced
    } else {
        InstallStatus::Installed
    };

    let applied = write_and_enable(runner, unit_dir, [
        (service_path.as_path(), service.as_str()),
        (timer_path.as_path(), timer.as_str()),
    ]);

    if let Err(e) = applied {
        restore(&service_path, old_service.as_deref());
        restore(&timer_path, old_timer.as_deref());
        if let Err(reload) = systemctl(runner, &["daemon-reload"]) {
            tracing::debug!(error = %reload, "daemon-reload after rollback failed");
        }
        return Err(e);
    }

    tracing::info!(cadence = %cadence, status = %status, "systemd timer updated");
    Ok((exec_start(exe), status))
}

pub(crate) fn remove(runner: &dyn CommandRunner, unit_dir: &Path) -> Result<bool, SchedulerError> {
    let service_path = unit_dir.join(SERVICE_NAME);
    let timer_path = unit_dir.join(TIMER_NAME);
    if !service_path.exists() && !timer_path.exists() {
        return Ok(false);
    }

    if let Err(e) = systemctl(runner, &["disable", "--now", TIMER_NAME]) {
        tracing::warn!(error = %e, "failed to disable timer");
    }
    for path in [&timer_path, &service_path] {
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
    }
    systemctl(runner, &["daemon-reload"])?;
    tracing::info!("removed systemd timer");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unit() {
        let unit = service_unit(Path::new("/usr/bin/summerlog"));
        assert!(unit.contains("Type=oneshot\n"));
        assert!(unit.contains("ExecStart=/usr/bin/summerlog run\n"));
    }

    #[test]
    fn test_exec_start_quotes_spaces() {
        assert_eq!(
            exec_start(Path::new("/opt/my apps/summerlog")),
            "\"/opt/my apps/summerlog\" run"
        );
    }

    #[test]
    fn test_timer_unit_per_cadence() {
        assert!(timer_unit(Cadence::Hourly).contains("OnCalendar=hourly\n"));
        assert!(timer_unit(Cadence::Daily).contains("OnCalendar=*-*-* 08:00:00\n"));
        let weekly = timer_unit(Cadence::Weekly);
        assert!(weekly.contains("OnCalendar=Sun *-*-* 08:00:00\n"));
        assert!(weekly.contains("Persistent=true\n"));
        assert!(weekly.contains("WantedBy=timers.target\n"));
    }
}
