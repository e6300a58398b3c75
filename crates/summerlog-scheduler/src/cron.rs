//! crontab backend

use std::io::ErrorKind;
use std::path::Path;

use summerlog_core::{Cadence, InstallStatus};

use crate::error::SchedulerError;
use crate::runner::CommandRunner;

/// Trailing comment identifying our line in a crontab.
pub const MARKER: &str = "# summerlog-run";

const CRON_REMEDIATION: &str =
    "install cron (e.g. `apt install cron`) or choose the systemd backend";

/// Quote the executable for /bin/sh if needed.
fn shell_word(exe: &Path) -> String {
    let text = exe.to_string_lossy();
    if text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-+".contains(c))
    {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}

/// The crontab line for `cadence`.
pub fn cron_line(cadence: Cadence, exe: &Path) -> String {
    format!("{} {} run {}", cadence.cron_expression(), shell_word(exe), MARKER)
}

fn is_ours(line: &str) -> bool {
    line.trim_end().ends_with(MARKER)
}

/// Compute the new table with exactly one copy of `line`.
///
/// Returns `None` when the table already holds exactly that line.
pub fn plan_crontab(current: &str, line: &str) -> Option<(String, InstallStatus)> {
    let ours: Vec<&str> = current.lines().filter(|l| is_ours(l)).collect();
    if ours.len() == 1 && ours[0].trim() == line {
        return None;
    }

    let status = if ours.is_empty() {
        InstallStatus::Installed
    } else {
        InstallStatus::Replaced
    };

    let mut lines: Vec<&str> = current.lines().filter(|l| !is_ours(l)).collect();
    lines.push(line);
    Some((lines.join("\n") + "\n", status))
}

/// Table with our lines removed, or `None` if there were none.
pub fn strip_crontab(current: &str) -> Option<String> {
    if !current.lines().any(is_ours) {
        return None;
    }
    let kept: Vec<&str> = current.lines().filter(|l| !is_ours(l)).collect();
    if kept.is_empty() {
        Some(String::new())
    } else {
        Some(kept.join("\n") + "\n")
    }
}

fn not_available() -> SchedulerError {
    SchedulerError::NotAvailable {
        tool: "crontab",
        remediation: CRON_REMEDIATION,
    }
}

/// Current user crontab. A user without one reads as empty.
pub fn read_crontab(runner: &dyn CommandRunner) -> Result<String, SchedulerError> {
    let output = match runner.run("crontab", &["-l"], None) {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_available()),
        Err(e) => return Err(e.into()),
    };

    if output.success() {
        return Ok(output.stdout);
    }
    if output.code == Some(1) && output.stderr.to_lowercase().contains("no crontab") {
        return Ok(String::new());
    }
    Err(SchedulerError::command("crontab -l", &output.stderr))
}

pub fn write_crontab(runner: &dyn CommandRunner, table: &str) -> Result<(), SchedulerError> {
    let output = match runner.run("crontab", &["-"], Some(table)) {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_available()),
        Err(e) => return Err(e.into()),
    };
    if !output.success() {
        return Err(SchedulerError::command("crontab -", &output.stderr));
    }
    Ok(())
}

pub(crate) fn install(
    runner: &dyn CommandRunner,
    cadence: Cadence,
    exe: &Path,
) -> Result<(String, InstallStatus), SchedulerError> {
    let line = cron_line(cadence, exe);
    let current = read_crontab(runner)?;

    match plan_crontab(&current, &line) {
        None => Ok((line, InstallStatus::AlreadyPresent)),
        Some((table, status)) => {
            write_crontab(runner, &table)?;
            tracing::info!(cadence = %cadence, status = %status, "crontab updated");
            Ok((line, status))
        }
    }
}

pub(crate) fn remove(runner: &dyn CommandRunner) -> Result<bool, SchedulerError> {
    let current = read_crontab(runner)?;
    match strip_crontab(&current) {
        None => Ok(false),
        Some(table) => {
            write_crontab(runner, &table)?;
            tracing::info!("removed crontab entry");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn exe() -> PathBuf {
        PathBuf::from("/usr/local/bin/summerlog")
    }

    #[test]
    fn test_cron_line() {
        assert_eq!(
            cron_line(Cadence::Daily, &exe()),
            "0 8 * * * /usr/local/bin/summerlog run # summerlog-run"
        );
    }

    #[test]
    fn test_cron_line_quotes_awkward_paths() {
        let line = cron_line(Cadence::Hourly, Path::new("/opt/my tools/summerlog"));
        assert_eq!(line, "0 * * * * '/opt/my tools/summerlog' run # summerlog-run");
    }

    #[test]
    fn test_plan_on_empty_table() {
        let line = cron_line(Cadence::Daily, &exe());
        let (table, status) = plan_crontab("", &line).unwrap();
        assert_eq!(table, format!("{line}\n"));
        assert_eq!(status, InstallStatus::Installed);
    }

    #[test]
    fn test_plan_identical_entry_is_noop() {
        let line = cron_line(Cadence::Daily, &exe());
        let current = format!("MAILTO=ops\n{line}\n");
        assert!(plan_crontab(&current, &line).is_none());
    }

    #[test]
    fn test_plan_replaces_and_collapses_duplicates() {
        let daily = cron_line(Cadence::Daily, &exe());
        let weekly = cron_line(Cadence::Weekly, &exe());
        let current = format!("@reboot backup.sh\n{daily}\n{daily}\n");

        let (table, status) = plan_crontab(&current, &weekly).unwrap();

        assert_eq!(status, InstallStatus::Replaced);
        assert_eq!(table, format!("@reboot backup.sh\n{weekly}\n"));
    }

    #[test]
    fn test_strip_crontab() {
        let line = cron_line(Cadence::Daily, &exe());
        assert_eq!(strip_crontab("@reboot x\n"), None);
        assert_eq!(
            strip_crontab(&format!("@reboot x\n{line}\n")).as_deref(),
            Some("@reboot x\n")
        );
        assert_eq!(strip_crontab(&format!("{line}\n")).as_deref(), Some(""));
    }
}
