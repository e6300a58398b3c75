use anyhow::Result;
use summerlog_config::ConfigStore;
use summerlog_scheduler::{SchedulerInstaller, SystemRunner};

use crate::wizard::dialog::ZenityPrompter;
use crate::wizard::probe::{EnvironmentProbe, WizardBackend, choose_backend};
use crate::wizard::terminal::TerminalPrompter;
use crate::wizard::{self, ConfigPrompter, WizardError};

pub fn handle(store: &ConfigStore, no_gui: bool) -> Result<u8> {
    let current = store.load_or_default()?;
    let installer = SchedulerInstaller::for_current_exe().map_err(summerlog_core::Error::from)?;

    let backend = if no_gui {
        WizardBackend::Cli
    } else {
        choose_backend(&EnvironmentProbe::detect())
    };
    tracing::debug!(?backend, "configuration wizard");

    let answer = match backend {
        WizardBackend::Gui => {
            let runner = SystemRunner;
            match ZenityPrompter::new(&runner).collect(&current) {
                Err(WizardError::GuiUnavailable(reason)) => {
                    tracing::warn!(reason = %reason, "desktop dialogs failed; using the terminal");
                    TerminalPrompter::stdio().collect(&current)
                }
                other => other,
            }
        }
        WizardBackend::Cli => TerminalPrompter::stdio().collect(&current),
    };

    let Some(next) = answer? else {
        println!("Canceled; no changes were saved.");
        return Ok(0);
    };

    let applied = wizard::apply(store, &installer, &current, &next)?;
    let entry = &applied.schedule.entry;

    println!("✓ Saved {}", store.config_path().display());
    println!(
        "✓ Schedule {}: {} via {} ({})",
        applied.schedule.status, entry.cadence, entry.backend, entry.location
    );
    println!("  {}", entry.invocation);
    if applied.removed_previous {
        println!("✓ Removed the schedule entry of the previous backend");
    }

    Ok(0)
}
