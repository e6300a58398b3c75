use std::ffi::OsString;

/// Dialog program used for the desktop wizard.
pub const DIALOG_TOOL: &str = "zenity";

/// What the environment offers for an interactive wizard. Detection only
/// reads environment variables and PATH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentProbe {
    pub has_display: bool,
    pub has_dialog_tool: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardBackend {
    Gui,
    Cli,
}

impl EnvironmentProbe {
    pub fn detect() -> Self {
        Self::from_lookup(
            |key| std::env::var_os(key),
            which::which(DIALOG_TOOL).is_ok(),
        )
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>, has_dialog_tool: bool) -> Self {
        let set = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
        Self {
            has_display: set("DISPLAY") || set("WAYLAND_DISPLAY"),
            has_dialog_tool,
        }
    }
}

/// GUI only when there is both a display and the dialog tool.
pub fn choose_backend(probe: &EnvironmentProbe) -> WizardBackend {
    if probe.has_display && probe.has_dialog_tool {
        WizardBackend::Gui
    } else {
        WizardBackend::Cli
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(vars: &[(&str, &str)], tool: bool) -> EnvironmentProbe {
        EnvironmentProbe::from_lookup(
            |key| {
                vars.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| OsString::from(v))
            },
            tool,
        )
    }

    #[test]
    fn test_gui_needs_display_and_tool() {
        assert_eq!(choose_backend(&probe(&[("TERM", "xterm")], true)), WizardBackend::Cli);
        assert_eq!(choose_backend(&probe(&[("DISPLAY", ":0")], true)), WizardBackend::Gui);
        assert_eq!(choose_backend(&probe(&[("DISPLAY", ":0")], false)), WizardBackend::Cli);
        assert_eq!(choose_backend(&probe(&[], true)), WizardBackend::Cli);
    }

    #[test]
    fn test_wayland_counts_as_display() {
        let p = probe(&[("WAYLAND_DISPLAY", "wayland-0")], true);
        assert!(p.has_display);
        assert_eq!(choose_backend(&p), WizardBackend::Gui);
    }

    #[test]
    fn test_empty_display_is_ignored() {
        assert!(!probe(&[("DISPLAY", "")], true).has_display);
    }
}
