//! Desktop wizard built on zenity dialogs

use summerlog_config::Config;
use summerlog_scheduler::{CommandOutput, CommandRunner};

use super::form::{Field, Prompts, run_form};
use super::probe::DIALOG_TOOL;
use super::{ConfigPrompter, WizardError};

const TITLE: &str = "summerlog setup";

pub struct ZenityPrompter<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> ZenityPrompter<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Run one dialog. `Ok(None)` when the user pressed Cancel or closed it.
    fn dialog(&self, args: &[&str], stdin: Option<&str>) -> Result<Option<String>, WizardError> {
        let mut full = vec!["--title", TITLE];
        full.extend_from_slice(args);

        let output = self
            .runner
            .run(DIALOG_TOOL, &full, stdin)
            .map_err(|e| WizardError::GuiUnavailable(e.to_string()))?;
        interpret(output)
    }
}

fn interpret(output: CommandOutput) -> Result<Option<String>, WizardError> {
    match output.code {
        Some(0) => Ok(Some(output.stdout.trim_end_matches(['\r', '\n']).to_string())),
        Some(1) if !mentions_display(&output.stderr) => Ok(None),
        _ => Err(WizardError::GuiUnavailable(match output.stderr.trim() {
            "" => format!("{} exited with {:?}", DIALOG_TOOL, output.code),
            stderr => stderr.to_string(),
        })),
    }
}

/// zenity renders `--text` as Pango markup.
fn markup(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn mentions_display(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("cannot open display") || stderr.contains("gtk-warning")
}

impl Prompts for ZenityPrompter<'_> {
    fn text(&mut self, field: &Field, current: &str) -> Result<Option<String>, WizardError> {
        let label = if field.required {
            format!("{} (required)", field.label)
        } else {
            field.label.to_string()
        };
        let text = format!("--text={}", markup(&label));
        let mut args = vec!["--entry", text.as_str()];
        // Secrets are never echoed back into the dialog; an empty entry keeps them.
        let prefill = format!("--entry-text={}", current);
        if field.secret {
            args.push("--hide-text");
        } else {
            args.push(prefill.as_str());
        }
        self.dialog(&args, None)
    }

    fn choice(
        &mut self,
        label: &str,
        options: &[&str],
        current: &str,
    ) -> Result<Option<String>, WizardError> {
        let text = format!("--text={}", markup(label));
        let mut args = vec!["--list", "--radiolist", text.as_str(), "--column=", "--column=Option"];
        for option in options {
            args.push(if *option == current { "TRUE" } else { "FALSE" });
            args.push(*option);
        }
        self.dialog(&args, None)
    }

    fn lines(&mut self, label: &str, current: &[String]) -> Result<Option<Vec<String>>, WizardError> {
        let text = format!("--text={} (one per line)", markup(label));
        let existing = current.join("\n");
        let edited = self.dialog(&["--text-info", "--editable", text.as_str()], Some(&existing))?;
        Ok(edited.map(|body| {
            body.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        }))
    }

    fn invalid(&mut self, message: &str) -> Result<(), WizardError> {
        let text = format!("--text={}", markup(message));
        self.dialog(&["--error", text.as_str()], None)?;
        Ok(())
    }

    fn confirm(&mut self, summary: &str) -> Result<bool, WizardError> {
        let text = format!("--text={}\n\nSave and install schedule?", markup(summary));
        Ok(self.dialog(&["--question", text.as_str()], None)?.is_some())
    }
}

impl ConfigPrompter for ZenityPrompter<'_> {
    fn collect(&mut self, current: &Config) -> Result<Option<Config>, WizardError> {
        run_form(self, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;
    use summerlog_core::{Cadence, SchedulerBackend};

    /// Replays canned dialog results and records every invocation.
    struct Scripted {
        replies: Mutex<VecDeque<io::Result<CommandOutput>>>,
        calls: Mutex<Vec<(Vec<String>, Option<String>)>>,
    }

    impl Scripted {
        fn new(replies: Vec<io::Result<CommandOutput>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for Scripted {
        fn run(&self, program: &str, args: &[&str], stdin: Option<&str>) -> io::Result<CommandOutput> {
            assert_eq!(program, DIALOG_TOOL);
            self.calls.lock().unwrap().push((
                args.iter().map(|a| a.to_string()).collect(),
                stdin.map(str::to_string),
            ));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CommandOutput::failed(1, "")))
        }
    }

    fn ok(s: &str) -> io::Result<CommandOutput> {
        Ok(CommandOutput::ok(format!("{s}\n")))
    }

    #[test]
    fn test_full_dialog_flow() {
        let runner = Scripted::new(vec![
            ok("sk-desktop"),
            ok("smtp.example.com"),
            ok("587"),
            ok("mailer"),
            ok("pw"),
            ok("bot@example.com"),
            ok("ops@example.com"),
            ok("hourly"),
            ok("systemd"),
            ok("tenant-[a-z]+\n\n"),
            ok(""),
        ]);

        let config = ZenityPrompter::new(&runner).collect(&Config::default()).unwrap().unwrap();

        assert_eq!(config.summary.api_key, "sk-desktop");
        assert_eq!(config.mail.port, 587);
        assert_eq!(config.schedule.cadence, Cadence::Hourly);
        assert_eq!(config.schedule.backend, SchedulerBackend::Systemd);
        assert_eq!(config.redaction.custom_patterns, vec!["tenant-[a-z]+"]);

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].0.contains(&"--hide-text".to_string()));
        assert!(!calls[0].0.iter().any(|a| a.starts_with("--entry-text")));
        assert!(calls[1].0.contains(&"--entry-text=".to_string()));
        assert!(calls[7].0.contains(&"--radiolist".to_string()));
        let summary = calls.last().unwrap().0.join(" ");
        assert!(summary.contains("API key: (set)"));
        assert!(!summary.contains("sk-desktop"));
    }

    #[test]
    fn test_cancel_stops_the_form() {
        let runner = Scripted::new(vec![ok("sk-desktop"), Ok(CommandOutput::failed(1, ""))]);

        let result = ZenityPrompter::new(&runner).collect(&Config::default()).unwrap();

        assert!(result.is_none());
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_answer_shows_error_and_asks_again() {
        let runner = Scripted::new(vec![
            ok("key"),
            ok("host"),
            ok("70000"),
            ok(""),
            ok("25"),
        ]);

        let result = ZenityPrompter::new(&runner).collect(&Config::default()).unwrap();

        assert!(result.is_none());
        let calls = runner.calls.lock().unwrap();
        assert!(calls[3].0.contains(&"--error".to_string()));
        assert!(calls[4].0.iter().any(|a| a == "--text=SMTP port (required)"));
    }

    #[test]
    fn test_missing_display_is_reported() {
        let runner = Scripted::new(vec![Ok(CommandOutput::failed(
            1,
            "(zenity:42): Gtk-WARNING **: cannot open display: ",
        ))]);

        let err = ZenityPrompter::new(&runner).collect(&Config::default()).unwrap_err();
        assert!(matches!(err, WizardError::GuiUnavailable(_)));
    }

    #[test]
    fn test_spawn_failure_is_gui_unavailable() {
        let runner = Scripted::new(vec![Err(io::Error::new(io::ErrorKind::NotFound, "zenity"))]);

        let err = ZenityPrompter::new(&runner).collect(&Config::default()).unwrap_err();
        assert!(matches!(err, WizardError::GuiUnavailable(_)));
    }

    #[test]
    fn test_patterns_are_passed_on_stdin() {
        let mut current = Config::default();
        current.redaction.custom_patterns = vec!["a-\\d+".to_string(), "b-\\d+".to_string()];
        let runner = Scripted::new(vec![]);

        let result = ZenityPrompter::new(&runner).lines("Patterns", &current.redaction.custom_patterns);

        assert!(result.unwrap().is_none());
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].1.as_deref(), Some("a-\\d+\nb-\\d+"));
    }

    #[test]
    fn test_dialog_text_is_escaped_for_markup() {
        let mut config = Config::default();
        config.mail.to = vec!["Ops <ops@example.com>".to_string()];
        config.redaction.custom_patterns = vec!["a&b".to_string()];
        let runner = Scripted::new(vec![ok("")]);

        let confirmed = ZenityPrompter::new(&runner).confirm(&super::super::form::summary_text(&config));

        assert!(confirmed.unwrap());
        let calls = runner.calls.lock().unwrap();
        let text = calls[0].0.iter().find(|a| a.starts_with("--text=")).unwrap();
        assert!(text.contains("To: Ops &lt;ops@example.com&gt;"), "{}", text);
        assert!(text.contains("a&amp;b"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_error_message_is_escaped_for_markup() {
        let runner = Scripted::new(vec![ok("")]);

        ZenityPrompter::new(&runner).invalid("'<bad>' is not a valid email address.").unwrap();

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].0.contains(&"--text='&lt;bad&gt;' is not a valid email address.".to_string()));
    }
}
