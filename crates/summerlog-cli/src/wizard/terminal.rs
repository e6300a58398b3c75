//! Line-oriented wizard for terminals and SSH sessions

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use summerlog_config::Config;

use super::form::{Field, Prompts, run_form};
use super::{ConfigPrompter, WizardError};

pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Next line without its newline; `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>, WizardError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>, WizardError> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line()
    }
}

impl<R: BufRead, W: Write> Prompts for TerminalPrompter<R, W> {
    fn text(&mut self, field: &Field, current: &str) -> Result<Option<String>, WizardError> {
        let shown = match (field.secret, current.is_empty()) {
            (_, true) => String::new(),
            (true, false) => " [(set)]".to_string(),
            (false, false) => format!(" [{}]", current),
        };
        self.prompt(&format!("{}{}: ", field.label, shown))
    }

    fn choice(
        &mut self,
        label: &str,
        options: &[&str],
        current: &str,
    ) -> Result<Option<String>, WizardError> {
        self.prompt(&format!("{} ({}) [{}]: ", label, options.join("/"), current))
    }

    fn lines(&mut self, label: &str, current: &[String]) -> Result<Option<Vec<String>>, WizardError> {
        writeln!(self.output, "{}", label)?;
        if current.is_empty() {
            writeln!(self.output, "  none configured")?;
        } else {
            for pattern in current {
                writeln!(self.output, "  {}", pattern)?;
            }
        }
        writeln!(
            self.output,
            "Enter new patterns, then a blank line. A blank first line keeps the list; '-' clears it."
        )?;

        let mut entered = Vec::new();
        loop {
            let Some(line) = self.prompt("> ")? else {
                return Ok(None);
            };
            let line = line.trim();
            match line {
                "" if entered.is_empty() => return Ok(Some(current.to_vec())),
                "" => return Ok(Some(entered)),
                "-" if entered.is_empty() => return Ok(Some(Vec::new())),
                pattern => entered.push(pattern.to_string()),
            }
        }
    }

    fn invalid(&mut self, message: &str) -> Result<(), WizardError> {
        writeln!(self.output, "  {}", message)?;
        Ok(())
    }

    fn confirm(&mut self, summary: &str) -> Result<bool, WizardError> {
        writeln!(self.output, "\nSummary (secrets hidden):")?;
        for line in summary.lines() {
            writeln!(self.output, "  {}", line)?;
        }
        let answer = self.prompt("\nSave and install schedule? [Y/n]: ")?;
        Ok(match answer {
            None => false,
            Some(a) => {
                let a = a.trim().to_ascii_lowercase();
                a.is_empty() || a.starts_with('y')
            }
        })
    }
}

impl<R: BufRead, W: Write> ConfigPrompter for TerminalPrompter<R, W> {
    fn collect(&mut self, current: &Config) -> Result<Option<Config>, WizardError> {
        writeln!(self.output, "summerlog configuration (press Enter to keep [current] values)")?;
        writeln!(self.output, "Note: typed secrets are echoed.\n")?;
        run_form(self, current)
    }
}
