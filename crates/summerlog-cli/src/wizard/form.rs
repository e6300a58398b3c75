//! Field-by-field form shared by the terminal and desktop wizards

use std::str::FromStr;

use summerlog_config::{Config, looks_like_email, parse_port};
use summerlog_core::{Cadence, SchedulerBackend};
use summerlog_security::validate_custom_pattern;

use super::WizardError;

/// One question in the form
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub label: &'static str,
    pub secret: bool,
    pub required: bool,
}

impl Field {
    const fn new(label: &'static str) -> Self {
        Self {
            label,
            secret: false,
            required: false,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// Primitive interactions a wizard backend provides. `Ok(None)` means the
/// user cancelled.
pub trait Prompts {
    /// Free text; an empty answer keeps `current`.
    fn text(&mut self, field: &Field, current: &str) -> Result<Option<String>, WizardError>;

    fn choice(
        &mut self,
        label: &str,
        options: &[&str],
        current: &str,
    ) -> Result<Option<String>, WizardError>;

    /// A list of lines, e.g. redaction patterns.
    fn lines(&mut self, label: &str, current: &[String]) -> Result<Option<Vec<String>>, WizardError>;

    fn invalid(&mut self, message: &str) -> Result<(), WizardError>;

    fn confirm(&mut self, summary: &str) -> Result<bool, WizardError>;
}

/// Ask until the answer is acceptable.
fn ask<P: Prompts + ?Sized>(
    p: &mut P,
    field: Field,
    current: &str,
    check: impl Fn(&str) -> Result<(), String>,
) -> Result<Option<String>, WizardError> {
    loop {
        let Some(answer) = p.text(&field, current)? else {
            return Ok(None);
        };
        let value = match answer.trim() {
            "" => current.trim().to_string(),
            given => given.to_string(),
        };

        if value.is_empty() {
            if field.required {
                p.invalid(&format!("{} is required.", field.label))?;
                continue;
            }
            return Ok(Some(value));
        }
        match check(&value) {
            Ok(()) => return Ok(Some(value)),
            Err(msg) => p.invalid(&msg)?,
        }
    }
}

fn ask_choice<P: Prompts + ?Sized, T: FromStr>(
    p: &mut P,
    label: &str,
    options: &[&str],
    current: &str,
) -> Result<Option<T>, WizardError>
where
    T::Err: std::fmt::Display,
{
    loop {
        let Some(answer) = p.choice(label, options, current)? else {
            return Ok(None);
        };
        let answer = if answer.trim().is_empty() { current } else { answer.trim() };
        match answer.parse::<T>() {
            Ok(value) => return Ok(Some(value)),
            Err(e) => p.invalid(&e.to_string())?,
        }
    }
}

fn check_email(value: &str) -> Result<(), String> {
    if looks_like_email(value) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid email address.", value))
    }
}

fn split_recipients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "(not set)" } else { "(set)" }
}

/// Settings overview with secrets hidden.
pub fn summary_text(config: &Config) -> String {
    let mut lines = vec![
        format!("API key: {}", mask(&config.summary.api_key)),
        format!("SMTP host: {}", config.mail.host),
        format!("SMTP port: {}", config.mail.port),
        format!("SMTP user: {}", config.mail.username),
        format!("SMTP password: {}", mask(&config.mail.password)),
        format!("From: {}", config.mail.from),
        format!("To: {}", config.mail.to.join(", ")),
        format!(
            "Schedule: {} via {} ({})",
            config.schedule.cadence,
            config.schedule.backend,
            config.schedule.cadence.cron_expression()
        ),
    ];
    if !config.redaction.custom_patterns.is_empty() {
        lines.push(format!(
            "Custom redaction patterns: {}",
            config.redaction.custom_patterns.join("  ")
        ));
    }
    lines.join("\n")
}

/// Walk every field; `Ok(None)` when the user cancels or declines to save.
pub fn run_form<P: Prompts + ?Sized>(p: &mut P, current: &Config) -> Result<Option<Config>, WizardError> {
    let mut next = current.clone();
    let none = |_: &str| Ok(());

    macro_rules! answer {
        ($e:expr) => {
            match $e? {
                Some(v) => v,
                None => return Ok(None),
            }
        };
    }

    next.summary.api_key = answer!(ask(
        p,
        Field::new("API key").required().secret(),
        &current.summary.api_key,
        none
    ));
    next.mail.host = answer!(ask(p, Field::new("SMTP host").required(), &current.mail.host, none));
    let port = answer!(ask(
        p,
        Field::new("SMTP port").required(),
        &current.mail.port.to_string(),
        |v| parse_port(v).map(|_| ()).map_err(|e| e.to_string())
    ));
    next.mail.port = parse_port(&port).map_err(WizardError::Core)?;
    next.mail.username = answer!(ask(p, Field::new("SMTP user"), &current.mail.username, none));
    next.mail.password = answer!(ask(
        p,
        Field::new("SMTP password").secret(),
        &current.mail.password,
        none
    ));
    next.mail.from = answer!(ask(
        p,
        Field::new("From email").required(),
        &current.mail.from,
        check_email
    ));
    let to = answer!(ask(
        p,
        Field::new("To email(s), comma separated").required(),
        &current.mail.to.join(", "),
        |v| split_recipients(v).iter().try_for_each(|addr| check_email(addr))
    ));
    next.mail.to = split_recipients(&to);

    let cadences: Vec<&str> = Cadence::ALL.iter().map(|c| c.as_str()).collect();
    next.schedule.cadence = answer!(ask_choice(
        p,
        "Schedule",
        &cadences,
        current.schedule.cadence.as_str()
    ));
    let backends: Vec<&str> = SchedulerBackend::ALL.iter().map(|b| b.as_str()).collect();
    next.schedule.backend = answer!(ask_choice(
        p,
        "Scheduler",
        &backends,
        current.schedule.backend.as_str()
    ));

    next.redaction.custom_patterns = loop {
        let patterns = answer!(p.lines(
            "Custom redaction patterns (one regex per line)",
            &current.redaction.custom_patterns
        ));
        match patterns.iter().try_for_each(|pat| validate_custom_pattern(pat).map(|_| ())) {
            Ok(()) => break patterns,
            Err(e) => p.invalid(&e.to_string())?,
        }
    };

    if p.confirm(&summary_text(&next))? {
        Ok(Some(next))
    } else {
        Ok(None)
    }
}
