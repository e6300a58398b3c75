use lazy_static::lazy_static;
use regex::Regex;
use summerlog_core::{Error, Result};

/// Replacement used by every custom rule.
pub const CUSTOM_TOKEN: &str = "[REDACTED:CUSTOM]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    BuiltIn,
    Custom,
}

/// A pattern and the fixed literal that replaces its matches.
#[derive(Debug, Clone)]
pub struct RedactionRule {
    pub name: String,
    pub kind: RuleKind,
    pub pattern: Regex,
    pub replacement: String,
}

impl RedactionRule {
    fn builtin(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: RuleKind::BuiltIn,
            pattern: Regex::new(pattern).unwrap(),
            replacement: format!("[REDACTED:{}]", name),
        }
    }

    fn custom(index: usize, pattern: Regex) -> Self {
        Self {
            name: format!("CUSTOM_{}", index + 1),
            kind: RuleKind::Custom,
            pattern,
            replacement: CUSTOM_TOKEN.to_string(),
        }
    }
}

lazy_static! {
    /// Any replacement token already in the text. Rules never see inside one.
    pub(crate) static ref PLACEHOLDER: Regex = Regex::new(r"\[REDACTED:[A-Z0-9_]+\]").unwrap();

    /// Shipped rules (order matters - more specific first)
    pub static ref BUILTIN_RULES: Vec<RedactionRule> = vec![
        RedactionRule::builtin(
            "PRIVATE_KEY",
            r"(?s)-----BEGIN[A-Z ]*PRIVATE KEY-----.*?(?:-----END[A-Z ]*PRIVATE KEY-----|\z)",
        ),
        RedactionRule::builtin("AWS_ACCESS_KEY", r"AKIA[0-9A-Z]{16}"),
        RedactionRule::builtin("GITHUB_TOKEN", r"gh[pousr]_[a-zA-Z0-9]{36,}"),
        RedactionRule::builtin("OPENAI_KEY", r"sk-[a-zA-Z0-9_-]{20,}"),
        RedactionRule::builtin(
            "JWT",
            r"eyJ[a-zA-Z0-9_-]+\.eyJ[a-zA-Z0-9_-]+\.[a-zA-Z0-9_-]+",
        ),
        RedactionRule::builtin("BEARER_TOKEN", r"(?i)bearer\s+[a-zA-Z0-9_.\-~+/]{20,}=*"),
        RedactionRule::builtin(
            "API_KEY",
            r#"(?i)(api[_-]?key|apikey)['"\s:=]+[a-zA-Z0-9_-]{20,}"#,
        ),
        RedactionRule::builtin(
            "PASSWORD",
            r#"(?i)\b(password|passwd|pwd|secret)\s*[:=]\s*[^\s,;'"]+"#,
        ),
        RedactionRule::builtin("EMAIL", r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"),
        RedactionRule::builtin(
            "IPV4",
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\b",
        ),
    ];
}

/// Compile and vet a user-supplied pattern.
///
/// A custom rule must not match the empty string and must not match any
/// replacement token, otherwise re-applying the rules would keep rewriting
/// already-redacted text.
pub fn validate_custom_pattern(pattern: &str) -> Result<Regex> {
    let reject = |reason: String| Error::RedactionRule {
        pattern: pattern.to_string(),
        reason,
    };

    if pattern.trim().is_empty() {
        return Err(reject("pattern is empty".to_string()));
    }

    let regex = Regex::new(pattern).map_err(|e| reject(e.to_string()))?;

    if regex.is_match("") {
        return Err(reject("pattern matches the empty string".to_string()));
    }

    let tokens = BUILTIN_RULES
        .iter()
        .map(|rule| rule.replacement.as_str())
        .chain(std::iter::once(CUSTOM_TOKEN));
    for token in tokens {
        if regex.is_match(token) {
            return Err(reject(format!(
                "pattern matches the redaction placeholder {}",
                token
            )));
        }
    }

    Ok(regex)
}

/// Compile every custom pattern in order, failing on the first bad one.
pub(crate) fn compile_custom<I, S>(patterns: I) -> Result<Vec<RedactionRule>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .enumerate()
        .map(|(index, pattern)| {
            validate_custom_pattern(pattern.as_ref()).map(|regex| RedactionRule::custom(index, regex))
        })
        .collect()
}
