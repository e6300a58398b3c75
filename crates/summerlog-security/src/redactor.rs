//! Secret redaction engine

use serde::{Deserialize, Serialize};
use summerlog_core::{Error, LogBundle, LogText, Result};

use crate::bundle::RedactedBundle;
use crate::rules::{BUILTIN_RULES, PLACEHOLDER, RedactionRule, compile_custom};

/// Text split around replacement tokens. Rules only ever run on `Text`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Token(String),
}

fn split_tokens(text: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in PLACEHOLDER.find_iter(text) {
        if m.start() > last {
            pieces.push(Piece::Text(text[last..m.start()].to_string()));
        }
        pieces.push(Piece::Token(m.as_str().to_string()));
        last = m.end();
    }
    if last < text.len() {
        pieces.push(Piece::Text(text[last..].to_string()));
    }
    pieces
}

fn join(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|p| match p {
            Piece::Text(s) | Piece::Token(s) => s.as_str(),
        })
        .collect()
}

/// Replace every non-empty match of `rule` in the text pieces.
fn apply_rule(rule: &RedactionRule, pieces: Vec<Piece>) -> (Vec<Piece>, usize) {
    let mut out = Vec::with_capacity(pieces.len());
    let mut count = 0;

    for piece in pieces {
        let text = match piece {
            Piece::Text(text) => text,
            token => {
                out.push(token);
                continue;
            }
        };

        let mut last = 0;
        let mut hit = false;
        for m in rule.pattern.find_iter(&text).filter(|m| !m.is_empty()) {
            hit = true;
            if m.start() > last {
                out.push(Piece::Text(text[last..m.start()].to_string()));
            }
            out.push(Piece::Token(rule.replacement.clone()));
            last = m.end();
            count += 1;
        }
        if !hit {
            out.push(Piece::Text(text));
        } else if last < text.len() {
            out.push(Piece::Text(text[last..].to_string()));
        }
    }

    (out, count)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionInfo {
    pub source: String,
    pub redaction_type: String,
    pub count: usize,
}

/// Redaction engine: built-in rules plus the user's custom rules
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    custom: Vec<RedactionRule>,
}

impl Redactor {
    /// Redactor with the built-in rules only
    pub fn new() -> Self {
        Self { custom: Vec::new() }
    }

    /// Alias for [`Redactor::new`]
    pub fn builtin() -> Self {
        Self::new()
    }

    /// Redactor with custom patterns appended after the built-ins.
    pub fn with_custom<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            custom: compile_custom(patterns)?,
        })
    }

    /// All rules in application order
    pub fn rules(&self) -> impl Iterator<Item = &RedactionRule> {
        BUILTIN_RULES.iter().chain(self.custom.iter())
    }

    /// Redact secrets from content
    ///
    /// Replacement tokens are opaque: no rule matches inside or across one,
    /// including tokens already present in `content`. Each rule sees the
    /// output of the previous ones, and the whole pass repeats until nothing
    /// changes. Every replacement shrinks the remaining plain text, so the
    /// loop ends, and its result is a fixed point: redacting it again is a
    /// no-op.
    pub fn redact(&self, source: &str, content: &str) -> (String, Vec<RedactionInfo>) {
        let mut pieces = split_tokens(content);
        let mut redactions: Vec<RedactionInfo> = Vec::new();

        loop {
            let mut changed = false;

            for rule in self.rules() {
                let (next, count) = apply_rule(rule, pieces);
                pieces = next;
                if count == 0 {
                    continue;
                }
                changed = true;

                match redactions.iter_mut().find(|r| r.redaction_type == rule.name) {
                    Some(info) => info.count += count,
                    None => redactions.push(RedactionInfo {
                        source: source.to_string(),
                        redaction_type: rule.name.clone(),
                        count,
                    }),
                }
            }

            if !changed {
                break;
            }
        }

        (join(&pieces), redactions)
    }

    /// Fail if any built-in rule still matches the plain text between
    /// replacement tokens.
    pub fn verify(&self, text: &str) -> Result<()> {
        let pieces = split_tokens(text);
        let leak = BUILTIN_RULES.iter().find(|rule| {
            pieces.iter().any(|piece| match piece {
                Piece::Text(t) => rule.pattern.find_iter(t).any(|m| !m.is_empty()),
                Piece::Token(_) => false,
            })
        });
        match leak {
            Some(rule) => Err(Error::RedactionLeak(rule.name.clone())),
            None => Ok(()),
        }
    }

    /// Redact and verify one captured bundle.
    pub fn redact_bundle(&self, bundle: LogBundle) -> Result<RedactedBundle> {
        let LogBundle {
            container,
            window,
            text,
        } = bundle;

        let raw = match text {
            LogText::Captured(raw) => raw,
            LogText::Failed { reason } => {
                return Err(Error::Other(anyhow::anyhow!(
                    "container {} has no captured logs to redact ({})",
                    container,
                    reason
                )));
            }
        };

        let (redacted, redactions) = self.redact(&container, &raw);
        self.verify(&redacted)?;

        let total: usize = redactions.iter().map(|r| r.count).sum();
        if total > 0 {
            tracing::debug!(container = %container, redactions = total, "redacted log text");
        }

        Ok(RedactedBundle::new(container, window, redacted, redactions))
    }
}
