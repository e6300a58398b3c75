//! Secret redaction for log text leaving the machine
//!
//! Built-in rules run first, then user-supplied rules in declared order. The
//! only way to obtain a [`RedactedBundle`] is through [`Redactor`], so code
//! downstream of this crate cannot be handed unredacted text by mistake.

pub mod bundle;
pub mod redactor;
pub mod rules;

pub use bundle::RedactedBundle;
pub use redactor::{RedactionInfo, Redactor};
pub use rules::{CUSTOM_TOKEN, RedactionRule, RuleKind, validate_custom_pattern};
