use summerlog_core::CaptureWindow;

use crate::redactor::RedactionInfo;

/// One container's logs after redaction and verification.
///
/// Constructed only by [`crate::Redactor::redact_bundle`].
#[derive(Debug, Clone)]
pub struct RedactedBundle {
    container: String,
    window: CaptureWindow,
    text: String,
    redactions: Vec<RedactionInfo>,
}

impl RedactedBundle {
    pub(crate) fn new(
        container: String,
        window: CaptureWindow,
        text: String,
        redactions: Vec<RedactionInfo>,
    ) -> Self {
        Self {
            container,
            window,
            text,
            redactions,
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn window(&self) -> &CaptureWindow {
        &self.window
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn redactions(&self) -> &[RedactionInfo] {
        &self.redactions
    }

    pub fn redaction_count(&self) -> usize {
        self.redactions.iter().map(|r| r.count).sum()
    }
}
