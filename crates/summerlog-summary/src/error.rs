use summerlog_core::Transient;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("summary client misconfigured: {0}")]
    Client(String),
}

impl Transient for SummaryError {
    fn is_transient(&self) -> bool {
        match self {
            // Connection failures and timeouts
            SummaryError::Http(_) => true,
            SummaryError::Api { status, .. } => *status == 429 || *status >= 500,
            SummaryError::Parse(_) | SummaryError::Client(_) => false,
        }
    }
}

impl From<SummaryError> for summerlog_core::Error {
    fn from(err: SummaryError) -> Self {
        summerlog_core::Error::SummaryRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> SummaryError {
        SummaryError::Api {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(429).is_transient());
        assert!(api(503).is_transient());
        assert!(!api(401).is_transient());
        assert!(!api(400).is_transient());
        assert!(!SummaryError::Parse("missing content".into()).is_transient());
    }

    #[test]
    fn test_maps_to_summary_exit_code() {
        let err: summerlog_core::Error = api(401).into();
        assert_eq!(err.exit_code(), summerlog_core::exit_code::SUMMARY);
    }
}
