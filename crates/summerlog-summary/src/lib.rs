//! Summarization boundary
//!
//! Only [`RedactedBundle`]s can be put into a [`SummaryRequest`], so raw log
//! text has no path to the model.

pub mod error;
pub mod openai;
pub mod prompt;

use async_trait::async_trait;
use summerlog_core::CaptureWindow;
use summerlog_security::RedactedBundle;

pub use error::SummaryError;
pub use openai::OpenAiSummarizer;
pub use prompt::{Prompt, SYSTEM_PROMPT, build_prompt};

/// What a run asks the model to summarize
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub window: CaptureWindow,
    pub bundles: Vec<RedactedBundle>,
    /// Containers whose logs could not be fetched
    pub failed: Vec<String>,
}

impl SummaryRequest {
    pub fn containers(&self) -> Vec<String> {
        self.bundles.iter().map(|b| b.container().to_string()).collect()
    }
}

/// Model output tagged with the containers and window it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    /// Markdown, possibly with `severity-*` spans
    pub text: String,
    pub containers: Vec<String>,
    pub window: CaptureWindow,
}

impl SummaryResult {
    pub fn for_request(request: &SummaryRequest, text: String) -> Self {
        Self {
            text,
            containers: request.containers(),
            window: request.window,
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryError>;
}
