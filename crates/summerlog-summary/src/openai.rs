//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use summerlog_config::SummaryConfig;

use crate::error::SummaryError;
use crate::prompt::build_prompt;
use crate::{SummaryRequest, Summarizer};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 1024;

pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_log_chars: usize,
}

impl OpenAiSummarizer {
    pub fn from_config(config: &SummaryConfig) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SummaryError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            max_log_chars: config.max_log_chars,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryError> {
        let prompt = build_prompt(request, self.max_log_chars);
        let url = self.endpoint();

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        tracing::debug!(url = %url, model = %self.model, "requesting summary");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Api { status, body });
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SummaryError::Parse(e.to_string()))?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| SummaryError::Parse("missing choices[0].message.content".into()))?
            .trim();

        if content.is_empty() {
            return Err(SummaryError::Parse("model returned an empty summary".into()));
        }

        Ok(content.to_string())
    }
}
