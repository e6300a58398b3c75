use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Tokens added per chat message for role and framing.
const PER_MESSAGE_OVERHEAD: usize = 4;
/// Tokens that prime the assistant reply.
const REPLY_PRIMING: usize = 3;

/// Prompt size estimator using tiktoken
#[derive(Clone)]
pub struct TokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TokenEstimator {
    /// Estimator with cl100k_base encoding
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            bpe: Arc::new(tiktoken_rs::cl100k_base()?),
        })
    }

    /// Estimator matching the model's tokenizer, cl100k_base when the model is
    /// unknown.
    pub fn for_model(model: &str) -> anyhow::Result<Self> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Ok(Self { bpe: Arc::new(bpe) }),
            Err(e) => {
                tracing::debug!(model, error = %e, "unknown model, using cl100k_base");
                Self::new()
            }
        }
    }

    /// Token count for a single string
    pub fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Tokens for a system + user chat request
    pub fn estimate_chat(&self, system: &str, user: &str) -> usize {
        self.estimate(system) + self.estimate(user) + 2 * PER_MESSAGE_OVERHEAD + REPLY_PRIMING
    }
}
