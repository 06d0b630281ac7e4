use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::LlmError;

/// A rendered system/user prompt, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Binary media already encoded for transport.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub mime_type: String,
    pub data_base64: String,
}

/// Handle to a language model service. One request, one response; no streaming.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &PromptPair) -> Result<String, LlmError>;

    async fn describe_media(&self, instruction: &str, media: &MediaPart)
    -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}
