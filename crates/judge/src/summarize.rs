use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use llm::{LanguageModel, LlmError, PromptPair};

/// Two-section digest ("TECHNICAL SUMMARY:" / "PRESENTATION SUMMARY:").
/// Passed to the judge verbatim; its structure is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[instrument(skip_all)]
pub async fn summarize(model: &dyn LanguageModel, prompt: &PromptPair) -> Result<Digest, LlmError> {
    let text = model.complete(prompt).await?;
    info!(digest_chars = text.chars().count(), "Summarization complete");
    Ok(Digest::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::testing::{ScriptedModel, Step};

    #[tokio::test]
    async fn test_summarize_returns_raw_reply() {
        let model = ScriptedModel::new().summarize_with(Step::reply("no sections at all"));
        let digest = summarize(&model, &PromptPair::new("s", "u")).await.unwrap();

        assert_eq!(digest.as_str(), "no sections at all");
        assert_eq!(model.prompts(), vec![PromptPair::new("s", "u")]);
    }

    #[tokio::test]
    async fn test_summarize_timeout_is_error() {
        let model = ScriptedModel::new().summarize_with(Step::Timeout);
        let result = summarize(&model, &PromptPair::new("s", "u")).await;
        assert!(matches!(result, Err(LlmError::Timeout)));
    }
}
