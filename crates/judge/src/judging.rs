use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use llm::{LanguageModel, LlmError, PromptPair};

/// Markdown report written by the judge model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JudgeReport(String);

impl JudgeReport {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JudgeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error(transparent)]
    Model(#[from] LlmError),

    /// Only raised when scores are verified rather than trusted.
    #[error("report score could not be verified: {0}")]
    UnverifiableScore(String),
}

/// Single judge call. The weighted score inside the report is the model's own
/// arithmetic; see [`crate::score`] for the optional cross-check.
#[instrument(skip_all)]
pub async fn judge(model: &dyn LanguageModel, prompt: &PromptPair) -> Result<JudgeReport, JudgeError> {
    let text = model.complete(prompt).await?;
    info!(report_chars = text.chars().count(), "Judging complete");
    Ok(JudgeReport::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::testing::{ScriptedModel, Step};

    #[tokio::test]
    async fn test_judge_passes_prompt_and_returns_report() {
        let model = ScriptedModel::new()
            .judge_with(Step::reply("## Final Weighted Score: 81.0/100.0"));
        let prompt = PromptPair::new("You are the judge. Rubric follows.", "submission");

        let report = judge(&model, &prompt).await.unwrap();

        assert!(report.as_str().contains("81.0/100.0"));
        assert_eq!(model.prompts()[0].user, "submission");
        assert_eq!(model.judge_calls(), 1);
        assert_eq!(model.summarize_calls(), 0);
    }

    #[tokio::test]
    async fn test_judge_wraps_model_error() {
        let model = ScriptedModel::new().judge_with(Step::Reject("quota".into()));
        let result = judge(&model, &PromptPair::new("judge system", "u")).await;
        assert!(matches!(result, Err(JudgeError::Model(LlmError::Rejected { .. }))));
    }
}
