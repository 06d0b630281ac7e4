use serde::{Deserialize, Serialize};
use thiserror::Error;

use ingest::IngestError;
use llm::LlmError;

use crate::judging::JudgeError;
use crate::rubric::RubricError;

/// Why a run was aborted. Every variant is caught at its stage boundary.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("missing required input: {field}")]
    MissingInput { field: &'static str },

    #[error("invalid rubric: {0}")]
    InvalidRubric(#[from] RubricError),

    #[error("document could not be read: {0}")]
    DecodeError(#[source] IngestError),

    #[error("video description failed: {0}")]
    MediaDescriptionFailed(#[source] LlmError),

    #[error("summarization failed: {0}")]
    SummarizationFailed(#[source] LlmError),

    #[error("judging failed: {0}")]
    JudgingFailed(#[source] JudgeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    InvalidRubric,
    InvalidWeightTotal,
    DecodeError,
    MediaDescriptionFailed,
    SummarizationFailed,
    JudgingFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::InvalidRubric => "invalid_rubric",
            ErrorKind::InvalidWeightTotal => "invalid_weight_total",
            ErrorKind::DecodeError => "decode_error",
            ErrorKind::MediaDescriptionFailed => "media_description_failed",
            ErrorKind::SummarizationFailed => "summarization_failed",
            ErrorKind::JudgingFailed => "judging_failed",
        }
    }

    /// Fixable by the submitter before any model call is made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::MissingInput
                | ErrorKind::InvalidRubric
                | ErrorKind::InvalidWeightTotal
                | ErrorKind::DecodeError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EvaluationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaluationError::MissingInput { .. } => ErrorKind::MissingInput,
            EvaluationError::InvalidRubric(RubricError::InvalidWeightTotal { .. }) => {
                ErrorKind::InvalidWeightTotal
            }
            EvaluationError::InvalidRubric(_) => ErrorKind::InvalidRubric,
            EvaluationError::DecodeError(_) => ErrorKind::DecodeError,
            EvaluationError::MediaDescriptionFailed(_) => ErrorKind::MediaDescriptionFailed,
            EvaluationError::SummarizationFailed(_) => ErrorKind::SummarizationFailed,
            EvaluationError::JudgingFailed(_) => ErrorKind::JudgingFailed,
        }
    }

    /// Message shown to the submitter, one per failure kind.
    pub fn user_message(&self) -> String {
        match self {
            EvaluationError::MissingInput { field } => format!(
                "Please provide the {field}. The project description, code snippet, technical report and demo video are all required."
            ),
            EvaluationError::InvalidRubric(RubricError::InvalidWeightTotal { total }) => format!(
                "The total weight of all criteria must sum up to 100%. Current sum: {total}%."
            ),
            EvaluationError::InvalidRubric(err) => format!("The judging criteria are invalid: {err}."),
            EvaluationError::DecodeError(_) => {
                "The uploaded document could not be read. Please upload a PDF or UTF-8 text file."
                    .to_string()
            }
            EvaluationError::MediaDescriptionFailed(err) => {
                format!("An error occurred while describing the demo video: {err}")
            }
            EvaluationError::SummarizationFailed(err) => {
                format!("An error occurred during the summarization stage: {err}")
            }
            EvaluationError::JudgingFailed(err) => {
                format!("An error occurred during the judging stage: {err}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_total_has_its_own_kind() {
        let err = EvaluationError::from(RubricError::InvalidWeightTotal { total: 95 });
        assert_eq!(err.kind(), ErrorKind::InvalidWeightTotal);
        assert!(err.user_message().contains("Current sum: 95%"));

        let err = EvaluationError::from(RubricError::Empty);
        assert_eq!(err.kind(), ErrorKind::InvalidRubric);
    }

    #[test]
    fn test_missing_input_names_field() {
        let err = EvaluationError::MissingInput {
            field: "demo video",
        };
        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert!(err.user_message().contains("demo video"));
        assert!(err.kind().is_input_error());
    }

    #[test]
    fn test_model_failures_are_not_input_errors() {
        let err = EvaluationError::SummarizationFailed(LlmError::Timeout);
        assert_eq!(err.kind(), ErrorKind::SummarizationFailed);
        assert!(!err.kind().is_input_error());
        assert!(err.user_message().contains("timed out"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MediaDescriptionFailed).unwrap();
        assert_eq!(json, "\"media_description_failed\"");
    }
}
