pub mod error;
pub mod judging;
pub mod media;
pub mod pipeline;
pub mod prompt;
pub mod rubric;
pub mod score;
pub mod summarize;

pub use error::{ErrorKind, EvaluationError};
pub use judging::{JudgeError, JudgeReport};
pub use media::{MediaDescription, VideoArtifact};
pub use pipeline::{
    AbortedRun, EvaluationOutcome, Pipeline, RunEvent, RunState, SubmissionInput,
};
pub use rubric::{default_criteria, validate, Criterion, Rubric, RubricError, WeightedCriterion};
pub use score::{ScoreAudit, ScoringMode};
pub use summarize::Digest;
