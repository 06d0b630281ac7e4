use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use ingest::{DocumentArtifact, DocumentExtractor, IngestError};
use llm::LanguageModel;

use crate::error::EvaluationError;
use crate::judging::{self, JudgeError, JudgeReport};
use crate::media::{self, VideoArtifact};
use crate::prompt;
use crate::rubric::{self, Criterion, Rubric};
use crate::score::{self, ScoreAudit, ScoringMode};
use crate::summarize::{self, Digest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Validating,
    Extracting,
    Describing,
    Summarizing,
    Judging,
    Done,
    Aborted,
}

/// Progress published while a run is still going, so a caller can show the
/// digest before the judge answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RunEvent {
    State(RunState),
    Warning(String),
    Digest(Digest),
}

/// Raw inputs from the presentation layer. Every field is required; they are
/// optional here so that absence is reported as a validation failure.
#[derive(Debug, Clone, Default)]
pub struct SubmissionInput {
    pub description: Option<String>,
    pub code_snippet: Option<String>,
    pub document: Option<DocumentArtifact>,
    pub video: Option<VideoArtifact>,
}

struct Submission {
    description: String,
    code_snippet: String,
    document: DocumentArtifact,
    video: VideoArtifact,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SubmissionInput {
    fn require(self) -> Result<Submission, EvaluationError> {
        let description = non_blank(self.description).ok_or(EvaluationError::MissingInput {
            field: "project description",
        })?;
        let code_snippet = non_blank(self.code_snippet).ok_or(EvaluationError::MissingInput {
            field: "code snippet",
        })?;
        let document = self.document.ok_or(EvaluationError::MissingInput {
            field: "technical report",
        })?;
        let video = self
            .video
            .filter(|v| !v.bytes.is_empty())
            .ok_or(EvaluationError::MissingInput {
                field: "demo video",
            })?;

        Ok(Submission {
            description,
            code_snippet,
            document,
            video,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub run_id: Uuid,
    /// Non-fatal, e.g. the document had no readable text.
    pub warning: Option<String>,
    pub digest: Digest,
    pub report: JudgeReport,
    pub audit: ScoreAudit,
    pub trace: Vec<RunState>,
}

/// A run that stopped at its first failure. Never carries a report.
#[derive(Debug, Error)]
#[error("evaluation {run_id} aborted while {failed_in:?}: {error}")]
pub struct AbortedRun {
    pub run_id: Uuid,
    pub failed_in: RunState,
    #[source]
    pub error: EvaluationError,
    pub trace: Vec<RunState>,
    pub warning: Option<String>,
    /// Set only if summarization finished before the failure.
    pub digest: Option<Digest>,
}

struct Run {
    id: Uuid,
    trace: Vec<RunState>,
    warning: Option<String>,
    digest: Option<Digest>,
    events: Option<UnboundedSender<RunEvent>>,
}

impl Run {
    fn start(events: Option<UnboundedSender<RunEvent>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trace: vec![RunState::Idle],
            warning: None,
            digest: None,
            events,
        }
    }

    /// A closed receiver only means nobody is watching; the run carries on.
    fn publish(&self, event: RunEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!("Run event receiver dropped");
            }
        }
    }

    fn enter(&mut self, state: RunState) {
        info!(state = ?state, "Run state changed");
        self.trace.push(state);
        self.publish(RunEvent::State(state));
    }

    fn abort(mut self, failed_in: RunState, error: EvaluationError) -> AbortedRun {
        error!(
            failed_in = ?failed_in,
            kind = %error.kind(),
            error = %error,
            "Run aborted"
        );
        self.trace.push(RunState::Aborted);
        self.publish(RunEvent::State(RunState::Aborted));

        AbortedRun {
            run_id: self.id,
            failed_in,
            error,
            trace: self.trace,
            warning: self.warning,
            digest: self.digest,
        }
    }
}

/// Two-stage evaluation: extract and describe, summarize, then judge.
///
/// The model handle is owned by the caller and shared by every stage.
#[derive(Clone)]
pub struct Pipeline {
    model: Arc<dyn LanguageModel>,
    extractor: DocumentExtractor,
    scoring: ScoringMode,
    events: Option<UnboundedSender<RunEvent>>,
}

impl Pipeline {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            extractor: DocumentExtractor::default(),
            scoring: ScoringMode::default(),
            events: None,
        }
    }

    pub fn with_extractor(mut self, extractor: DocumentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringMode) -> Self {
        self.scoring = scoring;
        self
    }

    /// Publish [`RunEvent`]s for every run to `events`.
    pub fn with_events(mut self, events: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn scoring(&self) -> ScoringMode {
        self.scoring
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn evaluate(
        &self,
        input: SubmissionInput,
        criteria: &[Criterion],
    ) -> Result<EvaluationOutcome, AbortedRun> {
        let run = Run::start(self.events.clone());
        let span = info_span!("evaluate", run_id = %run.id, model = %self.model.model_name());
        self.run(run, input, criteria).instrument(span).await
    }

    async fn run(
        &self,
        mut run: Run,
        input: SubmissionInput,
        criteria: &[Criterion],
    ) -> Result<EvaluationOutcome, AbortedRun> {
        run.enter(RunState::Validating);
        let (submission, rubric) = match validate(input, criteria) {
            Ok(valid) => valid,
            Err(e) => return Err(run.abort(RunState::Validating, e)),
        };
        info!(
            criteria = rubric.len(),
            document = %submission.document.fingerprint(),
            "Submission validated"
        );

        // Extraction and description are independent; both must finish before summarizing.
        run.enter(RunState::Extracting);
        run.enter(RunState::Describing);
        let extractor = self.extractor.clone();
        let document = submission.document;
        let extraction_task = tokio::task::spawn_blocking(move || extractor.extract(&document));
        let (extraction, description) = tokio::join!(
            extraction_task,
            media::describe(self.model.as_ref(), &submission.video)
        );

        let extraction = match extraction {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(e)) => return Err(run.abort(RunState::Extracting, EvaluationError::DecodeError(e))),
            Err(join_error) => {
                let e = IngestError::Decode(format!("document parser crashed: {join_error}"));
                return Err(run.abort(RunState::Extracting, EvaluationError::DecodeError(e)));
            }
        };
        if let Some(warning) = &extraction.warning {
            warn!(warning = %warning, "Document extraction warning");
            run.publish(RunEvent::Warning(warning.clone()));
        }
        run.warning = extraction.warning;

        let description = match description {
            Ok(description) => description,
            Err(e) => {
                return Err(run.abort(
                    RunState::Describing,
                    EvaluationError::MediaDescriptionFailed(e),
                ));
            }
        };

        run.enter(RunState::Summarizing);
        let summary_prompt = prompt::build_summary_prompt(&extraction.text, &description);
        let digest = match summarize::summarize(self.model.as_ref(), &summary_prompt).await {
            Ok(digest) => digest,
            Err(e) => {
                return Err(run.abort(
                    RunState::Summarizing,
                    EvaluationError::SummarizationFailed(e),
                ));
            }
        };
        run.publish(RunEvent::Digest(digest.clone()));
        run.digest = Some(digest.clone());

        run.enter(RunState::Judging);
        let judge_prompt = prompt::build_judge_prompt(
            &rubric,
            &submission.description,
            digest.as_str(),
            &submission.code_snippet,
        );
        let report = match judging::judge(self.model.as_ref(), &judge_prompt).await {
            Ok(report) => report,
            Err(e) => return Err(run.abort(RunState::Judging, EvaluationError::JudgingFailed(e))),
        };

        let audit = score::audit(&report, &rubric);
        if let Err(reason) = audit.verify() {
            match self.scoring {
                ScoringMode::Verified => {
                    return Err(run.abort(
                        RunState::Judging,
                        EvaluationError::JudgingFailed(JudgeError::UnverifiableScore(reason)),
                    ));
                }
                ScoringMode::Trusted => {
                    warn!(reason = %reason, "Judge score not verified, reporting as-is");
                }
            }
        }
        if !audit.failed_categories.is_empty() {
            info!(categories = ?audit.failed_categories, "Project failed one or more categories");
        }

        run.enter(RunState::Done);
        Ok(EvaluationOutcome {
            run_id: run.id,
            warning: run.warning,
            digest,
            report,
            audit,
            trace: run.trace,
        })
    }
}

/// Zero-cost gate: nothing external is touched until this passes.
fn validate(
    input: SubmissionInput,
    criteria: &[Criterion],
) -> Result<(Submission, Rubric), EvaluationError> {
    let submission = input.require()?;
    let rubric = rubric::validate(criteria)?;
    Ok((submission, rubric))
}
