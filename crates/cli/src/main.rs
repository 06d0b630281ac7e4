use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{load_criteria, parse_weight, render_rubric, resolve_criteria};
use ingest::DocumentArtifact;
use judge::{
    default_criteria, validate, Criterion, EvaluationError, Pipeline, RunEvent, ScoringMode,
    SubmissionInput, VideoArtifact,
};
use llm::{GeminiClient, GeminiConfig};

#[derive(Parser)]
#[command(name = "hackjudge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Score a hackathon submission against a weighted rubric", long_about = None)]
struct Cli {
    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both model stages on a submission and print the digest and report
    Evaluate {
        /// Project description text
        #[arg(long, conflicts_with = "description_file")]
        description: Option<String>,

        /// Read the project description from a file
        #[arg(long)]
        description_file: Option<PathBuf>,

        /// Source file holding the code snippet
        #[arg(long)]
        code_file: PathBuf,

        /// Technical report (PDF or UTF-8 text)
        #[arg(long)]
        document: PathBuf,

        /// Demo video
        #[arg(long)]
        video: PathBuf,

        /// JSON rubric file
        #[arg(long)]
        rubric: Option<PathBuf>,

        /// Inline criterion, repeatable: --weight "Impact=40"
        #[arg(long = "weight", value_name = "NAME=PCT", value_parser = parse_weight)]
        weights: Vec<Criterion>,

        /// How to treat a stated score that does not match the per-criterion scores
        #[arg(long, env = "HACKJUDGE_SCORING", default_value = "trusted")]
        scoring: ScoringMode,

        /// Model override (default from HACKJUDGE_MODEL)
        #[arg(long)]
        model: Option<String>,
    },

    /// Print the default rubric
    Rubric {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate a rubric without calling the model
    CheckRubric {
        /// JSON rubric file
        #[arg(long)]
        rubric: Option<PathBuf>,

        /// Inline criterion, repeatable
        #[arg(long = "weight", value_name = "NAME=PCT", value_parser = parse_weight)]
        weights: Vec<Criterion>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Evaluate {
            description,
            description_file,
            code_file,
            document,
            video,
            rubric,
            weights,
            scoring,
            model,
        } => {
            let description = match (description, description_file) {
                (Some(text), _) => text,
                (None, Some(path)) => read_text(&path)?,
                (None, None) => bail!("Provide --description or --description-file"),
            };
            let criteria = resolve_criteria(rubric.as_deref(), &weights)?;

            let input = SubmissionInput {
                description: Some(description),
                code_snippet: Some(read_text(&code_file)?),
                document: Some(DocumentArtifact::from_path(&document).await?),
                video: Some(
                    VideoArtifact::from_path(&video)
                        .await
                        .with_context(|| format!("Failed to read {}", video.display()))?,
                ),
            };

            let mut config = GeminiConfig::from_env();
            if let Some(model) = model {
                config.model = model;
            }
            let client = GeminiClient::new(config)
                .context("Failed to create model client (set GOOGLE_API_KEY or GEMINI_API_KEY)")?;

            // The digest is printed as soon as it exists, while the judge is still working.
            let (events_tx, mut events_rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(async move {
                while let Some(event) = events_rx.recv().await {
                    match event {
                        RunEvent::Warning(warning) => eprintln!("⚠️  {warning}"),
                        RunEvent::Digest(digest) => {
                            println!("=== Technical & Presentation Summary ===\n");
                            println!("{digest}\n");
                        }
                        RunEvent::State(state) => info!(state = ?state, "Run progress"),
                    }
                }
            });

            let pipeline = Pipeline::new(Arc::new(client))
                .with_scoring(scoring)
                .with_events(events_tx);
            let result = pipeline.evaluate(input, &criteria).await;
            drop(pipeline);
            printer.await.context("Progress printer failed")?;

            match result {
                Ok(outcome) => {
                    info!(run_id = %outcome.run_id, "Evaluation completed");
                    println!("=== Judge Report ===\n");
                    println!("{}", outcome.report);
                    if let Err(reason) = outcome.audit.verify() {
                        eprintln!("⚠️  Score not verified: {reason}");
                    }
                }
                Err(aborted) => {
                    error!(
                        run_id = %aborted.run_id,
                        failed_in = ?aborted.failed_in,
                        kind = %aborted.error.kind(),
                        "Evaluation aborted"
                    );
                    eprintln!("❌ {}", aborted.error.user_message());
                    bail!("evaluation {} aborted ({})", aborted.run_id, aborted.error.kind());
                }
            }
        }

        Commands::Rubric { json } => {
            let criteria = default_criteria();
            if json {
                println!("{}", serde_json::to_string_pretty(&criteria)?);
            } else {
                let rubric = validate(&criteria)?;
                print!("{}", render_rubric(&rubric));
            }
        }

        Commands::CheckRubric { rubric, weights } => {
            let criteria = match (rubric, weights.is_empty()) {
                (Some(path), true) => load_criteria(&path)?,
                (None, true) => bail!("Provide --rubric or at least one --weight"),
                (_, false) => weights,
            };
            match validate(&criteria) {
                Ok(rubric) => {
                    println!("✅ Rubric is valid ({} criteria)\n", rubric.len());
                    print!("{}", render_rubric(&rubric));
                }
                Err(e) => {
                    let err = EvaluationError::from(e);
                    eprintln!("❌ {}", err.user_message());
                    bail!("invalid rubric ({})", err.kind());
                }
            }
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
