//! Scripted in-memory model for exercising pipelines without a network.
//!
//! A `complete` call whose system prompt mentions the judge marker (by default
//! "judge", case-insensitive) is answered with the judge step; every other
//! completion is treated as a summarization.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::client::{LanguageModel, MediaPart, PromptPair};
use crate::LlmError;

#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Timeout,
    Reject(String),
}

impl Step {
    pub fn reply(text: impl Into<String>) -> Self {
        Step::Reply(text.into())
    }

    fn run(&self) -> Result<String, LlmError> {
        match self {
            Step::Reply(text) => Ok(text.clone()),
            Step::Timeout => Err(LlmError::Timeout),
            Step::Reject(reason) => Err(LlmError::Rejected {
                reason: reason.clone(),
            }),
        }
    }
}

pub struct ScriptedModel {
    describe: Step,
    summarize: Step,
    judge: Step,
    judge_marker: String,
    describe_calls: AtomicUsize,
    summarize_calls: AtomicUsize,
    judge_calls: AtomicUsize,
    prompts: Mutex<Vec<PromptPair>>,
    media: Mutex<Vec<(String, MediaPart)>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            describe: Step::reply("A developer demos the app in a browser."),
            summarize: Step::reply(
                "TECHNICAL SUMMARY:\nA small web app.\n\nPRESENTATION SUMMARY:\nThe demo works.",
            ),
            judge: Step::reply("# Hackathon Judge Report\n\n## Final Weighted Score: 50.0/100.0"),
            judge_marker: "judge".to_string(),
            describe_calls: AtomicUsize::new(0),
            summarize_calls: AtomicUsize::new(0),
            judge_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            media: Mutex::new(Vec::new()),
        }
    }

    pub fn describe_with(mut self, step: Step) -> Self {
        self.describe = step;
        self
    }

    pub fn summarize_with(mut self, step: Step) -> Self {
        self.summarize = step;
        self
    }

    pub fn judge_with(mut self, step: Step) -> Self {
        self.judge = step;
        self
    }

    /// Changes the system-prompt text that marks a completion as a judge call.
    pub fn judge_marker(mut self, marker: impl Into<String>) -> Self {
        self.judge_marker = marker.into().to_lowercase();
        self
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn summarize_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }

    pub fn judge_calls(&self) -> usize {
        self.judge_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.describe_calls() + self.summarize_calls() + self.judge_calls()
    }

    fn is_judge_call(&self, prompt: &PromptPair) -> bool {
        prompt.system.to_lowercase().contains(&self.judge_marker)
    }

    /// Prompts received by `complete`, in call order.
    pub fn prompts(&self) -> Vec<PromptPair> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Instructions and media received by `describe_media`.
    pub fn media_requests(&self) -> Vec<(String, MediaPart)> {
        self.media.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &PromptPair) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        if self.is_judge_call(prompt) {
            self.judge_calls.fetch_add(1, Ordering::SeqCst);
            self.judge.run()
        } else {
            self.summarize_calls.fetch_add(1, Ordering::SeqCst);
            self.summarize.run()
        }
    }

    async fn describe_media(
        &self,
        instruction: &str,
        media: &MediaPart,
    ) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.media.lock() {
            requests.push((instruction.to_string(), media.clone()));
        }
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.describe.run()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
