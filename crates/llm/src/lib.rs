pub mod client;
pub mod error;
pub mod gemini;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{LanguageModel, MediaPart, PromptPair};
pub use error::LlmError;
pub use gemini::{GeminiClient, GeminiConfig};
