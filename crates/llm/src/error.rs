use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model call timed out")]
    Timeout,

    #[error("request to model service failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service accepted the request but refused to answer it
    /// (safety block, unsupported media, size limit).
    #[error("model rejected the request: {reason}")]
    Rejected { reason: String },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("unexpected response from model service: {0}")]
    MalformedResponse(String),

    #[error("no API key configured (set GOOGLE_API_KEY or GEMINI_API_KEY)")]
    MissingApiKey,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err)
        }
    }
}
