use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

use llm::{LanguageModel, LlmError, MediaPart};

pub const DESCRIBE_INSTRUCTION: &str = "Describe what's happening in this video.";

const FALLBACK_VIDEO_MIME: &str = "video/mp4";

/// An uploaded demo video.
#[derive(Debug, Clone)]
pub struct VideoArtifact {
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

impl VideoArtifact {
    pub fn new(name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        Ok(Self { name, bytes })
    }

    /// Guessed from the file name; MP4 when there is no usable hint.
    pub fn mime_type(&self) -> String {
        self.name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .filter(|mime| mime.type_() == mime_guess::mime::VIDEO)
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_VIDEO_MIME.to_string())
    }
}

/// What the multimodal model said about the video, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescription {
    pub content: String,
    pub length: usize,
}

impl MediaDescription {
    pub fn new(content: String) -> Self {
        let length = content.chars().count();
        Self { content, length }
    }
}

/// One multimodal round trip: base64 video plus the fixed instruction.
#[instrument(skip_all, fields(video_bytes = video.bytes.len()))]
pub async fn describe(
    model: &dyn LanguageModel,
    video: &VideoArtifact,
) -> Result<MediaDescription, LlmError> {
    let media = MediaPart {
        mime_type: video.mime_type(),
        data_base64: STANDARD.encode(&video.bytes),
    };

    let content = model.describe_media(DESCRIBE_INSTRUCTION, &media).await?;
    info!(description_chars = content.chars().count(), "Video described");

    Ok(MediaDescription::new(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::testing::{ScriptedModel, Step};

    #[test]
    fn test_mime_type_from_name() {
        let video = VideoArtifact::new(Some("demo.webm".to_string()), vec![1]);
        assert_eq!(video.mime_type(), "video/webm");

        let video = VideoArtifact::new(Some("demo.MP4".to_string()), vec![1]);
        assert_eq!(video.mime_type(), "video/mp4");
    }

    #[test]
    fn test_mime_type_fallback() {
        assert_eq!(VideoArtifact::new(None, vec![1]).mime_type(), "video/mp4");

        let not_video = VideoArtifact::new(Some("slides.pdf".to_string()), vec![1]);
        assert_eq!(not_video.mime_type(), "video/mp4");
    }

    #[tokio::test]
    async fn test_describe_encodes_video_and_returns_reply_verbatim() {
        let model = ScriptedModel::new().describe_with(Step::reply("  A user logs in.  "));
        let video = VideoArtifact::new(Some("demo.mp4".to_string()), vec![0, 1, 2]);

        let description = describe(&model, &video).await.unwrap();

        assert_eq!(description.content, "  A user logs in.  ");
        assert_eq!(description.length, 19);

        let requests = model.media_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, DESCRIBE_INSTRUCTION);
        assert_eq!(requests[0].1.data_base64, "AAEC");
        assert_eq!(requests[0].1.mime_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_describe_propagates_model_failure() {
        let model = ScriptedModel::new().describe_with(Step::Reject("unsupported format".into()));
        let video = VideoArtifact::new(None, vec![9; 16]);

        let result = describe(&model, &video).await;
        assert!(matches!(result, Err(LlmError::Rejected { .. })));
        assert_eq!(model.describe_calls(), 1);
    }
}
