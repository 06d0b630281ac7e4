use llm::{GeminiClient, GeminiConfig, LanguageModel, LlmError, MediaPart, PromptPair};
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        ..GeminiConfig::default()
    })
    .unwrap()
}

fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_complete_sends_system_instruction_and_user_turn() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .and(matchers::header("x-goog-api-key", "test-key"))
        .and(matchers::body_partial_json(serde_json::json!({
            "systemInstruction": {"parts": [{"text": "be terse"}]},
            "contents": [{"role": "user", "parts": [{"text": "summarize this"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("done")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .complete(&PromptPair::new("be terse", "summarize this"))
        .await
        .unwrap();

    assert_eq!(reply, "done");
}

#[tokio::test]
async fn test_describe_media_sends_inline_data() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .and(matchers::body_partial_json(serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": "Describe what's happening in this video."},
                    {"inlineData": {"mimeType": "video/mp4", "data": "AAEC"}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A demo.")))
        .expect(1)
        .mount(&server)
        .await;

    let media = MediaPart {
        mime_type: "video/mp4".to_string(),
        data_base64: "AAEC".to_string(),
    };
    let reply = client_for(&server)
        .describe_media("Describe what's happening in this video.", &media)
        .await
        .unwrap();

    assert_eq!(reply, "A demo.");
}

#[tokio::test]
async fn test_error_status_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .complete(&PromptPair::new("s", "u"))
        .await;

    match result {
        Err(LlmError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("quota"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .complete(&PromptPair::new("s", "u"))
        .await;

    assert!(matches!(result, Err(LlmError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_client_timeout_maps_to_timeout() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_response("late"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = GeminiClient::new(GeminiConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        request_timeout_secs: Some(1),
        ..GeminiConfig::default()
    })
    .unwrap();

    let result = client.complete(&PromptPair::new("s", "u")).await;
    assert!(matches!(result, Err(LlmError::Timeout)));
}
