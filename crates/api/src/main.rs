use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use api::{router, AppConfig, AppState};
use judge::Pipeline;
use llm::GeminiClient;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("HACKJUDGE_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let client = GeminiClient::new(config.model.clone())
        .context("Failed to create model client (set GOOGLE_API_KEY or GEMINI_API_KEY)")?;
    let pipeline = Pipeline::new(Arc::new(client));

    let bind_addr = config.server.bind_addr.clone();
    tracing::info!(
        model = %config.model.model,
        scoring = ?config.scoring,
        max_upload_bytes = config.server.max_upload_bytes,
        "Starting hackathon judge"
    );

    let app = router(AppState::new(pipeline, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
