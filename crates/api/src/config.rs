use serde::{Deserialize, Serialize};

use judge::ScoringMode;
use llm::GeminiConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: GeminiConfig,
    pub server: ServerConfig,
    pub scoring: ScoringMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Request body limit; uploads arrive base64-encoded inside JSON.
    pub max_upload_bytes: usize,
}

const MIB: usize = 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            max_upload_bytes: 64 * MIB,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: GeminiConfig::default(),
            server: ServerConfig::default(),
            scoring: ScoringMode::Trusted,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `HACKJUDGE_*` variables and the model key variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            model: GeminiConfig::from_env(),
            ..Self::default()
        };

        if let Ok(addr) = std::env::var("HACKJUDGE_BIND") {
            if !addr.is_empty() {
                config.server.bind_addr = addr;
            }
        }

        if let Ok(limit) = std::env::var("HACKJUDGE_MAX_UPLOAD_MB") {
            if let Ok(mb) = limit.parse::<usize>() {
                config.server.max_upload_bytes = mb.clamp(1, 2048) * MIB;
            }
        }

        if let Ok(mode) = std::env::var("HACKJUDGE_SCORING") {
            match mode.parse::<ScoringMode>() {
                Ok(scoring) => config.scoring = scoring,
                Err(e) => tracing::warn!(error = %e, "Ignoring HACKJUDGE_SCORING"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.server.max_upload_bytes, 64 * MIB);
        assert_eq!(config.scoring, ScoringMode::Trusted);
        assert_eq!(config.model.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("secret-key".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(json.contains("\"scoring\":\"trusted\""));
    }
}
