pub mod config;
pub mod metrics;
pub mod server;

pub use config::{AppConfig, ServerConfig};
pub use metrics::{Metrics, MetricsSnapshot};
pub use server::{router, AppState, EvaluateRequest, ErrorResponse, UploadedFile};
