//! Environment-driven configuration

use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the answering service
    pub backend_url: String,
    /// Per-request timeout applied by the HTTP client
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let backend_url = std::env::var("DOCCHAT_BACKEND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

        let request_timeout = std::env::var("DOCCHAT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Self {
            backend_url,
            request_timeout,
        }
    }
}
