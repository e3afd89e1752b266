//! reqwest implementation of the backend contract

use super::types::{ChatQuery, ChatReply, HistoryMessage};
use super::{BackendClient, BackendError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// HTTP client for the answering service
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn ask(
        &self,
        question: &str,
        history: &[HistoryMessage],
    ) -> Result<ChatReply, BackendError> {
        let request = ChatQuery { question, history };

        let response = self
            .client
            .post(self.endpoint("/chat"))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        parse_chat_reply(&body)
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<(), BackendError> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(name.to_string()));

        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        // Success body carries a status string the session does not act on.
        Ok(())
    }

    async fn purge(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.endpoint("/reset"))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        Ok(())
    }
}

fn classify_transport(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        BackendError::network(format!("Connection failed: {e}"))
    } else {
        BackendError::unknown(format!("Request failed: {e}"))
    }
}

fn classify_status(status: StatusCode, body: &str) -> BackendError {
    match status.as_u16() {
        400 => BackendError::invalid_request(format!("Invalid request: {body}")),
        500..=599 => BackendError::server(format!("Server error: {body}")),
        _ => BackendError::unknown(format!("HTTP {status}: {body}")),
    }
}

// /chat wire shape; `sources` may be absent entirely.
#[derive(Debug, Deserialize)]
struct ChatReplyWire {
    answer: String,
    #[serde(default)]
    sources: Option<Vec<String>>,
}

/// Typed parse of the `/chat` body. A shape mismatch is a `Malformed` error
/// rather than silently-missing fields.
fn parse_chat_reply(body: &str) -> Result<ChatReply, BackendError> {
    let wire: ChatReplyWire = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(format!("Unexpected /chat response: {e}")))?;
    Ok(ChatReply {
        answer: wire.answer,
        sources: wire.sources.unwrap_or_default(),
    })
}
