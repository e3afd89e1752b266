//! Backend service contract
//!
//! The answering service is a black box behind three endpoints: document
//! upload, chat turns, and memory purge. The trait seam keeps the runtime
//! generic over the real HTTP client and the test mock.

mod error;
mod http;
mod types;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpBackend;
pub use types::{ChatQuery, ChatReply, HistoryMessage, WireRole};

use async_trait::async_trait;
use std::sync::Arc;

/// Client for the answering service
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// `POST /chat` — one question plus the role-normalized prior history.
    async fn ask(
        &self,
        question: &str,
        history: &[HistoryMessage],
    ) -> Result<ChatReply, BackendError>;

    /// `POST /upload` — one document as a multipart `file` field.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<(), BackendError>;

    /// `DELETE /reset` — purge server-held conversational memory.
    async fn purge(&self) -> Result<(), BackendError>;
}

#[async_trait]
impl<T: BackendClient + ?Sized> BackendClient for Arc<T> {
    async fn ask(
        &self,
        question: &str,
        history: &[HistoryMessage],
    ) -> Result<ChatReply, BackendError> {
        (**self).ask(question, history).await
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<(), BackendError> {
        (**self).upload(name, bytes).await
    }

    async fn purge(&self) -> Result<(), BackendError> {
        (**self).purge().await
    }
}
