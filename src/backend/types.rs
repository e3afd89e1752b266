//! Wire types for the backend contract

use serde::{Deserialize, Serialize};

/// Role names the backend expects in the history payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Assistant,
}

/// One prior turn in the `/chat` history payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: WireRole,
    pub content: String,
}

/// Request body for `POST /chat`
#[derive(Debug, Serialize)]
pub struct ChatQuery<'a> {
    pub question: &'a str,
    pub history: &'a [HistoryMessage],
}

/// Parsed success body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub answer: String,
    /// Ordered source identifiers; empty when the backend cited none.
    pub sources: Vec<String>,
}
