//! Session state types

// ============================================================================
// Transcript
// ============================================================================

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One chat turn. Immutable once appended to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Source identifiers cited by the backend; empty for user messages and
    /// for the synthetic error message.
    pub sources: Vec<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }
}

// ============================================================================
// Uploaded documents
// ============================================================================

/// Lifecycle of a document in the session set. Entries only exist once the
/// upload has completed, so the only state is `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Ready,
}

/// A successfully uploaded document. `name` is the unique key within the
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub name: String,
    pub status: DocumentStatus,
}

impl UploadedDocument {
    pub fn ready(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: DocumentStatus::Ready,
        }
    }
}

// ============================================================================
// Per-operation flight state
// ============================================================================

/// Chat round-trip flight state: at most one send outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Idle,
    /// A `/chat` request is in flight.
    Waiting,
}

impl ChatState {
    pub fn is_waiting(self) -> bool {
        matches!(self, ChatState::Waiting)
    }
}

/// Upload flight state: at most one transfer outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    /// An `/upload` transfer is in flight for the named file.
    Uploading { name: String },
}

impl UploadState {
    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadState::Uploading { .. })
    }
}

/// Memory-reset flight state: at most one purge outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetState {
    #[default]
    Idle,
    /// A `DELETE /reset` request is in flight.
    Purging,
}

impl ResetState {
    pub fn is_purging(self) -> bool {
        matches!(self, ResetState::Purging)
    }
}

/// Drag gate visual state. Purely cosmetic; holds no memory between drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Hovering,
}

impl DragState {
    #[allow(dead_code)] // State query utility
    pub fn is_hovering(self) -> bool {
        matches!(self, DragState::Hovering)
    }
}

// ============================================================================
// Session state
// ============================================================================

/// The whole client-side session. Owned by the runtime task; mutated only by
/// applying transitions to settled events, so no locking is needed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Ordered chat history, insertion order = chronological order.
    pub transcript: Vec<ChatMessage>,
    /// Uploaded documents, insertion-ordered, names unique.
    pub documents: Vec<UploadedDocument>,
    /// Bumped on every history clear; forces stateful picker controls back
    /// to an unselected state.
    pub epoch: u64,
    pub chat: ChatState,
    pub upload: UploadState,
    pub reset: ResetState,
    pub drag: DragState,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_document(&self, name: &str) -> bool {
        self.documents.iter().any(|d| d.name == name)
    }

    pub fn document_names(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.name.as_str())
    }
}
