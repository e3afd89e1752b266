//! Pure session transition function
//!
//! Given the same state and event this always produces the same result, with
//! no I/O side effects. The runtime owns execution of the returned effects.

use super::effect::{Effect, Notice, UploadRejection};
use super::event::{Event, LocalFile};
use super::state::{
    ChatMessage, ChatState, DragState, ResetState, Role, SessionState, UploadState,
    UploadedDocument,
};
use crate::backend::{HistoryMessage, WireRole};
use std::path::Path;
use thiserror::Error;

/// Fixed assistant text appended when a chat round trip fails for any reason.
pub const CHAT_ERROR_TEXT: &str = "Error connecting to backend.";

/// Extensions accepted from the drop path (lowercase). The picker path relies
/// on the OS dialog's filter and is not re-validated.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "pptx", "xlsx"];

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Rejections and contract violations. All of these leave the state
/// untouched; the runtime logs them and moves on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("a chat request is already in flight")]
    ChatBusy,
    #[error("a memory reset is already in flight")]
    ResetBusy,
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &SessionState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Chat dispatch
        // ============================================================
        Event::SubmitQuestion { text } => submit_question(state, &text),
        Event::ChatResponse { answer, sources } => {
            chat_settled(state, ChatMessage::assistant(answer, sources))
        }
        Event::ChatFailed => {
            chat_settled(state, ChatMessage::assistant(CHAT_ERROR_TEXT, Vec::new()))
        }

        // ============================================================
        // Uploads
        // ============================================================
        Event::FilePicked { file } => {
            // Picker path: the dialog's filter owns type validation.
            match upload_decision(state, &file, false) {
                UploadDecision::Accept => Ok(start_upload(state.clone(), file)),
                // Single-flight: dropped without queuing.
                UploadDecision::AlreadyUploading => Ok(TransitionResult::new(state.clone())),
                UploadDecision::Reject(reason) => Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::Notify(Notice::UploadRejected {
                        name: file.name,
                        reason,
                    }))),
            }
        }
        Event::UploadComplete { name } => {
            let mut next = expect_uploading(state, &name)?;
            next.upload = UploadState::Idle;
            next.documents.push(UploadedDocument::ready(name.clone()));
            Ok(TransitionResult::new(next)
                .with_effect(Effect::Notify(Notice::DocumentAdded { name })))
        }
        Event::UploadFailed { name, message } => {
            let mut next = expect_uploading(state, &name)?;
            next.upload = UploadState::Idle;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::Notify(Notice::UploadFailed { name, message })))
        }
        Event::RemoveDocument { name } => {
            let mut next = state.clone();
            let before = next.documents.len();
            next.documents.retain(|d| d.name != name);
            if next.documents.len() == before {
                // Removing an absent name is a no-op.
                Ok(TransitionResult::new(next))
            } else {
                Ok(TransitionResult::new(next)
                    .with_effect(Effect::Notify(Notice::DocumentRemoved { name })))
            }
        }

        // ============================================================
        // Drag gate
        // ============================================================
        Event::DragOver => {
            let mut next = state.clone();
            if !next.upload.is_uploading() {
                next.drag = DragState::Hovering;
            }
            Ok(TransitionResult::new(next))
        }
        Event::DragLeave => {
            let mut next = state.clone();
            next.drag = DragState::Idle;
            Ok(TransitionResult::new(next))
        }
        Event::FilesDropped { files } => {
            // A drop always returns the gate to idle, whatever else happens.
            let mut next = state.clone();
            next.drag = DragState::Idle;

            // First file only; extra files in a multi-file drop are ignored.
            let Some(file) = files.into_iter().next() else {
                return Ok(TransitionResult::new(next));
            };

            match upload_decision(&next, &file, true) {
                UploadDecision::Accept => Ok(start_upload(next, file)),
                // Silently ignored while a transfer is running; no queuing.
                UploadDecision::AlreadyUploading => Ok(TransitionResult::new(next)),
                UploadDecision::Reject(reason) => Ok(TransitionResult::new(next).with_effect(
                    Effect::Notify(Notice::UploadRejected {
                        name: file.name,
                        reason,
                    }),
                )),
            }
        }

        // ============================================================
        // Clear and memory reset
        // ============================================================
        Event::ClearChat => {
            let mut next = state.clone();
            next.transcript.clear();
            next.epoch += 1;
            let epoch = next.epoch;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::Notify(Notice::TranscriptCleared { epoch })))
        }
        Event::ResetConfirmed => {
            if state.reset.is_purging() {
                return Err(TransitionError::ResetBusy);
            }
            let mut next = state.clone();
            next.reset = ResetState::Purging;
            Ok(TransitionResult::new(next).with_effect(Effect::PurgeMemory))
        }
        Event::PurgeComplete => purge_settled(state, true),
        Event::PurgeFailed => purge_settled(state, false),
    }
}

// ============================================================
// Chat helpers
// ============================================================

fn submit_question(
    state: &SessionState,
    text: &str,
) -> Result<TransitionResult, TransitionError> {
    let question = text.trim();
    if question.is_empty() {
        return Err(TransitionError::EmptyQuestion);
    }
    if state.chat.is_waiting() {
        return Err(TransitionError::ChatBusy);
    }

    // History reflects the transcript *before* the optimistic append.
    let history = wire_history(&state.transcript);

    let message = ChatMessage::user(question);
    let mut next = state.clone();
    next.transcript.push(message.clone());
    next.chat = ChatState::Waiting;

    Ok(TransitionResult::new(next)
        .with_effect(Effect::Notify(Notice::MessageAppended { message }))
        .with_effect(Effect::SendChat {
            question: question.to_string(),
            history,
        }))
}

fn chat_settled(
    state: &SessionState,
    message: ChatMessage,
) -> Result<TransitionResult, TransitionError> {
    if !state.chat.is_waiting() {
        return Err(TransitionError::InvalidTransition(
            "chat settlement with no request in flight".to_string(),
        ));
    }
    let mut next = state.clone();
    next.transcript.push(message.clone());
    next.chat = ChatState::Idle;
    Ok(TransitionResult::new(next).with_effect(Effect::Notify(Notice::MessageAppended { message })))
}

/// Map the transcript to the wire history payload, preserving order and
/// normalizing roles to the names the backend expects.
pub(crate) fn wire_history(transcript: &[ChatMessage]) -> Vec<HistoryMessage> {
    transcript
        .iter()
        .map(|m| HistoryMessage {
            role: match m.role {
                Role::User => WireRole::User,
                Role::Assistant => WireRole::Assistant,
            },
            content: m.content.clone(),
        })
        .collect()
}

// ============================================================
// Upload helpers
// ============================================================

enum UploadDecision {
    Accept,
    AlreadyUploading,
    Reject(UploadRejection),
}

/// Submission preconditions, checked in order: in-flight transfer, duplicate
/// name, then (drop path only) the extension allow-list.
fn upload_decision(state: &SessionState, file: &LocalFile, validate_type: bool) -> UploadDecision {
    if state.upload.is_uploading() {
        UploadDecision::AlreadyUploading
    } else if state.has_document(&file.name) {
        UploadDecision::Reject(UploadRejection::Duplicate)
    } else if validate_type && !is_supported_document(&file.name) {
        UploadDecision::Reject(UploadRejection::UnsupportedType)
    } else {
        UploadDecision::Accept
    }
}

fn start_upload(mut next: SessionState, file: LocalFile) -> TransitionResult {
    next.upload = UploadState::Uploading {
        name: file.name.clone(),
    };
    TransitionResult::new(next)
        .with_effect(Effect::Notify(Notice::UploadStarted {
            name: file.name.clone(),
        }))
        .with_effect(Effect::UploadFile { file })
}

/// Case-insensitive extension check against the drop-path allow-list.
pub fn is_supported_document(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}

/// Validate that the named transfer is the one in flight; returns a clone of
/// the state ready for mutation.
fn expect_uploading(state: &SessionState, name: &str) -> Result<SessionState, TransitionError> {
    match &state.upload {
        UploadState::Uploading { name: current } if current == name => Ok(state.clone()),
        _ => Err(TransitionError::InvalidTransition(format!(
            "upload settlement for {name:?} with no matching transfer in flight"
        ))),
    }
}

// ============================================================
// Reset helpers
// ============================================================

/// Both settlement arms wipe local state; the user's destructive intent is
/// honored even when the server purge failed, and the outcome stays
/// distinguishable through the notice.
fn purge_settled(
    state: &SessionState,
    purge_ok: bool,
) -> Result<TransitionResult, TransitionError> {
    if !state.reset.is_purging() {
        return Err(TransitionError::InvalidTransition(
            "purge settlement with no reset in flight".to_string(),
        ));
    }
    let mut next = state.clone();
    next.transcript.clear();
    next.documents.clear();
    next.epoch += 1;
    next.reset = ResetState::Idle;
    Ok(TransitionResult::new(next).with_effect(Effect::Notify(Notice::MemoryWiped { purge_ok })))
}
