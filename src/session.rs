//! Core session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: the
//! transcript, the uploaded-document set, and the per-operation flight flags
//! live in [`SessionState`]; events go through [`transition`]; the returned
//! effects are executed by the runtime.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Notice, UploadRejection};
pub use event::{Event, LocalFile};
pub use state::{ChatMessage, Role, SessionState};
pub use transition::{
    is_supported_document, transition, TransitionError, TransitionResult, ACCEPTED_EXTENSIONS,
    CHAT_ERROR_TEXT,
};
