//! Effects produced by session transitions

use super::event::LocalFile;
use super::state::ChatMessage;
use crate::backend::HistoryMessage;

/// Effects to be executed after a transition. At most one network effect is
/// produced per transition; the runtime spawns it and feeds the settlement
/// back in as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the chat round trip with the role-normalized prior history.
    SendChat {
        question: String,
        history: Vec<HistoryMessage>,
    },

    /// Read the file's bytes and transfer them to the backend.
    UploadFile { file: LocalFile },

    /// Ask the backend to forget its server-held conversational memory.
    PurgeMemory,

    /// Surface a notice to the presentation layer.
    Notify(Notice),
}

/// Notices broadcast to the front end. These are the only channel through
/// which the session reports outcomes; none of them carries control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A message was appended to the transcript (user or assistant side).
    MessageAppended { message: ChatMessage },
    /// The visible history was cleared; `epoch` is the new epoch value.
    TranscriptCleared { epoch: u64 },
    /// An upload transfer started for the named file.
    UploadStarted { name: String },
    /// Upload completed; the document is in the session set.
    DocumentAdded { name: String },
    /// A document was removed locally.
    DocumentRemoved { name: String },
    /// A submission was rejected before any network call.
    UploadRejected {
        name: String,
        reason: UploadRejection,
    },
    /// The transfer failed (transport error, non-success response, or an
    /// unreadable local file). The document set is unchanged.
    UploadFailed { name: String, message: String },
    /// Memory reset finished. Local state is wiped regardless; `purge_ok`
    /// reports whether the server-side purge actually succeeded.
    MemoryWiped { purge_ok: bool },
}

/// Why an upload submission was turned away without a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    /// A document with this name is already in the session set.
    Duplicate,
    /// Extension not on the drop-path allow-list.
    UnsupportedType,
}
