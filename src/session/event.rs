//! Events that drive session transitions

use std::path::{Path, PathBuf};

/// Events applied to the session state. User actions arrive from the front
/// end; settlement events arrive from the runtime's spawned network tasks.
#[derive(Debug, Clone)]
pub enum Event {
    // User actions
    /// Submit a chat question (the raw input; trimming happens in the
    /// transition).
    SubmitQuestion { text: String },
    /// A file chosen through the picker. The picker's own type filter is
    /// trusted; no extension re-validation happens on this path.
    FilePicked { file: LocalFile },
    /// Pointer dragged over the drop target.
    DragOver,
    /// Pointer left the drop target.
    DragLeave,
    /// Drop payload released over the target. Only the first file is taken.
    FilesDropped { files: Vec<LocalFile> },
    /// Remove one uploaded document locally.
    RemoveDocument { name: String },
    /// Clear the visible chat history (backend memory untouched).
    ClearChat,
    /// Memory reset, already confirmed at the UI boundary.
    ResetConfirmed,

    // Settlements
    ChatResponse {
        answer: String,
        sources: Vec<String>,
    },
    ChatFailed,
    UploadComplete {
        name: String,
    },
    UploadFailed {
        name: String,
        message: String,
    },
    PurgeComplete,
    PurgeFailed,
}

/// A local file as handed over by the picker or a drop payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name used as the document key and as the upload form filename.
    pub name: String,
    pub path: PathBuf,
}

impl LocalFile {
    #[allow(dead_code)] // Constructor for API completeness
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build from a filesystem path, using its final component as the name.
    /// Returns `None` for paths without a usable file name.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            name,
            path: path.to_path_buf(),
        })
    }
}
