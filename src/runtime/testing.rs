//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::SessionRuntime;
use crate::backend::{BackendClient, BackendError, ChatReply, HistoryMessage};
use crate::session::{Event, Notice, SessionState};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued results and records every request
pub struct MockBackend {
    chat_results: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
    upload_results: Mutex<VecDeque<Result<(), BackendError>>>,
    purge_results: Mutex<VecDeque<Result<(), BackendError>>>,
    /// Record of chat requests: (question, history)
    pub chat_requests: Mutex<Vec<(String, Vec<HistoryMessage>)>>,
    /// Record of uploads: (name, byte count)
    pub upload_requests: Mutex<Vec<(String, usize)>>,
    /// Number of purge calls made
    pub purge_requests: Mutex<usize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            chat_results: Mutex::new(VecDeque::new()),
            upload_results: Mutex::new(VecDeque::new()),
            purge_results: Mutex::new(VecDeque::new()),
            chat_requests: Mutex::new(Vec::new()),
            upload_requests: Mutex::new(Vec::new()),
            purge_requests: Mutex::new(0),
        }
    }

    pub fn queue_chat(&self, reply: ChatReply) {
        self.chat_results.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_chat_error(&self, error: BackendError) {
        self.chat_results.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_upload_ok(&self) {
        self.upload_results.lock().unwrap().push_back(Ok(()));
    }

    pub fn queue_upload_error(&self, error: BackendError) {
        self.upload_results.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_purge_ok(&self) {
        self.purge_results.lock().unwrap().push_back(Ok(()));
    }

    pub fn queue_purge_error(&self, error: BackendError) {
        self.purge_results.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_chat_requests(&self) -> Vec<(String, Vec<HistoryMessage>)> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn recorded_uploads(&self) -> Vec<(String, usize)> {
        self.upload_requests.lock().unwrap().clone()
    }

    pub fn purge_count(&self) -> usize {
        *self.purge_requests.lock().unwrap()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn ask(
        &self,
        question: &str,
        history: &[HistoryMessage],
    ) -> Result<ChatReply, BackendError> {
        self.chat_requests
            .lock()
            .unwrap()
            .push((question.to_string(), history.to_vec()));
        self.chat_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::network("No mock response queued")))
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<(), BackendError> {
        self.upload_requests
            .lock()
            .unwrap()
            .push((name.to_string(), bytes.len()));
        self.upload_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::network("No mock response queued")))
    }

    async fn purge(&self) -> Result<(), BackendError> {
        *self.purge_requests.lock().unwrap() += 1;
        self.purge_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::network("No mock response queued")))
    }
}

// ============================================================================
// Delayed Mock Backend (for single-flight and concurrency tests)
// ============================================================================

/// Mock backend with a configurable delay before each settlement. In-flight
/// operations are observed through the runtime's state watch channel, which
/// updates before the spawned request can settle.
pub struct DelayedMockBackend {
    pub inner: MockBackend,
    delay: Duration,
}

impl DelayedMockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockBackend::new(),
            delay,
        }
    }
}

#[async_trait]
impl BackendClient for DelayedMockBackend {
    async fn ask(
        &self,
        question: &str,
        history: &[HistoryMessage],
    ) -> Result<ChatReply, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.ask(question, history).await
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<(), BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.upload(name, bytes).await
    }

    async fn purge(&self) -> Result<(), BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.purge().await
    }
}

// ============================================================================
// Test Session Harness
// ============================================================================

/// A running session runtime plus everything a test needs to poke at it
pub struct TestSession<B: BackendClient + 'static> {
    pub backend: Arc<B>,
    pub event_tx: mpsc::Sender<Event>,
    pub notice_rx: broadcast::Receiver<Notice>,
    pub state_rx: watch::Receiver<SessionState>,
    _runtime: tokio::task::JoinHandle<()>,
}

impl<B: BackendClient + 'static> TestSession<B> {
    pub fn start(backend: B) -> Self {
        Self::start_with_state(backend, SessionState::new())
    }

    pub fn start_with_state(backend: B, state: SessionState) -> Self {
        let backend = Arc::new(backend);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (notice_tx, notice_rx) = broadcast::channel(128);
        let (state_tx, state_rx) = watch::channel(state.clone());

        let runtime = SessionRuntime::new(
            backend.clone(),
            state,
            event_rx,
            event_tx.clone(),
            notice_tx,
            state_tx,
        );
        let handle = tokio::spawn(async move {
            runtime.run().await;
        });

        Self {
            backend,
            event_tx,
            notice_rx,
            state_rx,
            _runtime: handle,
        }
    }

    pub async fn send(&self, event: Event) {
        self.event_tx
            .send(event)
            .await
            .expect("runtime should be running");
    }

    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Wait until the published state satisfies the predicate.
    pub async fn wait_for_state(
        &mut self,
        timeout: Duration,
        predicate: impl Fn(&SessionState) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if predicate(&self.state_rx.borrow_and_update()) {
                return true;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return false;
            }
            match tokio::time::timeout(deadline - now, self.state_rx.changed()).await {
                Ok(Ok(())) => continue,
                _ => return false,
            }
        }
    }

    /// Wait for the next notice matching the predicate.
    pub async fn wait_for_notice(
        &mut self,
        timeout: Duration,
        predicate: impl Fn(&Notice) -> bool,
    ) -> Option<Notice> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return None;
            }
            match tokio::time::timeout(deadline - now, self.notice_rx.recv()).await {
                Ok(Ok(notice)) if predicate(&notice) => return Some(notice),
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
                _ => return None,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{ChatState, UploadState, UploadedDocument};
    use crate::session::{ChatMessage, LocalFile, Role, UploadRejection, CHAT_ERROR_TEXT};
    use std::path::PathBuf;

    const WAIT: Duration = Duration::from_secs(2);

    fn reply(answer: &str, sources: &[&str]) -> ChatReply {
        ChatReply {
            answer: answer.to_string(),
            sources: sources.iter().map(ToString::to_string).collect(),
        }
    }

    fn ask(text: &str) -> Event {
        Event::SubmitQuestion {
            text: text.to_string(),
        }
    }

    /// Write a fixture document and return it as a picked/dropped file.
    fn fixture(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> LocalFile {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("should write fixture");
        LocalFile::new(name, path)
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let backend = MockBackend::new();
        backend.queue_chat(reply("$5,000", &["report.pdf"]));

        let mut session = TestSession::start(backend);
        session.send(ask("What is the budget?")).await;

        assert!(
            session
                .wait_for_state(WAIT, |s| s.transcript.len() == 2)
                .await
        );

        let state = session.state();
        assert_eq!(state.transcript[0].role, Role::User);
        assert_eq!(state.transcript[0].content, "What is the budget?");
        assert_eq!(state.transcript[1].role, Role::Assistant);
        assert_eq!(state.transcript[1].content, "$5,000");
        assert_eq!(state.transcript[1].sources, vec!["report.pdf".to_string()]);
        assert_eq!(state.chat, ChatState::Idle);

        let requests = session.backend.recorded_chat_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "What is the budget?");
        assert!(requests[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_chat_failure_appends_error_message() {
        let backend = MockBackend::new();
        backend.queue_chat_error(BackendError::network("connection refused"));

        let mut session = TestSession::start(backend);
        session.send(ask("hello?")).await;

        assert!(
            session
                .wait_for_state(WAIT, |s| s.transcript.len() == 2)
                .await
        );

        let state = session.state();
        assert_eq!(state.transcript[1].content, CHAT_ERROR_TEXT);
        assert!(state.transcript[1].sources.is_empty());
        assert_eq!(state.chat, ChatState::Idle);
    }

    #[tokio::test]
    async fn test_second_turn_history_reflects_settled_first_turn() {
        let backend = MockBackend::new();
        backend.queue_chat(reply("$5,000", &[]));
        backend.queue_chat(reply("June 1st", &[]));

        let mut session = TestSession::start(backend);
        session.send(ask("What is the budget?")).await;
        assert!(
            session
                .wait_for_state(WAIT, |s| s.transcript.len() == 2)
                .await
        );
        session.send(ask("And the deadline?")).await;
        assert!(
            session
                .wait_for_state(WAIT, |s| s.transcript.len() == 4)
                .await
        );

        let requests = session.backend.recorded_chat_requests();
        assert_eq!(requests.len(), 2);
        let history = &requests[1].1;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "What is the budget?");
        assert_eq!(history[1].content, "$5,000");
    }

    #[tokio::test]
    async fn test_empty_question_is_a_no_op() {
        let backend = MockBackend::new();
        let session = TestSession::start(backend);

        session.send(ask("   ")).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(session.state().transcript.is_empty());
        assert!(session.backend.recorded_chat_requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_adds_ready_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = fixture(&dir, "report.pdf", b"%PDF-1.4 fixture");

        let backend = MockBackend::new();
        backend.queue_upload_ok();

        let mut session = TestSession::start(backend);
        session.send(Event::FilePicked { file }).await;

        assert!(
            session
                .wait_for_state(WAIT, |s| s.documents.len() == 1
                    && s.upload == UploadState::Idle)
                .await
        );

        assert_eq!(session.state().documents[0].name, "report.pdf");
        let uploads = session.backend.recorded_uploads();
        assert_eq!(uploads, vec![("report.pdf".to_string(), 16)]);
    }

    #[tokio::test]
    async fn test_duplicate_upload_never_reaches_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let file = fixture(&dir, "report.pdf", b"bytes");

        let state = SessionState {
            documents: vec![UploadedDocument::ready("report.pdf")],
            ..SessionState::new()
        };
        let mut session = TestSession::start_with_state(MockBackend::new(), state);

        session.send(Event::FilePicked { file }).await;

        let notice = session
            .wait_for_notice(WAIT, |n| matches!(n, Notice::UploadRejected { .. }))
            .await
            .expect("should reject the duplicate");
        assert!(matches!(
            notice,
            Notice::UploadRejected {
                reason: UploadRejection::Duplicate,
                ..
            }
        ));

        assert_eq!(session.state().documents.len(), 1);
        assert!(session.backend.recorded_uploads().is_empty());
    }

    #[tokio::test]
    async fn test_drop_validates_extension() {
        let dir = tempfile::tempdir().unwrap();
        let image = fixture(&dir, "image.png", b"png");
        let notes = fixture(&dir, "notes.docx", b"docx bytes");

        let backend = MockBackend::new();
        backend.queue_upload_ok();

        let mut session = TestSession::start(backend);

        // The image is turned away without a network call.
        session
            .send(Event::FilesDropped {
                files: vec![image],
            })
            .await;
        let notice = session
            .wait_for_notice(WAIT, |n| matches!(n, Notice::UploadRejected { .. }))
            .await
            .expect("should reject the image");
        assert!(matches!(
            notice,
            Notice::UploadRejected {
                reason: UploadRejection::UnsupportedType,
                ..
            }
        ));
        assert!(session.backend.recorded_uploads().is_empty());

        // The document goes through.
        session
            .send(Event::FilesDropped {
                files: vec![notes],
            })
            .await;
        assert!(
            session
                .wait_for_state(WAIT, |s| s.documents.len() == 1)
                .await
        );
        assert_eq!(session.state().documents[0].name, "notes.docx");
    }

    #[tokio::test]
    async fn test_upload_is_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let first = fixture(&dir, "first.pdf", b"first");
        let second = fixture(&dir, "second.pdf", b"second");

        let backend = DelayedMockBackend::new(Duration::from_millis(100));
        backend.inner.queue_upload_ok();

        let mut session = TestSession::start(backend);
        session.send(Event::FilePicked { file: first }).await;
        assert!(
            session
                .wait_for_state(WAIT, |s| s.upload.is_uploading())
                .await
        );

        // Dropped while the first transfer is still in flight: ignored.
        session
            .send(Event::FilesDropped {
                files: vec![second],
            })
            .await;

        assert!(
            session
                .wait_for_state(WAIT, |s| s.upload == UploadState::Idle
                    && !s.documents.is_empty())
                .await
        );

        let names: Vec<String> = session.state().document_names().map(String::from).collect();
        assert_eq!(names, vec!["first.pdf".to_string()]);
        assert_eq!(session.backend.inner.recorded_uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_and_upload_run_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let file = fixture(&dir, "report.pdf", b"bytes");

        let backend = DelayedMockBackend::new(Duration::from_millis(100));
        backend.inner.queue_chat(reply("ok", &[]));
        backend.inner.queue_upload_ok();

        let mut session = TestSession::start(backend);
        session.send(ask("question")).await;
        session.send(Event::FilePicked { file }).await;

        // Both kinds in flight at once: the flags are independent.
        assert!(
            session
                .wait_for_state(WAIT, |s| s.chat.is_waiting() && s.upload.is_uploading())
                .await
        );

        // And both settle.
        assert!(
            session
                .wait_for_state(WAIT, |s| s.transcript.len() == 2
                    && s.documents.len() == 1)
                .await
        );
    }

    #[tokio::test]
    async fn test_reset_wipes_locally_even_when_purge_fails() {
        let backend = MockBackend::new();
        backend.queue_purge_error(BackendError::server("boom"));

        let state = SessionState {
            transcript: vec![
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi", vec![]),
            ],
            documents: vec![UploadedDocument::ready("report.pdf")],
            ..SessionState::new()
        };
        let mut session = TestSession::start_with_state(backend, state);

        session.send(Event::ResetConfirmed).await;

        let notice = session
            .wait_for_notice(WAIT, |n| matches!(n, Notice::MemoryWiped { .. }))
            .await
            .expect("reset should settle");
        assert_eq!(notice, Notice::MemoryWiped { purge_ok: false });

        let state = session.state();
        assert!(state.transcript.is_empty());
        assert!(state.documents.is_empty());
        assert_eq!(session.backend.purge_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_success_reports_purge_ok() {
        let backend = MockBackend::new();
        backend.queue_purge_ok();

        let mut session = TestSession::start(backend);
        session.send(Event::ResetConfirmed).await;

        let notice = session
            .wait_for_notice(WAIT, |n| matches!(n, Notice::MemoryWiped { .. }))
            .await
            .expect("reset should settle");
        assert_eq!(notice, Notice::MemoryWiped { purge_ok: true });
    }

    #[tokio::test]
    async fn test_upload_transport_error_leaves_set_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = fixture(&dir, "report.pdf", b"bytes");

        let backend = MockBackend::new();
        backend.queue_upload_error(BackendError::server("boom"));

        let mut session = TestSession::start(backend);
        session.send(Event::FilePicked { file }).await;

        let notice = session
            .wait_for_notice(WAIT, |n| matches!(n, Notice::UploadFailed { .. }))
            .await
            .expect("transfer failure should surface");
        assert!(matches!(notice, Notice::UploadFailed { name, .. } if name == "report.pdf"));

        let state = session.state();
        assert_eq!(state.upload, UploadState::Idle);
        assert!(state.documents.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_settles_as_upload_failure() {
        let backend = MockBackend::new();
        let mut session = TestSession::start(backend);

        session
            .send(Event::FilePicked {
                file: LocalFile::new("ghost.pdf", PathBuf::from("/nonexistent/ghost.pdf")),
            })
            .await;

        let notice = session
            .wait_for_notice(WAIT, |n| matches!(n, Notice::UploadFailed { .. }))
            .await
            .expect("unreadable file should settle as a failure");
        assert!(matches!(notice, Notice::UploadFailed { name, .. } if name == "ghost.pdf"));

        let state = session.state();
        assert_eq!(state.upload, UploadState::Idle);
        assert!(state.documents.is_empty());
        assert!(session.backend.recorded_uploads().is_empty());
    }

    #[tokio::test]
    async fn test_clear_chat_bumps_epoch_and_keeps_documents() {
        let state = SessionState {
            transcript: vec![ChatMessage::user("hello")],
            documents: vec![UploadedDocument::ready("report.pdf")],
            ..SessionState::new()
        };
        let mut session = TestSession::start_with_state(MockBackend::new(), state);

        session.send(Event::ClearChat).await;

        assert!(
            session
                .wait_for_state(WAIT, |s| s.transcript.is_empty() && s.epoch == 1)
                .await
        );
        assert_eq!(session.state().documents.len(), 1);
    }
}
