//! Session runtime executor

use crate::backend::BackendClient;
use crate::session::{transition, Effect, Event, Notice, SessionState, TransitionError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Generic session runtime, parameterized over the backend so tests can run
/// against a mock.
pub struct SessionRuntime<B: BackendClient + 'static> {
    state: SessionState,
    backend: Arc<B>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    notice_tx: broadcast::Sender<Notice>,
    state_tx: watch::Sender<SessionState>,
}

impl<B: BackendClient + 'static> SessionRuntime<B> {
    pub fn new(
        backend: B,
        state: SessionState,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        notice_tx: broadcast::Sender<Notice>,
        state_tx: watch::Sender<SessionState>,
    ) -> Self {
        Self {
            state,
            backend: Arc::new(backend),
            event_rx,
            event_tx,
            notice_tx,
            state_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting session runtime");

        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => self.process_event(event),
                else => break,
            }
        }

        tracing::info!("Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let result = match transition(&self.state, event) {
            Ok(result) => result,
            Err(
                error @ (TransitionError::EmptyQuestion
                | TransitionError::ChatBusy
                | TransitionError::ResetBusy),
            ) => {
                // Expected no-ops: busy gates and empty input are dropped.
                tracing::debug!(%error, "Event rejected");
                return;
            }
            Err(error) => {
                tracing::warn!(%error, "Event rejected");
                return;
            }
        };

        self.state = result.new_state;
        let _ = self.state_tx.send(self.state.clone());

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    /// Execute one effect. Network effects spawn and settle back through
    /// `event_tx`, so the flight flag set on entry is released on every exit
    /// path.
    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::Notify(notice) => {
                let _ = self.notice_tx.send(notice);
            }

            Effect::SendChat { question, history } => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tracing::info!(history_len = history.len(), "Sending chat turn (background)");
                    let event = match backend.ask(&question, &history).await {
                        Ok(reply) => Event::ChatResponse {
                            answer: reply.answer,
                            sources: reply.sources,
                        },
                        Err(error) => {
                            tracing::warn!(kind = ?error.kind, %error, "Chat request failed");
                            Event::ChatFailed
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::UploadFile { file } => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tracing::info!(name = %file.name, "Uploading document (background)");
                    let event = match tokio::fs::read(&file.path).await {
                        Err(error) => Event::UploadFailed {
                            message: format!("Failed to read {}: {error}", file.path.display()),
                            name: file.name,
                        },
                        Ok(bytes) => match backend.upload(&file.name, bytes).await {
                            Ok(()) => Event::UploadComplete { name: file.name },
                            Err(error) => {
                                tracing::warn!(kind = ?error.kind, %error, "Upload failed");
                                Event::UploadFailed {
                                    name: file.name,
                                    message: error.message,
                                }
                            }
                        },
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::PurgeMemory => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tracing::info!("Purging backend memory (background)");
                    let event = match backend.purge().await {
                        Ok(()) => Event::PurgeComplete,
                        Err(error) => {
                            // The local wipe proceeds regardless.
                            tracing::warn!(kind = ?error.kind, %error, "Memory purge failed");
                            Event::PurgeFailed
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
            }
        }
    }
}
