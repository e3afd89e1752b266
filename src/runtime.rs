//! Session runtime
//!
//! Owns the session state and drives it with events: transitions apply on a
//! single task, effects fan out as background network tasks whose settlements
//! come back in as events, notices broadcast to the front end, and every new
//! state is published on a watch channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::backend::BackendClient;
use crate::session::{Event, Notice, SessionState};
use tokio::sync::{broadcast, mpsc, watch};

/// Capacity of the pending-event channel
const EVENT_BUFFER: usize = 32;
/// Capacity of the notice broadcast channel
const NOTICE_BUFFER: usize = 128;

/// Handle for driving a running session
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub notice_rx: broadcast::Receiver<Notice>,
    pub state_rx: watch::Receiver<SessionState>,
}

/// Wire up the channels and start a session runtime in the background.
pub fn spawn<B: BackendClient + 'static>(backend: B) -> SessionHandle {
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let (notice_tx, notice_rx) = broadcast::channel(NOTICE_BUFFER);
    let (state_tx, state_rx) = watch::channel(SessionState::new());

    let runtime = SessionRuntime::new(
        backend,
        SessionState::new(),
        event_rx,
        event_tx.clone(),
        notice_tx,
        state_tx,
    );
    tokio::spawn(async move {
        runtime.run().await;
    });

    SessionHandle {
        event_tx,
        notice_rx,
        state_rx,
    }
}
