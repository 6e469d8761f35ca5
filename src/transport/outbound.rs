//! Per-socket outbound queues. One-shot messages keep their order in a bounded
//! channel; frames go through a single slot so a slow reader only ever gets the
//! newest one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;

pub const MESSAGE_QUEUE: usize = 32;

#[derive(Debug, Default)]
pub struct LatestFrame {
    frame: Mutex<Option<String>>,
    notify: Notify,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any frame the socket has not picked up yet.
    pub fn store(&self, payload: String) {
        *self.slot() = Some(payload);
        self.notify.notify_one();
    }

    pub fn take_latest(&self) -> Option<String> {
        self.slot().take()
    }

    pub async fn wait_for_update(&self) {
        self.notify.notified().await;
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.frame.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
pub struct Outbound {
    messages: mpsc::Sender<String>,
    frame: Arc<LatestFrame>,
}

impl Outbound {
    pub fn new(messages: mpsc::Sender<String>, frame: Arc<LatestFrame>) -> Self {
        Self { messages, frame }
    }

    /// Returns false once the socket side has gone away.
    pub fn frame(&self, payload: String) -> bool {
        if self.messages.is_closed() {
            return false;
        }
        self.frame.store(payload);
        true
    }

    /// A pending frame is queued ahead of the message so the client sees both in
    /// the order they were produced.
    pub fn message(&self, payload: String) -> bool {
        if let Some(frame) = self.frame.take_latest() {
            if !self.enqueue(frame) {
                return false;
            }
        }
        self.enqueue(payload)
    }

    fn enqueue(&self, payload: String) -> bool {
        match self.messages.try_send(payload) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!("outbound queue full, dropping message");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}
