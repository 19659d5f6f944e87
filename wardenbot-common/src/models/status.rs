use std::sync::Arc;

use parking_lot::Mutex;

/// Connection state published by the bot worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotStatus {
    pub connected: bool,
    /// `name (id)` of the bot account once the gateway said READY.
    pub identity: String,
    pub last_error: String,
}

/// Handle to the one status record shared between the worker and the UI.
///
/// Every write happens inside a single lock scope and readers only ever get a
/// cloned [`BotStatus`], so a half-applied update is never visible.
#[derive(Debug, Clone, Default)]
pub struct SharedStatus {
    inner: Arc<Mutex<BotStatus>>,
}

impl SharedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BotStatus {
        self.inner.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    pub fn mark_connected(&self, identity: impl Into<String>) {
        let identity = identity.into();
        let mut status = self.inner.lock();
        status.connected = true;
        status.identity = identity;
        status.last_error.clear();
    }

    pub fn mark_resumed(&self) {
        let mut status = self.inner.lock();
        status.connected = true;
        status.last_error.clear();
    }

    pub fn mark_disconnected(&self) {
        self.inner.lock().connected = false;
    }

    pub fn mark_failed(&self, message: impl Into<String>) {
        let message = message.into();
        let mut status = self.inner.lock();
        status.connected = false;
        status.last_error = message;
    }

    /// Back to defaults; used right before a fresh worker is spawned.
    pub fn reset(&self) {
        *self.inner.lock() = BotStatus::default();
    }
}
