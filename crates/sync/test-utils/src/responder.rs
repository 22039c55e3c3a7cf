use std::sync::atomic::{AtomicBool, Ordering};

use chainsync_api::{ResponderError, SyncPeerResponder};
use parking_lot::Mutex;

/// Responder recording start/close calls.
#[derive(Debug, Default)]
pub struct MockResponder {
    started: AtomicBool,
    closed: AtomicBool,
    close_error: Mutex<Option<String>>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `close` fail with `message`.
    pub fn fail_close(&self, message: impl Into<String>) {
        *self.close_error.lock() = Some(message.into());
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SyncPeerResponder for MockResponder {
    fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    fn close(&self) -> Result<(), ResponderError> {
        if let Some(message) = self.close_error.lock().take() {
            return Err(ResponderError::Shutdown { message });
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
