//! Coalescing "peer status changed" wake-up.
//!
//! Producers never block and never queue: any number of notifications issued while
//! nobody is waiting collapse into a single stored permit. Consumers re-read the
//! [`crate::PeerStatusTable`] on every wake-up, so the count is irrelevant.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Single-slot, closable wake-up signal.
#[derive(Debug, Default)]
pub struct StatusSignal {
    notify: Notify,
    closed: AtomicBool,
}

impl StatusSignal {
    /// Open signal with no stored permit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake one waiter, or store one permit if nobody is waiting. No-op once closed.
    pub fn notify(&self) {
        if !self.is_closed() {
            self.notify.notify_one();
        }
    }

    /// Wait for the next notification.
    ///
    /// Returns `false` once the signal is closed, including when closed while waiting.
    pub async fn wait(&self) -> bool {
        let mut notified = std::pin::pin!(self.notify.notified());
        // Register before checking `closed` so a concurrent close cannot slip between.
        notified.as_mut().enable();

        if self.is_closed() {
            return false;
        }

        notified.await;
        !self.is_closed()
    }

    /// Close the signal and release every waiter.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Whether [`Self::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    const WAIT: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_wakeup() {
        let signal = StatusSignal::new();

        // Producer never blocks, even with nobody waiting
        for _ in 0..10 {
            signal.notify();
        }

        assert_eq!(tokio::time::timeout(WAIT, signal.wait()).await, Ok(true));
        assert!(tokio::time::timeout(WAIT, signal.wait()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_wakes_pending_waiter() {
        let signal = Arc::new(StatusSignal::new());

        let waiter = tokio::spawn({
            let signal = Arc::clone(&signal);
            async move { signal.wait().await }
        });
        tokio::task::yield_now().await;

        signal.notify();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_releases_waiter() {
        let signal = Arc::new(StatusSignal::new());

        let waiter = tokio::spawn({
            let signal = Arc::clone(&signal);
            async move { signal.wait().await }
        });
        tokio::task::yield_now().await;

        signal.close();
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_after_close_returns_immediately() {
        let signal = StatusSignal::new();
        signal.notify();
        signal.close();
        signal.notify();

        assert!(signal.is_closed());
        assert_eq!(tokio::time::timeout(WAIT, signal.wait()).await, Ok(false));
    }
}
