//! Debounced search scheduling
//!
//! Search-as-you-type is modeled as cancel-and-reschedule of a single
//! deferred task: every keystroke supersedes the pending timer
//! (last-write-wins), and an explicit submission fires at once,
//! bypassing the minimum-length gate.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use talon_core::{DEFAULT_DEBOUNCE_MS, MIN_AUTO_QUERY_LEN};

/// Schedules query events for a consumer listening on the paired channel
pub struct SearchScheduler {
    delay: Duration,
    min_len: usize,
    tx: mpsc::UnboundedSender<String>,
    pending: Option<JoinHandle<()>>,
}

impl SearchScheduler {
    /// Create a scheduler with the default debounce interval, together
    /// with the receiver its fired queries arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        Self::with_delay(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }

    pub fn with_delay(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                min_len: MIN_AUTO_QUERY_LEN,
                tx,
                pending: None,
            },
            rx,
        )
    }

    /// Keystroke input: supersede any pending search, then schedule a new
    /// one only if the query is long enough to fire automatically
    pub fn on_input(&mut self, text: &str) {
        self.cancel_pending();

        let query = text.trim().to_string();
        if query.chars().count() < self.min_len {
            return;
        }

        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(query);
        }));
    }

    /// Explicit submission: fires immediately, regardless of length
    pub fn on_submit(&mut self, text: &str) {
        self.cancel_pending();
        let _ = self.tx.send(text.trim().to_string());
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            debug!("Superseded pending search");
        }
    }
}

impl Drop for SearchScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;

    #[tokio::test(start_paused = true)]
    async fn test_short_typed_input_never_fires() {
        let (mut scheduler, mut rx) = SearchScheduler::new();
        scheduler.on_input("ab");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_input_fires_after_delay() {
        let (mut scheduler, mut rx) = SearchScheduler::new();
        scheduler.on_input("abc");

        // Nothing before the interval elapses
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(rx.try_recv().unwrap(), "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retyping_supersedes_pending_search() {
        let (mut scheduler, mut rx) = SearchScheduler::new();
        scheduler.on_input("abc");
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.on_input("abcd");
        tokio::time::sleep(Duration::from_millis(700)).await;

        assert_eq!(rx.try_recv().unwrap(), "abcd");
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_bypasses_length_gate() {
        let (mut scheduler, mut rx) = SearchScheduler::new();
        scheduler.on_submit("ab");
        assert_eq!(rx.try_recv().unwrap(), "ab");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_cancels_pending_timer() {
        let (mut scheduler, mut rx) = SearchScheduler::new();
        scheduler.on_input("abc");
        scheduler.on_submit("xy");

        assert_eq!(rx.try_recv().unwrap(), "xy");
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_shorter_than_gate_cancels_pending() {
        let (mut scheduler, mut rx) = SearchScheduler::new();
        scheduler.on_input("abc");
        scheduler.on_input("ab");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }
}
