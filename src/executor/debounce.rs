//! Single-slot debounce timer
//!
//! At most one timer is pending. Scheduling again aborts the pending timer
//! and starts a new one, so only the last scheduled action runs.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Runs `action` once the window elapses without another call
    ///
    /// Returns true if a pending timer was replaced. Must be called from
    /// within a tokio runtime.
    pub fn schedule<F>(&mut self, action: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let restarted = self.cancel();
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            action.await;
        }));
        restarted
    }

    /// Aborts the pending timer; returns true if one had not fired yet
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
