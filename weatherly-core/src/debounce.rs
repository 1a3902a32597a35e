use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;

/// A single-slot pending timer.
///
/// Each [`schedule`](Debouncer::schedule) replaces whatever was pending, so a
/// burst of calls runs only the last one, `delay` after it was scheduled.
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // once fired, the action is detached from the timer slot
            tokio::spawn(action);
        }));
    }

    /// Drops the pending action unless its timer has already fired.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
