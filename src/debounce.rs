//! Cancel-and-replace delayed work.
//!
//! Used for search-as-you-type and camera sync: only the most recently
//! scheduled unit may run.

use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

/// Owns at most one pending delayed task.
///
/// Scheduling a new task aborts the pending one, as does dropping the
/// debouncer.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `work` after the delay unless superseded first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        }));
    }

    /// Abort the pending task, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            if !task.is_finished() {
                debug!("debounced task superseded");
            }
            task.abort();
        }
    }

    /// Whether a scheduled task has not yet completed.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
