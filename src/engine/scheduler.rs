//! Cancellable timeout scheduling
//!
//! Timeouts are scheduled work on the tokio runtime, never blocking sleeps.
//! Cancellation races are harmless by construction: the callback still runs
//! against the world lock, where an id check decides whether it is the
//! winner or a no-op.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Scheduler abstraction: `schedule(duration, callback) -> handle`
///
/// Owned by the server and used by every handler that arms a window; the
/// engine never reaches for ambient globals.
#[derive(Debug, Clone, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// Run `callback` after `after` unless the handle is cancelled first
    pub fn schedule<F>(&self, after: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    tracing::trace!("timer cancelled before firing");
                }
                _ = tokio::time::sleep(after) => {
                    callback();
                }
            }
        });

        TimerHandle { token }
    }
}

/// Handle to one scheduled timeout
///
/// Cancels on drop, so taking a pending record out of the world is enough
/// to disarm its window.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
