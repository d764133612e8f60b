//! Debounce timer for recalculation: the latest poke wins.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Coalesces bursts of edits into a single settle event.
///
/// Every [`poke`](Debouncer::poke) pushes the deadline out to `now + delay`.
/// [`settled`](Debouncer::settled) resolves once the deadline passes and
/// never resolves while idle, so it can sit in a `tokio::select!` loop. If
/// another branch wins the race the deadline is kept.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// (Re)arm the timer, cancelling any pending deadline.
    pub fn poke(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Wait for the current burst to settle.
    pub async fn settled(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
