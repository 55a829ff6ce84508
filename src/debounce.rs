//! Quiet-period gating for type-ahead query input.
//!
//! Interactive front ends send every input snapshot; the debouncer forwards a
//! query only once typing has paused and the query is long enough to be worth
//! running.

use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    quiet_period: Duration,
    min_chars: usize,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD, MIN_QUERY_CHARS)
    }
}

impl Debouncer {
    pub const fn new(quiet_period: Duration, min_chars: usize) -> Self {
        Self {
            quiet_period,
            min_chars,
        }
    }

    /// Spawns the debouncer on the current runtime and returns the query stream.
    pub fn spawn(self, input: mpsc::Receiver<String>) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(self.run(input, tx));
        rx
    }

    /// Forwards trimmed snapshots from `input` to `output` after each quiet period.
    ///
    /// A newer snapshot replaces the pending one and restarts the timer.
    /// Snapshots shorter than the minimum are dropped when their timer fires.
    /// Returns when `input` closes (a pending snapshot is discarded) or when
    /// `output` is dropped.
    pub async fn run(self, mut input: mpsc::Receiver<String>, output: mpsc::Sender<String>) {
        let mut pending: Option<String> = None;

        loop {
            let Some(current) = pending.take() else {
                match input.recv().await {
                    Some(snapshot) => pending = Some(snapshot),
                    None => return,
                }
                continue;
            };

            tokio::select! {
                next = input.recv() => match next {
                    Some(snapshot) => pending = Some(snapshot),
                    None => return,
                },
                () = tokio::time::sleep(self.quiet_period) => {
                    let query = current.trim();
                    if query.chars().count() < self.min_chars {
                        continue;
                    }
                    tracing::trace!("Debounced query {:?}", query);
                    if output.send(query.to_string()).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
