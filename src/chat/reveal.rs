//! Timer-paced reveal of an already complete answer.
//!
//! The backend returns the whole answer at once; this only paces how fast
//! it appears on screen. There is no partial data and no backpressure.

use std::num::NonZeroUsize;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const DEFAULT_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(3).unwrap();
const DEFAULT_INTERVAL: Duration = Duration::from_millis(15);
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// How a reveal run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The full text was written.
    Completed,
    /// The token fired first; the last written prefix stays as is.
    Cancelled,
}

/// Writes growing prefixes of a text on a fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSimulator {
    chunk_size: NonZeroUsize,
    interval: Duration,
}

impl Default for RevealSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_INTERVAL)
    }
}

impl RevealSimulator {
    /// `interval` is clamped to at least one millisecond.
    #[must_use]
    pub fn new(chunk_size: NonZeroUsize, interval: Duration) -> Self {
        Self {
            chunk_size,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    #[must_use]
    pub fn chunk_size(&self) -> NonZeroUsize {
        self.chunk_size
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of writes needed to reveal `text`.
    #[must_use]
    pub fn steps(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chunk_size.get()).max(1)
    }

    /// Reveal `text` through `write`, one chunk per tick.
    ///
    /// The first write happens one interval after the call. Empty text is
    /// written once, immediately. The final write is always the full text.
    pub async fn run<F>(&self, text: &str, cancel: &CancellationToken, mut write: F) -> RevealOutcome
    where
        F: FnMut(&str),
    {
        if text.is_empty() {
            write("");
            return RevealOutcome::Completed;
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for end in prefix_ends(text, self.chunk_size.get()) {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return RevealOutcome::Cancelled,
                _ = ticker.tick() => {}
            }
            write(&text[..end]);
        }

        RevealOutcome::Completed
    }
}

/// Byte offsets where each revealed prefix ends, on char boundaries.
fn prefix_ends(text: &str, chunk: usize) -> impl Iterator<Item = usize> + '_ {
    text.char_indices()
        .map(|(idx, _)| idx)
        .skip(chunk)
        .step_by(chunk)
        .chain(std::iter::once(text.len()))
}
