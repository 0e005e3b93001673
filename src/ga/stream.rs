//! Snapshot hand-off between the engine task and its consumer.
//!
//! [`snapshot_channel`] creates three endpoints over one shared exchange:
//!
//! - [`SnapshotSender`]: held by the engine. [`send`](SnapshotSender::send)
//!   is a rendezvous: it returns only once the consumer has taken the
//!   snapshot, or fails as soon as cancellation is observed.
//! - [`SnapshotStream`]: held by the consumer. Receives snapshots one at a
//!   time; ends when the engine finishes.
//! - [`CancelToken`]: a cloneable, single-shot cancellation signal.
//!
//! Dropping the [`SnapshotStream`] counts as cancellation, so an engine whose
//! consumer went away never blocks forever. Once cancelled, the stream takes
//! nothing more: a snapshot left pending is withdrawn by the sender.
//!
//! `std::sync::mpsc::sync_channel(0)` offers the same rendezvous but a
//! blocked `send` there cannot be woken by a cancellation signal, only by
//! the receiver.
//!
//! The exchange also carries the engine's [`EngineState`], readable from the
//! consumer side while the run is in progress.

use super::runner::{EngineState, GenerationStats};
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A send was abandoned because the run was cancelled or the consumer left.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("snapshot stream cancelled")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct Exchange {
    slot: Option<GenerationStats>,
    cancelled: bool,
    producer_done: bool,
    consumer_gone: bool,
    phase: EngineState,
}

impl Exchange {
    fn is_aborted(&self) -> bool {
        self.cancelled || self.consumer_gone
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<Exchange>,
    signal: Condvar,
}

impl Shared {
    // The exchange holds plain flags and an owned slot, so state left behind
    // by a panicking holder is still consistent.
    fn lock(&self) -> MutexGuard<'_, Exchange> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Exchange>) -> MutexGuard<'a, Exchange> {
        self.signal
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Exchange)) {
        f(&mut self.lock());
        self.signal.notify_all();
    }
}

/// Creates a connected sender, stream and cancellation token.
pub fn snapshot_channel() -> (SnapshotSender, SnapshotStream, CancelToken) {
    let shared = Arc::new(Shared::default());
    (
        SnapshotSender {
            shared: Arc::clone(&shared),
        },
        SnapshotStream {
            shared: Arc::clone(&shared),
        },
        CancelToken { shared },
    )
}

// ============================================================================
// Sender
// ============================================================================

/// Engine side of the exchange.
#[derive(Debug)]
pub struct SnapshotSender {
    shared: Arc<Shared>,
}

impl SnapshotSender {
    /// Hands `stats` to the consumer, blocking until it is received.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] if cancellation was signalled or the stream was dropped,
    /// either before the call or while waiting. A pending snapshot is
    /// withdrawn and never delivered.
    pub fn send(&self, stats: GenerationStats) -> Result<(), Cancelled> {
        let mut state = self.shared.lock();
        if state.is_aborted() {
            return Err(Cancelled);
        }
        state.slot = Some(stats);
        self.shared.signal.notify_all();

        loop {
            if state.slot.is_none() {
                return Ok(());
            }
            if state.is_aborted() {
                state.slot = None;
                return Err(Cancelled);
            }
            state = self.shared.wait(state);
        }
    }

    /// Whether a send would be refused right now.
    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().is_aborted()
    }

    /// Publishes the engine's lifecycle state to the consumer side.
    pub fn set_state(&self, phase: EngineState) {
        self.shared.update(|state| state.phase = phase);
    }
}

impl Drop for SnapshotSender {
    fn drop(&mut self) {
        self.shared.update(|state| state.producer_done = true);
    }
}

// ============================================================================
// Stream
// ============================================================================

/// Consumer side of the exchange.
///
/// Yields [`GenerationStats`] in increasing generation order. A completed
/// run ends with a sentinel ([`GenerationStats::is_sentinel`]); a cancelled
/// run simply stops.
#[derive(Debug)]
pub struct SnapshotStream {
    shared: Arc<Shared>,
}

impl SnapshotStream {
    /// Blocks until the next snapshot arrives.
    ///
    /// Returns `None` once the engine has finished and nothing is pending,
    /// or as soon as the run is cancelled.
    pub fn recv(&self) -> Option<GenerationStats> {
        let mut state = self.shared.lock();
        loop {
            if let Some(stats) = self.take(&mut state) {
                return Some(stats);
            }
            if state.producer_done || state.cancelled {
                return None;
            }
            state = self.shared.wait(state);
        }
    }

    /// Takes a pending snapshot without blocking.
    pub fn try_recv(&self) -> Result<GenerationStats, TryRecvError> {
        let mut state = self.shared.lock();
        match self.take(&mut state) {
            Some(stats) => Ok(stats),
            None if state.producer_done || state.cancelled => Err(TryRecvError::Disconnected),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<GenerationStats, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        loop {
            if let Some(stats) = self.take(&mut state) {
                return Ok(stats);
            }
            if state.producer_done || state.cancelled {
                return Err(RecvTimeoutError::Disconnected);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(RecvTimeoutError::Timeout);
            }
            state = self
                .shared
                .signal
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Iterates over snapshots until the sentinel (inclusive) or the end of
    /// the run.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stream: self,
            finished: false,
        }
    }

    /// Lifecycle state last published by the engine.
    pub fn engine_state(&self) -> EngineState {
        self.shared.lock().phase
    }

    // A cancelled exchange leaves the slot for the sender to withdraw.
    fn take(&self, state: &mut Exchange) -> Option<GenerationStats> {
        if state.cancelled {
            return None;
        }
        let stats = state.slot.take()?;
        self.shared.signal.notify_all();
        Some(stats)
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        self.shared.update(|state| state.consumer_gone = true);
    }
}

/// Borrowing iterator over a [`SnapshotStream`].
#[derive(Debug)]
pub struct Iter<'a> {
    stream: &'a SnapshotStream,
    finished: bool,
}

impl Iterator for Iter<'_> {
    type Item = GenerationStats;

    fn next(&mut self) -> Option<GenerationStats> {
        if self.finished {
            return None;
        }
        let stats = self.stream.recv();
        self.finished = stats.as_ref().map_or(true, GenerationStats::is_sentinel);
        stats
    }
}

impl<'a> IntoIterator for &'a SnapshotStream {
    type Item = GenerationStats;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Owning iterator over a [`SnapshotStream`].
#[derive(Debug)]
pub struct IntoIter {
    stream: SnapshotStream,
    finished: bool,
}

impl Iterator for IntoIter {
    type Item = GenerationStats;

    fn next(&mut self) -> Option<GenerationStats> {
        if self.finished {
            return None;
        }
        let stats = self.stream.recv();
        self.finished = stats.as_ref().map_or(true, GenerationStats::is_sentinel);
        stats
    }
}

impl IntoIterator for SnapshotStream {
    type Item = GenerationStats;
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        IntoIter {
            stream: self,
            finished: false,
        }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Single-shot cancellation signal for a run.
///
/// The engine observes it at its next snapshot emission. Cancelling is
/// idempotent and cannot be undone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.shared.update(|state| state.cancelled = true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().cancelled
    }
}

// ============================================================================
// Tests
// ============================================================================
