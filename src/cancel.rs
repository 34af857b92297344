//! Cooperative cancellation between animation frames.
//!
//! A run is stopped by flipping a shared flag from another thread (a
//! signal handler, or whoever owns the `Sequencer`). The animation worker
//! only looks at the flag at one place: the pause between frames. Nothing
//! is interrupted mid-frame.
//!
//! ## Rust concepts
//! - `Arc<AtomicBool>` for a lock-free, single-writer stop flag
//! - `#[must_use]` so a `Flow::Stopped` can't be silently dropped

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// What an animation should do after a checkpoint.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep drawing frames
    Continue,
    /// A stop was requested; unwind to the sequencer
    Stopped,
}

impl Flow {
    pub fn is_stopped(self) -> bool {
        self == Flow::Stopped
    }
}

/// Stop flag for one run of the sequencer.
///
/// A fresh token is created every time the sequencer starts and is never
/// reset; cloning it hands out another reference to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The inter-frame checkpoint.
    ///
    /// Checks the flag first and only then sleeps, so the worst-case stop
    /// latency is one `wait` plus whatever is left of the current frame.
    pub fn pause(&self, wait: Duration) -> Flow {
        if self.is_cancelled() {
            return Flow::Stopped;
        }
        if !wait.is_zero() {
            thread::sleep(wait);
        }
        Flow::Continue
    }
}
