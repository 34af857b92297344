//! Sequencer: plays the fixed playlist on a dedicated worker thread.
//!
//! The strip is owned by exactly one thread at a time. While Idle the
//! `Sequencer` holds it; `start()` moves it onto a fresh worker thread,
//! and the worker hands it back when it exits. Stopping is cooperative:
//! `stop()` flips the run's `CancelToken`, the running animation returns
//! at its next frame checkpoint, and the worker clears the strip before
//! releasing it.
//!
//! ## Rust concepts
//! - `std::thread::spawn` + `JoinHandle<T>` to get the strip back on join
//! - `Arc<Mutex<T>>` for a status snapshot readable from any thread
//! - Loop labels (`'playlist: loop`) for breaking out of nested loops
//! - `Drop` to make sure no worker outlives its `Sequencer`

use crate::Color;
use crate::animation::Animation;
use crate::cancel::CancelToken;
use crate::strip::{PixelStrip, StripError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The strand test, in order. Repeats until stopped.
pub const PLAYLIST: [Animation; 7] = [
    Animation::ColorWipe {
        iterations: 3,
        wait: Duration::from_millis(20),
    },
    // white
    Animation::TheaterChase {
        color: Color::new(127, 127, 127),
        wait: Duration::from_millis(50),
        cycles: 10,
    },
    // red
    Animation::TheaterChase {
        color: Color::new(127, 0, 0),
        wait: Duration::from_millis(50),
        cycles: 10,
    },
    // blue
    Animation::TheaterChase {
        color: Color::new(0, 0, 127),
        wait: Duration::from_millis(50),
        cycles: 10,
    },
    Animation::Rainbow {
        wait: Duration::from_millis(20),
    },
    Animation::RainbowCycle {
        wait: Duration::from_millis(20),
    },
    Animation::TheaterChaseRainbow {
        wait: Duration::from_millis(50),
    },
];

// ── Status ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Running,
}

/// Snapshot of what the sequencer is doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencerStatus {
    pub state: SequencerState,
    /// Animation currently playing (if any)
    pub current_animation: Option<&'static str>,
    /// Full trips through the playlist in the current or last run
    pub passes_completed: u64,
    /// Error that ended the last run, if it did not end cleanly
    pub last_error: Option<String>,
}

impl SequencerStatus {
    pub fn new() -> Self {
        Self {
            state: SequencerState::Idle,
            current_animation: None,
            passes_completed: 0,
            last_error: None,
        }
    }

    pub fn set_idle(&mut self) {
        self.state = SequencerState::Idle;
        self.current_animation = None;
    }
}

impl Default for SequencerStatus {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(status: &Mutex<SequencerStatus>) -> MutexGuard<'_, SequencerStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Worker body ──────────────────────────────────────────────────────

/// Play `playlist` against `strip` until `token` is cancelled, or until
/// `pass_limit` full passes are done.
///
/// Either way the run ends with clear → show → end. A strip error ends
/// the run immediately and is returned unchanged; the strip is not
/// touched again after a failure.
pub fn run_playlist<S: PixelStrip + ?Sized>(
    strip: &mut S,
    playlist: &[Animation],
    token: &CancelToken,
    pass_limit: Option<u64>,
    status: &Mutex<SequencerStatus>,
) -> Result<(), StripError> {
    strip.begin()?;
    tracing::info!(
        "Strand test started on {} pixels ({} animations)",
        strip.num_pixels(),
        playlist.len()
    );

    let mut passes = 0u64;

    'playlist: while !playlist.is_empty() {
        for animation in playlist {
            if token.is_cancelled() {
                break 'playlist;
            }

            lock(status).current_animation = Some(animation.name());
            tracing::debug!("Playing {:?}", animation);

            if animation.run(strip, token)?.is_stopped() {
                tracing::info!("Stopped during {}", animation.name());
                break 'playlist;
            }
        }

        passes += 1;
        lock(status).passes_completed = passes;
        tracing::info!("Playlist pass {} complete", passes);

        if pass_limit.is_some_and(|limit| passes >= limit) {
            break;
        }
    }

    strip.clear();
    strip.show()?;
    strip.end()?;
    tracing::info!("Strand test finished after {} full passes", passes);
    Ok(())
}

// ── Sequencer ────────────────────────────────────────────────────────

struct Worker<P> {
    token: CancelToken,
    handle: JoinHandle<(P, Result<(), StripError>)>,
}

/// Idle/Running state machine around one strip.
///
/// `start` and `stop` may be called from any thread that owns the
/// `Sequencer` (for example a UI thread); the animations themselves run
/// on the worker.
pub struct Sequencer<P: PixelStrip + Send + 'static> {
    strip: Option<P>,
    worker: Option<Worker<P>>,
    playlist: Arc<[Animation]>,
    pass_limit: Option<u64>,
    status: Arc<Mutex<SequencerStatus>>,
}

impl<P: PixelStrip + Send + 'static> Sequencer<P> {
    pub fn new(strip: P) -> Self {
        Self {
            strip: Some(strip),
            worker: None,
            playlist: Arc::from(PLAYLIST),
            pass_limit: None,
            status: Arc::new(Mutex::new(SequencerStatus::new())),
        }
    }

    /// Replace the playlist (the default is `PLAYLIST`).
    pub fn with_playlist(mut self, playlist: Vec<Animation>) -> Self {
        self.playlist = playlist.into();
        self
    }

    /// End each run by itself after `passes` full trips through the playlist.
    pub fn with_pass_limit(mut self, passes: u64) -> Self {
        self.pass_limit = Some(passes);
        self
    }

    pub fn state(&self) -> SequencerState {
        lock(&self.status).state
    }

    pub fn status(&self) -> SequencerStatus {
        lock(&self.status).clone()
    }

    /// The strip, while no worker holds it.
    pub fn strip(&self) -> Option<&P> {
        self.strip.as_ref()
    }

    /// Idle → Running.
    ///
    /// Returns the new run's cancellation token, or `None` if a run is
    /// already in progress (or the strip was lost to a panicked worker).
    pub fn start(&mut self) -> Option<CancelToken> {
        self.start_with_token(CancelToken::new())
    }

    /// Like `start`, with a token the caller created beforehand (for
    /// example one already wired to a signal handler). A token that is
    /// already cancelled gives a run that only blanks the strip.
    pub fn start_with_token(&mut self, token: CancelToken) -> Option<CancelToken> {
        if self.worker.is_some() {
            // the worker flips the state to Idle just before it returns
            let finished = self.state() == SequencerState::Idle
                || self.worker.as_ref().is_some_and(|w| w.handle.is_finished());
            if !finished {
                tracing::debug!("Start ignored: sequencer already running");
                return None;
            }
            if let Err(e) = self.wait() {
                tracing::warn!("Previous run had ended with an error: {}", e);
            }
        }

        let mut strip = self.strip.take()?;
        let run_token = token.clone();
        let playlist = Arc::clone(&self.playlist);
        let pass_limit = self.pass_limit;
        let status = Arc::clone(&self.status);

        {
            let mut s = lock(&status);
            s.state = SequencerState::Running;
            s.passes_completed = 0;
            s.last_error = None;
        }

        let handle = thread::spawn(move || {
            let result = run_playlist(&mut strip, &playlist, &run_token, pass_limit, &status);
            let mut s = lock(&status);
            if let Err(e) = &result {
                tracing::error!("Strand test failed: {}", e);
                s.last_error = Some(e.to_string());
            }
            s.set_idle();
            drop(s);
            (strip, result)
        });

        self.worker = Some(Worker {
            token: token.clone(),
            handle,
        });
        Some(token)
    }

    /// Running → Idle: cancel the run and wait for the strip to be cleared.
    ///
    /// A no-op when already Idle. Returns the error that ended the run, if
    /// the strip failed before the stop was seen.
    pub fn stop(&mut self) -> Result<(), StripError> {
        if let Some(worker) = &self.worker {
            worker.token.cancel();
        }
        self.wait()
    }

    /// Block until the current run ends on its own (pass limit, error, or
    /// a cancel from someone holding the token).
    pub fn wait(&mut self) -> Result<(), StripError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        match worker.handle.join() {
            Ok((strip, result)) => {
                self.strip = Some(strip);
                result
            }
            Err(_) => {
                let mut s = lock(&self.status);
                s.set_idle();
                s.last_error = Some("sequencer worker panicked".to_string());
                Err("sequencer worker panicked".into())
            }
        }
    }
}

impl<P: PixelStrip + Send + 'static> Drop for Sequencer<P> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                tracing::warn!("Strand test ended with error during drop: {}", e);
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
