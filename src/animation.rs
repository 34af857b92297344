//! The strand-test animations.
//!
//! Each primitive draws frames straight into a `PixelStrip`, flushes, and
//! then stops at the cancellation checkpoint before the next frame. All
//! per-run state (head/tail, cycle counters, current color) lives on the
//! stack of the running function and is gone when it returns.
//!
//! ## Rust concepts
//! - `enum` with data variants so the playlist is plain data
//! - `?` to hand strip errors straight back to the sequencer
//! - `step_by` ranges for "every third pixel"

use crate::cancel::{CancelToken, Flow};
use crate::strip::{PixelStrip, StripError};
use crate::{Color, wheel};
use std::time::Duration;

/// Rainbow and RainbowCycle reduce wheel positions with `& 255`.
pub const RAINBOW_WHEEL_MASK: usize = 255;

/// TheaterChaseRainbow reduces wheel positions with `% 255`, so it never
/// reaches wheel position 255 and repeats every 255 steps instead of 256.
pub const THEATER_RAINBOW_WHEEL_MODULUS: usize = 255;

/// Frames drawn by `rainbow`.
pub const RAINBOW_CYCLES: usize = 256;

/// Frames drawn by `rainbow_cycle`: five trips around the wheel.
pub const RAINBOW_CYCLE_CYCLES: usize = 256 * 5;

/// Outer cycles of `theater_chase_rainbow`.
pub const THEATER_RAINBOW_CYCLES: usize = 256;

/// How far behind the head the color wipe's tail starts.
pub const WIPE_TAIL_LAG: isize = 10;

/// Spacing of the lit pixels in a theater chase.
const CHASE_SPACING: usize = 3;

const WIPE_FIRST_COLOR: Color = Color::new(0, 0, 255);
const WIPE_RESET_COLOR: Color = Color::new(255, 0, 0);

// ── Playlist entries ─────────────────────────────────────────────────

/// One entry of the sequencer's playlist.
///
/// # Rust concept: enums with data
/// Each variant carries exactly the parameters its animation needs, and
/// `run` dispatches with an exhaustive `match`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Animation {
    ColorWipe { iterations: u32, wait: Duration },
    TheaterChase { color: Color, wait: Duration, cycles: u32 },
    Rainbow { wait: Duration },
    RainbowCycle { wait: Duration },
    TheaterChaseRainbow { wait: Duration },
}

impl Animation {
    pub fn name(&self) -> &'static str {
        match self {
            Animation::ColorWipe { .. } => "color_wipe",
            Animation::TheaterChase { .. } => "theater_chase",
            Animation::Rainbow { .. } => "rainbow",
            Animation::RainbowCycle { .. } => "rainbow_cycle",
            Animation::TheaterChaseRainbow { .. } => "theater_chase_rainbow",
        }
    }

    /// Play this animation to completion, or until `token` is cancelled.
    pub fn run<S: PixelStrip + ?Sized>(
        &self,
        strip: &mut S,
        token: &CancelToken,
    ) -> Result<Flow, StripError> {
        match *self {
            Animation::ColorWipe { iterations, wait } => color_wipe(strip, iterations, wait, token),
            Animation::TheaterChase {
                color,
                wait,
                cycles,
            } => theater_chase(strip, color, wait, cycles, token),
            Animation::Rainbow { wait } => rainbow(strip, wait, token),
            Animation::RainbowCycle { wait } => rainbow_cycle(strip, wait, token),
            Animation::TheaterChaseRainbow { wait } => theater_chase_rainbow(strip, wait, token),
        }
    }
}

// ── Primitives ───────────────────────────────────────────────────────

/// Sweep a lit head along the strip with a dark tail following it.
///
/// Every time the head laps the strip, brightness halves and the color
/// shifts one channel over; when the shift runs off the blue end the color
/// resets to red and one iteration is used up. Brightness is put back to
/// full before returning, also when stopped.
pub fn color_wipe<S: PixelStrip + ?Sized>(
    strip: &mut S,
    mut iterations: u32,
    wait: Duration,
    token: &CancelToken,
) -> Result<Flow, StripError> {
    let n = strip.num_pixels();
    let mut head = 0usize;
    // starts off the strip so the wipe grows out of nothing
    let mut tail = -WIPE_TAIL_LAG;
    let mut color = WIPE_FIRST_COLOR;

    strip.set_brightness(255);
    strip.clear();
    strip.show()?;

    let flow = loop {
        if iterations == 0 {
            break Flow::Continue;
        }

        strip.set_pixel(head, color);
        if let Ok(t) = usize::try_from(tail) {
            strip.set_pixel(t, Color::OFF);
        }
        strip.show()?;

        if token.pause(wait).is_stopped() {
            break Flow::Stopped;
        }

        head += 1;
        if head >= n {
            head = 0;
            strip.set_brightness(strip.brightness() / 2);
            color = color.shift_channel();
            if color.is_off() {
                color = WIPE_RESET_COLOR;
                iterations -= 1;
            }
        }

        tail += 1;
        if tail >= n as isize {
            tail = 0;
        }
    };

    strip.set_brightness(255);
    Ok(flow)
}

/// Scroll the color wheel along the strip, one wheel step per frame.
pub fn rainbow<S: PixelStrip + ?Sized>(
    strip: &mut S,
    wait: Duration,
    token: &CancelToken,
) -> Result<Flow, StripError> {
    let n = strip.num_pixels();
    for cycle in 0..RAINBOW_CYCLES {
        for p in 0..n {
            strip.set_pixel(p, wheel(((p + cycle) & RAINBOW_WHEEL_MASK) as u8));
        }
        strip.show()?;
        if token.pause(wait).is_stopped() {
            return Ok(Flow::Stopped);
        }
    }
    Ok(Flow::Continue)
}

/// Like `rainbow`, but one whole wheel is spread evenly over the strip.
pub fn rainbow_cycle<S: PixelStrip + ?Sized>(
    strip: &mut S,
    wait: Duration,
    token: &CancelToken,
) -> Result<Flow, StripError> {
    let n = strip.num_pixels();
    for cycle in 0..RAINBOW_CYCLE_CYCLES {
        for p in 0..n {
            let pos = (p * 256 / n + cycle) & RAINBOW_WHEEL_MASK;
            strip.set_pixel(p, wheel(pos as u8));
        }
        strip.show()?;
        if token.pause(wait).is_stopped() {
            return Ok(Flow::Stopped);
        }
    }
    Ok(Flow::Continue)
}

/// Theater-marquee crawl: every third pixel lit, shifting by one each frame.
///
/// The lit pixels are switched off in the buffer right after the pause;
/// that only becomes visible with the next frame's `show()`.
pub fn theater_chase<S: PixelStrip + ?Sized>(
    strip: &mut S,
    color: Color,
    wait: Duration,
    cycles: u32,
    token: &CancelToken,
) -> Result<Flow, StripError> {
    let n = strip.num_pixels();
    for _ in 0..cycles {
        for offset in 0..CHASE_SPACING {
            for p in (offset..n).step_by(CHASE_SPACING) {
                strip.set_pixel(p, color);
            }
            strip.show()?;

            if token.pause(wait).is_stopped() {
                return Ok(Flow::Stopped);
            }

            for p in (offset..n).step_by(CHASE_SPACING) {
                strip.set_pixel(p, Color::OFF);
            }
        }
    }
    Ok(Flow::Continue)
}

/// Theater crawl where each lit pixel takes its color from the wheel.
///
/// The wheel position comes from the pixel's group start (the index before
/// the offset is added) plus the cycle, reduced with `% 255`.
pub fn theater_chase_rainbow<S: PixelStrip + ?Sized>(
    strip: &mut S,
    wait: Duration,
    token: &CancelToken,
) -> Result<Flow, StripError> {
    let n = strip.num_pixels();
    for cycle in 0..THEATER_RAINBOW_CYCLES {
        for offset in 0..CHASE_SPACING {
            for base in (0..n).step_by(CHASE_SPACING) {
                if base + offset < n {
                    let pos = (base + cycle) % THEATER_RAINBOW_WHEEL_MODULUS;
                    strip.set_pixel(base + offset, wheel(pos as u8));
                }
            }
            strip.show()?;

            if token.pause(wait).is_stopped() {
                return Ok(Flow::Stopped);
            }

            for p in (offset..n).step_by(CHASE_SPACING) {
                strip.set_pixel(p, Color::OFF);
            }
        }
    }
    Ok(Flow::Continue)
}

// ── Tests ──────────────────────────────────────────────────────────
