//! The strip contract the animations draw against, and the buffered
//! implementation used by the binary.
//!
//! Animations only ever talk to a `PixelStrip`. `LedStrip` keeps the
//! pixel buffer and global brightness in memory and pushes a finished
//! frame to a `FrameSink` (terminal preview or SPI hardware) on `show()`.
//!
//! ## Rust concepts
//! - Traits as the seam between the animation logic and hardware
//! - `Box<dyn Error + Send + Sync>` so driver errors can cross threads
//! - Generic structs (`LedStrip<S>`) instead of trait objects on the hot path

use crate::Color;
use crate::sink::FrameSink;
use smart_leds::RGB8;

/// Any failure reported by the strip hardware.
///
/// The animation code never inspects these; it hands them up unchanged.
pub type StripError = Box<dyn std::error::Error + Send + Sync>;

/// An addressable strip of pixels.
pub trait PixelStrip {
    /// Prepare the hardware for a run.
    fn begin(&mut self) -> Result<(), StripError>;

    /// Release the hardware after a run.
    fn end(&mut self) -> Result<(), StripError>;

    /// Number of pixels, fixed for the lifetime of the strip.
    fn num_pixels(&self) -> usize;

    /// Color currently stored for `index`, `None` when out of range.
    fn pixel(&self, index: usize) -> Option<Color>;

    /// Store a color for `index`. Out-of-range writes are ignored.
    fn set_pixel(&mut self, index: usize, color: Color);

    /// Turn every pixel off in the buffer, without flushing.
    fn clear(&mut self);

    /// Push the buffer to the LEDs.
    fn show(&mut self) -> Result<(), StripError>;

    /// Global brightness applied at `show()` time.
    fn brightness(&self) -> u8;

    fn set_brightness(&mut self, brightness: u8);
}

/// In-memory pixel buffer in front of a `FrameSink`.
pub struct LedStrip<S> {
    pixels: Vec<Color>,
    brightness: u8,
    active: bool,
    sink: S,
    frame: Vec<RGB8>,
}

impl<S: FrameSink> LedStrip<S> {
    pub fn new(pixel_count: usize, sink: S) -> Self {
        Self {
            pixels: vec![Color::OFF; pixel_count],
            brightness: 255,
            active: false,
            sink,
            frame: Vec::with_capacity(pixel_count),
        }
    }

    /// Whether `begin()` has been called without a matching `end()`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: FrameSink> PixelStrip for LedStrip<S> {
    fn begin(&mut self) -> Result<(), StripError> {
        self.sink.begin()?;
        self.active = true;
        Ok(())
    }

    fn end(&mut self) -> Result<(), StripError> {
        self.active = false;
        self.sink.end()
    }

    fn num_pixels(&self) -> usize {
        self.pixels.len()
    }

    fn pixel(&self, index: usize) -> Option<Color> {
        self.pixels.get(index).copied()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(px) = self.pixels.get_mut(index) {
            *px = color;
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(Color::OFF);
    }

    fn show(&mut self) -> Result<(), StripError> {
        self.frame.clear();
        self.frame.extend(smart_leds::brightness(
            self.pixels.iter().map(|&c| RGB8::from(c)),
            self.brightness,
        ));
        self.sink.write_frame(&self.frame)
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }
}

// ── Test double ──────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn strip(n: usize) -> LedStrip<MemorySink> {
        LedStrip::new(n, MemorySink::default())
    }

    #[test]
    fn new_strip_is_dark_and_full_brightness() {
        let s = strip(5);
        assert_eq!(s.num_pixels(), 5);
        assert_eq!(s.brightness(), 255);
        assert!(!s.is_active());
        assert!((0..5).all(|i| s.pixel(i) == Some(Color::OFF)));
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let mut s = strip(3);
        s.set_pixel(3, Color::new(1, 2, 3));
        s.set_pixel(usize::MAX, Color::new(1, 2, 3));
        assert_eq!(s.pixel(3), None);
        assert!((0..3).all(|i| s.pixel(i) == Some(Color::OFF)));
    }

    #[test]
    fn clear_does_not_flush() {
        let mut s = strip(2);
        s.set_pixel(0, Color::new(9, 9, 9));
        s.show().unwrap();
        s.clear();
        assert_eq!(s.pixel(0), Some(Color::OFF));
        assert_eq!(s.sink().frames.len(), 1);
    }

    #[test]
    fn show_sends_whole_buffer() {
        let mut s = strip(3);
        s.set_pixel(1, Color::new(10, 20, 30));
        s.show().unwrap();
        assert_eq!(
            s.sink().frames[0],
            vec![RGB8::default(), RGB8::new(10, 20, 30), RGB8::default()]
        );
    }

    #[rstest]
    #[case(255, 200)]
    #[case(127, 100)]
    #[case(63, 50)]
    #[case(0, 0)]
    fn test_brightness_applied_at_show(#[case] brightness: u8, #[case] expected: u8) {
        let mut s = strip(1);
        s.set_pixel(0, Color::new(200, 0, 0));
        s.set_brightness(brightness);
        s.show().unwrap();
        assert_eq!(s.sink().frames[0][0].r, expected);
        // brightness never alters the stored color
        assert_eq!(s.pixel(0), Some(Color::new(200, 0, 0)));
    }

    #[test]
    fn begin_and_end_bracket_a_run() {
        let mut s = strip(1);
        s.begin().unwrap();
        assert!(s.is_active());
        assert!(s.sink().begun);
        s.end().unwrap();
        assert!(!s.is_active());
        assert!(s.sink().ended);
    }
}
