//! DotStar strand-test: the classic LED strip demo loop.
//!
//! This module provides the pieces shared by the sequencer and the binary:
//! - Strip configuration (pixel count, channel order, SPI clock)
//! - The core color type and the rainbow color wheel
//! - Signal handling for clean shutdown
//!
//! It also re-exports the cancel, strip, sink, animation and sequencer
//! modules used by the main binary.

pub mod animation;
pub mod cancel;
pub mod sequencer;
pub mod sink;
pub mod strip;

use cancel::CancelToken;
use smart_leds::RGB8;

// ── Strip configuration ────────────────────────────────────────────

/// Wire order of the three color channels.
///
/// DotStar strips are sold in several orderings; the animations never see
/// this, only the hardware sink does when it serializes a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ChannelOrder {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ChannelOrder {
    /// Arrange a pixel's channels in the order they go out on the wire.
    pub fn arrange(self, px: RGB8) -> [u8; 3] {
        let RGB8 { r, g, b } = px;
        match self {
            ChannelOrder::Rgb => [r, g, b],
            ChannelOrder::Rbg => [r, b, g],
            ChannelOrder::Grb => [g, r, b],
            ChannelOrder::Gbr => [g, b, r],
            ChannelOrder::Brg => [b, r, g],
            ChannelOrder::Bgr => [b, g, r],
        }
    }
}

/// Configuration for the attached strip.
///
/// # Rust concept: derive macros
/// `Clone, Copy` make this cheaply copyable (a count, an enum and a u32).
/// Passing it by value keeps configuration explicit, with no hidden
/// global strip instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripConfig {
    pub pixel_count: usize,
    pub order: ChannelOrder,
    pub spi_clock_hz: u32,
}

impl StripConfig {
    pub fn new(pixel_count: usize, order: ChannelOrder) -> Self {
        Self {
            pixel_count,
            order,
            ..Self::default()
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            pixel_count: 60,
            order: ChannelOrder::Bgr,
            spi_clock_hz: 8_000_000,
        }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// Packed 24-bit color, `0xRRGGBB`.
///
/// The packing is part of the animation math: the color wipe walks
/// through colors by shifting the packed value one byte to the right
/// (red → green → blue → off). Wire order is applied later by the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    pub const OFF: Self = Self(0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Move every channel one byte toward blue; blue falls off the end.
    pub const fn shift_channel(self) -> Self {
        Self(self.0 >> 8)
    }
}

impl From<Color> for RGB8 {
    fn from(c: Color) -> Self {
        RGB8::new(c.r(), c.g(), c.b())
    }
}

/// Map a wheel position to a color.
///
/// The wheel is split into three 85-wide bands: green fades to red over
/// `[0, 85)`, red to blue over `[85, 170)` and blue back to green over
/// `[170, 255]`. Callers reduce their position into `u8` range themselves;
/// which operator they use (`& 255` or `% 255`) is part of each
/// animation's behavior.
pub fn wheel(position: u8) -> Color {
    match position {
        0..85 => Color::new(position * 3, 255 - position * 3, 0),
        85..170 => {
            let p = position - 85;
            Color::new(255 - p * 3, 0, p * 3)
        }
        _ => {
            let p = position - 170;
            Color::new(0, p * 3, 255 - p * 3)
        }
    }
}

// ── Signal handling ────────────────────────────────────────────────

/// Set up a Ctrl+C handler that cancels the given run.
///
/// # Rust concept: moving a clone into a closure
/// The token is an `Arc` underneath; the handler owns its own clone and
/// the sequencer's worker keeps the other, both pointing at one flag.
pub fn setup_signal_handler(token: CancelToken) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        tracing::info!("Interrupt received, stopping strand test");
        token.cancel();
    })
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // ── StripConfig tests ──────────────────────────────────────────

    #[test]
    fn strip_config_default_is_60_bgr() {
        let config = StripConfig::default();
        assert_eq!(config.pixel_count, 60);
        assert_eq!(config.order, ChannelOrder::Bgr);
        assert_eq!(config.spi_clock_hz, 8_000_000);
    }

    #[test]
    fn strip_config_new_keeps_default_clock() {
        let config = StripConfig::new(144, ChannelOrder::Grb);
        assert_eq!(config.pixel_count, 144);
        assert_eq!(config.order, ChannelOrder::Grb);
        assert_eq!(config.spi_clock_hz, StripConfig::default().spi_clock_hz);
    }

    #[rstest]
    #[case(ChannelOrder::Rgb, [1, 2, 3])]
    #[case(ChannelOrder::Rbg, [1, 3, 2])]
    #[case(ChannelOrder::Grb, [2, 1, 3])]
    #[case(ChannelOrder::Gbr, [2, 3, 1])]
    #[case(ChannelOrder::Brg, [3, 1, 2])]
    #[case(ChannelOrder::Bgr, [3, 2, 1])]
    fn test_channel_order_arrange(#[case] order: ChannelOrder, #[case] expected: [u8; 3]) {
        assert_eq!(order.arrange(RGB8::new(1, 2, 3)), expected);
    }

    // ── Color tests ────────────────────────────────────────────────

    #[test]
    fn color_packs_rrggbb() {
        let c = Color::new(0x12, 0x34, 0x56);
        assert_eq!((c.r(), c.g(), c.b()), (0x12, 0x34, 0x56));
        assert_eq!(c.shift_channel(), Color::new(0, 0x12, 0x34));
    }

    #[test]
    fn shift_channel_walks_red_green_blue_off() {
        let red = Color::new(255, 0, 0);
        assert_eq!(red.shift_channel(), Color::new(0, 255, 0));
        assert_eq!(red.shift_channel().shift_channel(), Color::new(0, 0, 255));
        assert!(red.shift_channel().shift_channel().shift_channel().is_off());
    }

    #[test]
    fn color_converts_to_rgb8() {
        let px: RGB8 = Color::new(10, 20, 30).into();
        assert_eq!(px, RGB8::new(10, 20, 30));
    }

    // ── Wheel tests ────────────────────────────────────────────────

    #[rstest]
    #[case(0, 0, 255, 0)]
    #[case(84, 252, 3, 0)]
    #[case(85, 255, 0, 0)]
    #[case(169, 3, 0, 252)]
    #[case(170, 0, 0, 255)]
    #[case(254, 0, 252, 3)]
    #[case(255, 0, 255, 0)]
    fn test_wheel_band_edges(#[case] pos: u8, #[case] r: u8, #[case] g: u8, #[case] b: u8) {
        assert_eq!(wheel(pos), Color::new(r, g, b));
    }

    #[test]
    fn wheel_channels_sum_to_255_everywhere() {
        for pos in 0..=255u8 {
            let c = wheel(pos);
            let sum = c.r() as u16 + c.g() as u16 + c.b() as u16;
            assert_eq!(sum, 255, "position {pos}");
        }
    }

    #[test]
    fn mask_and_modulus_reductions_pick_different_colors() {
        assert_eq!(wheel((256 & 255) as u8), Color::new(0, 255, 0));
        assert_eq!(wheel((256 % 255) as u8), Color::new(3, 252, 0));
        assert_ne!(wheel((300 & 255) as u8), wheel((300 % 255) as u8));
    }
}
