//! Frame sinks: where a finished frame goes on `show()`.
//!
//! - `TerminalSink` draws the strip as a row of true-color blocks, so the
//!   strand test can be watched without any LEDs attached.
//! - `Apa102Sink` (feature `hardware`) clocks the frame out of the
//!   Raspberry Pi's hardware SPI bus in DotStar/APA102 framing.

use crate::ChannelOrder;
use crate::strip::StripError;
use smart_leds::RGB8;
use std::io::Write;

/// Destination for brightness-scaled frames.
///
/// Implement this to drive a different kind of hardware; `LedStrip`
/// takes care of the buffer and brightness.
pub trait FrameSink {
    fn begin(&mut self) -> Result<(), StripError> {
        Ok(())
    }

    fn write_frame(&mut self, frame: &[RGB8]) -> Result<(), StripError>;

    fn end(&mut self) -> Result<(), StripError> {
        Ok(())
    }
}

// ── Terminal preview ─────────────────────────────────────────────────

/// Renders each frame on a single, constantly rewritten terminal line.
pub struct TerminalSink<W: Write> {
    out: W,
    line: String,
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn write_frame(&mut self, frame: &[RGB8]) -> Result<(), StripError> {
        use std::fmt::Write as _;

        self.line.clear();
        self.line.push('\r');
        for px in frame {
            write!(self.line, "\x1b[48;2;{};{};{}m ", px.r, px.g, px.b)?;
        }
        self.line.push_str("\x1b[0m");
        self.out.write_all(self.line.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn end(&mut self) -> Result<(), StripError> {
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

// ── APA102 framing ───────────────────────────────────────────────────

/// Pixel header byte: three marker bits plus the 5-bit driver current,
/// kept at maximum since brightness is already applied to the colors.
const APA102_PIXEL_HEADER: u8 = 0xE0 | 0x1F;

/// Serialize one frame in APA102 framing into `out`.
///
/// Layout: a 32-bit zero start frame, four bytes per pixel (header then
/// the three channels in wire order), and an end frame of one `0xFF` per
/// 16 pixels (rounded up) to push the last bits through the chain.
pub fn encode_apa102(frame: &[RGB8], order: ChannelOrder, out: &mut Vec<u8>) {
    out.clear();
    out.extend_from_slice(&[0x00; 4]);
    for &px in frame {
        out.push(APA102_PIXEL_HEADER);
        out.extend_from_slice(&order.arrange(px));
    }
    out.extend(std::iter::repeat_n(0xFF, frame.len().div_ceil(16)));
}

#[cfg(feature = "hardware")]
pub use hardware::Apa102Sink;

#[cfg(feature = "hardware")]
mod hardware {
    use super::*;
    use crate::StripConfig;
    use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

    /// DotStar strip on SPI0 (data on GPIO 10, clock on GPIO 11).
    pub struct Apa102Sink {
        spi: Spi,
        order: ChannelOrder,
        buf: Vec<u8>,
    }

    impl Apa102Sink {
        /// Open the hardware SPI bus.
        ///
        /// # Rust concept: Result and the ? operator
        /// Opening `/dev/spidev0.0` fails if SPI is disabled or we lack
        /// permission; `?` converts the rppal error into a `StripError`.
        pub fn open(config: StripConfig) -> Result<Self, StripError> {
            let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, config.spi_clock_hz, Mode::Mode0)?;
            tracing::info!(
                "SPI0 opened at {} Hz, channel order {:?}",
                config.spi_clock_hz,
                config.order
            );
            Ok(Self {
                spi,
                order: config.order,
                buf: Vec::with_capacity(4 + config.pixel_count * 4 + config.pixel_count / 16 + 1),
            })
        }
    }

    impl FrameSink for Apa102Sink {
        fn write_frame(&mut self, frame: &[RGB8]) -> Result<(), StripError> {
            encode_apa102(frame, self.order, &mut self.buf);
            let written = self.spi.write(&self.buf)?;
            if written != self.buf.len() {
                return Err(format!(
                    "short SPI write: {written} of {} bytes",
                    self.buf.len()
                )
                .into());
            }
            Ok(())
        }
    }
}

// ── Test sink ────────────────────────────────────────────────────────

/// Keeps every frame it is given.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySink {
    pub(crate) frames: Vec<Vec<RGB8>>,
    pub(crate) begun: bool,
    pub(crate) ended: bool,
}

#[cfg(test)]
impl FrameSink for MemorySink {
    fn begin(&mut self) -> Result<(), StripError> {
        self.begun = true;
        Ok(())
    }

    fn write_frame(&mut self, frame: &[RGB8]) -> Result<(), StripError> {
        self.frames.push(frame.to_vec());
        Ok(())
    }

    fn end(&mut self) -> Result<(), StripError> {
        self.ended = true;
        Ok(())
    }
}
