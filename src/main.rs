//! DotStar strand test
//!
//! Cycles a DotStar (APA102) strip through color wipes, theater chases and
//! rainbows until interrupted with Ctrl+C, then blanks the strip.
//!
//! ## Architecture
//! - **Worker thread**: owns the strip and plays the playlist
//! - **Main thread**: parses arguments, starts the worker, waits for it
//! - **Signal handler**: cancels the run's token on Ctrl+C
//!
//! ## Usage
//! ```sh
//! # watch it in the terminal
//! ./target/release/dotstar-strandtest --pixels 60
//! # drive a real strip on SPI0
//! sudo ./target/release/dotstar-strandtest --backend spi --order bgr
//! ```

use clap::{Parser, ValueEnum};
use dotstar_strandtest::cancel::CancelToken;
use dotstar_strandtest::sequencer::Sequencer;
use dotstar_strandtest::sink::TerminalSink;
use dotstar_strandtest::strip::{LedStrip, PixelStrip, StripError};
use dotstar_strandtest::{ChannelOrder, StripConfig, setup_signal_handler};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Draw the strip as a line of colored blocks in the terminal
    Preview,
    /// DotStar strip on the Raspberry Pi hardware SPI bus
    Spi,
}

/// DotStar strand test
#[derive(Parser)]
#[command(name = "dotstar-strandtest")]
#[command(about = "Cycle a DotStar LED strip through the classic strand-test animations")]
#[command(version)]
struct Args {
    /// Number of pixels on the strip
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u16).range(1..))]
    pixels: u16,

    /// Channel order the strip expects on the wire
    #[arg(long, value_enum, default_value = "bgr")]
    order: ChannelOrder,

    /// Where frames go
    #[arg(long, value_enum, default_value = "preview")]
    backend: Backend,

    /// SPI clock in Hz (spi backend only)
    #[arg(long, default_value = "8000000")]
    spi_clock: u32,

    /// Play the playlist once and exit instead of looping forever
    #[arg(long)]
    once: bool,
}

fn main() -> ExitCode {
    // Logs go to stderr so they don't tear the terminal preview line.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), StripError> {
    let config = StripConfig {
        spi_clock_hz: args.spi_clock,
        ..StripConfig::new(args.pixels.into(), args.order)
    };

    tracing::info!("DotStar strand test v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Strip: {} pixels, {:?}", config.pixel_count, config.order);
    tracing::info!("Backend: {:?}", args.backend);

    match args.backend {
        Backend::Preview => play(
            LedStrip::new(config.pixel_count, TerminalSink::stdout()),
            args.once,
        ),
        Backend::Spi => play(open_spi(config)?, args.once),
    }
}

/// Run the sequencer until Ctrl+C (or one pass, with `--once`).
fn play<P: PixelStrip + Send + 'static>(strip: P, once: bool) -> Result<(), StripError> {
    let mut sequencer = Sequencer::new(strip);
    if once {
        sequencer = sequencer.with_pass_limit(1);
    }

    // Handler first, so an early Ctrl+C still ends in a cleared strip.
    let token = CancelToken::new();
    setup_signal_handler(token.clone())?;
    sequencer
        .start_with_token(token)
        .ok_or("sequencer did not start")?;

    sequencer.wait()?;
    tracing::info!("Strip cleared, shutting down cleanly.");
    Ok(())
}

#[cfg(feature = "hardware")]
fn open_spi(
    config: StripConfig,
) -> Result<LedStrip<dotstar_strandtest::sink::Apa102Sink>, StripError> {
    let sink = dotstar_strandtest::sink::Apa102Sink::open(config)?;
    Ok(LedStrip::new(config.pixel_count, sink))
}

#[cfg(not(feature = "hardware"))]
fn open_spi(_config: StripConfig) -> Result<LedStrip<TerminalSink<std::io::Stdout>>, StripError> {
    Err("the spi backend requires the 'hardware' feature (cargo build --release)".into())
}
