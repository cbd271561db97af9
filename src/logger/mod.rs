//! Logger setup
//!
//! A `tracing-subscriber` registry with:
//! - Console output, colored only on a terminal
//! - Optional file output in full, compact or JSON format
//! - Size-based rotation with optional gzip of rotated files
//! - Fallback to stderr when the log file cannot be written

pub mod config;
pub mod error;
pub mod rotation;
pub(crate) mod writer;


pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::RotatingFileWriter;

/// Install the global subscriber.
///
/// `RUST_LOG` is ignored; the level comes from configuration, which the
/// CLI may already have overridden with `--verbose` or `--quiet`.
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_output = if config.file.enabled {
        Some(file_layer(&config.file)?)
    } else {
        None
    };

    let console_output = config.console.enabled.then(|| {
        fmt::layer()
            .with_ansi(config.console.colored && std::io::stdout().is_terminal())
            .with_target(true)
            .with_level(true)
    });

    // The file layer goes first so span fields are not formatted with ANSI
    // codes by the console layer (tokio-rs/tracing#1817).
    tracing_subscriber::registry()
        .with(filter)
        .with(file_output)
        .with(console_output)
        .try_init()?;

    Ok(())
}

/// Formatting layer writing to the rotating log file
pub(crate) fn file_layer<S>(config: &FileConfig) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let writer = RotatingFileWriter::new(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };

    Ok(layer)
}
