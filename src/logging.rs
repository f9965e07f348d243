//! Structured logging for the command line front end.
//!
//! The library only emits `tracing` events; installing a subscriber is up to the
//! binary. Level resolution order: explicit argument, `CHRONOTOPE_LOG_LEVEL`,
//! `RUST_LOG`, then `warn`. Logs go to stderr so SVG output on stdout stays clean.

use std::str::FromStr;

use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Single-line records
    #[default]
    Compact,
    /// Multi-line records with source locations
    Pretty,
    /// One JSON object per record
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

pub fn init_logging(
    level: Option<&str>,
    format: Option<LogFormat>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let log_level = level
        .map(str::to_string)
        .or_else(|| std::env::var("CHRONOTOPE_LOG_LEVEL").ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());

    let format = match format {
        Some(format) => format,
        None => match std::env::var("CHRONOTOPE_LOG_FORMAT") {
            Ok(raw) => LogFormat::from_str(&raw)?,
            Err(_) => LogFormat::default(),
        },
    };

    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match format {
        LogFormat::Compact => {
            Registry::default()
                .with(filter)
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_span_events(FmtSpan::NONE)
                        .compact(),
                )
                .try_init()?;
        }
        LogFormat::Pretty => {
            Registry::default()
                .with(filter)
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_file(true)
                        .with_line_number(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .pretty(),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            Registry::default()
                .with(filter)
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_span_events(FmtSpan::CLOSE)
                        .json(),
                )
                .try_init()?;
        }
    }

    Ok(())
}
