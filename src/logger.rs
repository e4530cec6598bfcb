//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after config is loaded. Logs never go to
//! stdout: `print` launch mode writes the broker overrides there.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Where the effective level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    /// `-v` flags: the level wins over `RUST_LOG`.
    Cli,
    /// Config file / env override: `RUST_LOG` wins when set.
    Config,
}

/// Initialise the global tracing subscriber, writing to `log_file` when given
/// and to stderr otherwise.
pub fn init(level: &str, source: LevelSource, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = match source {
        LevelSource::Cli => match EnvFilter::try_new(level) {
            Ok(filter) => filter,
            Err(level_err) => EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))
            })?,
        },
        LevelSource::Config => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?,
    };

    let (writer, ansi) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::Logger(format!("failed to open log file '{}': {e}", path.display()))
                })?;
            (BoxMakeWriter::new(file), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Map repeated `-v` flags to a level:
/// `-v` warn, `-vv` info, `-vvv` debug, `-vvvv`+ trace.
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Count the `v`s in a short verbosity flag (`-v`, `-vvv`), saturating at
/// `u8::MAX`. `None` if `flag` is not one.
pub fn verbosity_flag_count(flag: &str) -> Option<u8> {
    let vs = flag.strip_prefix('-')?;
    if vs.is_empty() || !vs.bytes().all(|b| b == b'v') {
        return None;
    }
    Some(u8::try_from(vs.len()).unwrap_or(u8::MAX))
}

/// Parse a log level string into a [`LevelFilter`], returning an error on
/// unrecognised values. Used to validate config before initialising.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
