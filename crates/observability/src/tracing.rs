//! Tracing/logging initialization.
//!
//! Filtering follows `RUST_LOG` (default `info`). Output is JSON unless
//! `FORGEERP_LOG_FORMAT=pretty`.

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "FORGEERP_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown log format '{0}' (expected 'json' or 'pretty')")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

impl LogFormat {
    /// Format requested through `lookup`; unknown values fall back to JSON.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::requested(lookup).unwrap_or_default()
    }

    fn requested(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UnknownLogFormat> {
        match lookup(LOG_FORMAT_VAR) {
            None => Ok(LogFormat::default()),
            Some(raw) => raw.parse(),
        }
    }
}

/// Initialize tracing/logging for the process with the format from the environment.
///
/// An unknown `FORGEERP_LOG_FORMAT` falls back to JSON and is reported once
/// the subscriber is installed.
pub fn init() {
    match LogFormat::requested(|key| std::env::var(key).ok()) {
        Ok(format) => init_with(format),
        Err(err) => {
            init_with(LogFormat::default());
            ::tracing::warn!(error = %err, "falling back to json logs");
        }
    }
}

/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats_case_insensitively() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" Pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn unknown_format_is_reported_to_the_caller() {
        assert_eq!(
            LogFormat::requested(|_| Some("loud".to_string())),
            Err(UnknownLogFormat("loud".to_string()))
        );
        assert_eq!(LogFormat::requested(|_| None), Ok(LogFormat::Json));
    }

    #[test]
    fn lookup_defaults_to_json() {
        assert_eq!(LogFormat::from_lookup(|_| None), LogFormat::Json);
        assert_eq!(
            LogFormat::from_lookup(|_| Some("pretty".to_string())),
            LogFormat::Pretty
        );
        assert_eq!(
            LogFormat::from_lookup(|_| Some("loud".to_string())),
            LogFormat::Json
        );
    }
}
