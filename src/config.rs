//! Client configuration supplied by the command line.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

use crate::ipc::{DEFAULT_SOCKET_PATH, DEFAULT_TIMEOUT_SECS};

/// Log verbosity accepted by `-v`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum Verbosity {
    Debug,
    Info,
    #[default]
    Error,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Error => LevelFilter::ERROR,
        }
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is not set.
    pub fn filter_directive(self) -> String {
        format!("snap_rpc={}", self.level_filter())
    }
}

/// Everything `RpcClient` needs to be constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub socket_path: PathBuf,
    pub timeout: Duration,
    pub verbosity: Verbosity,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verbosity: Verbosity::default(),
        }
    }
}

/// Parse a timeout given as (fractional) seconds, e.g. `60` or `0.5`.
pub fn parse_timeout_secs(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid timeout '{value}': expected seconds"))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("invalid timeout '{value}': must be a positive number"));
    }

    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.socket_path, PathBuf::from("/var/tmp/spdk.sock"));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.verbosity, Verbosity::Error);
    }

    #[test]
    fn test_parse_timeout_secs() {
        assert_eq!(parse_timeout_secs("60"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_timeout_secs("60.0"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_timeout_secs(" 0.25 "), Ok(Duration::from_millis(250)));
    }

    #[test]
    fn test_parse_timeout_rejects_bad_values() {
        for bad in ["", "abc", "0", "-1", "nan", "inf"] {
            assert!(parse_timeout_secs(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Verbosity::Debug.level_filter(), LevelFilter::DEBUG);
        assert_eq!(Verbosity::Info.level_filter(), LevelFilter::INFO);
        assert_eq!(Verbosity::Error.level_filter(), LevelFilter::ERROR);
        assert_eq!(Verbosity::Debug.filter_directive(), "snap_rpc=debug");
        assert_eq!(Verbosity::Info.filter_directive(), "snap_rpc=info");
        assert_eq!(Verbosity::Error.filter_directive(), "snap_rpc=error");
    }

    #[test]
    fn test_verbosity_parses_upper_case_names() {
        assert_eq!(Verbosity::from_str("DEBUG", false), Ok(Verbosity::Debug));
        assert_eq!(Verbosity::from_str("ERROR", false), Ok(Verbosity::Error));
        assert!(Verbosity::from_str("TRACE", false).is_err());
    }
}
