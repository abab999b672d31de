//! Run configuration: worker budget and search bound
//!
//! The primary file format is two `key=value` lines:
//!
//! ```text
//! x=4
//! y=1000
//! ```
//!
//! where `x` is the worker count (at least 1) and `y` the inclusive upper
//! bound of the search (at least 2). The alternate [`ConfigFormat::Pair`]
//! form is a single line holding both integers, `4 1000`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.txt";

const KEY_WORKERS: &str = "x";
const KEY_BOUND: &str = "y";
const MIN_WORKERS: u64 = 1;
const MIN_BOUND: u64 = 2;

/// Errors raised while reading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to open configuration file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration file is empty")]
    Empty,
    #[error("line {line_number}: expected key=value, found '{line}'")]
    MalformedLine { line_number: usize, line: String },
    #[error("line {line_number}: unknown configuration key '{key}'")]
    UnknownKey { line_number: usize, key: String },
    #[error("line {line_number}: key '{key}' is set more than once")]
    DuplicateKey { line_number: usize, key: String },
    #[error("missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("invalid value for {key}: '{value}' is not a non-negative integer")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be at least {min}, found {value}")]
    OutOfRange { key: &'static str, value: u64, min: u64 },
    #[error("expected exactly two integers \"X Y\", found {found} token(s)")]
    TokenCount { found: usize },
}

/// Accepted configuration file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// `x=<workers>` and `y=<bound>` on separate lines
    #[default]
    KeyValue,
    /// A single line `<workers> <bound>`
    Pair,
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::KeyValue => write!(f, "key-value"),
            ConfigFormat::Pair => write!(f, "pair"),
        }
    }
}

impl std::str::FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "key-value" | "kv" | "keyvalue" => Ok(ConfigFormat::KeyValue),
            "pair" | "xy" => Ok(ConfigFormat::Pair),
            _ => Err(format!(
                "Unknown config format: '{}'. Valid options: key-value, pair",
                s
            )),
        }
    }
}

/// Validated worker budget and search bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Number of workers (X), never larger than `bound`
    pub workers: usize,
    /// Inclusive upper bound of the search (Y)
    pub bound: u64,
}

impl Settings {
    /// Build settings from raw values, clamping the worker count to
    /// `[1, bound]`.
    ///
    /// Unlike the file loaders this does not reject small bounds: a bound
    /// below 2 simply describes a search with no candidates.
    pub fn new(workers: usize, bound: u64) -> Self {
        let mut workers = workers.max(1);
        if bound >= 1 && workers as u64 > bound {
            warn!(
                workers,
                bound, "worker count exceeds the search range, adjusting to {}", bound
            );
            workers = bound as usize;
        }
        Self { workers, bound }
    }

    /// Validate raw values against the file contract, then clamp.
    pub fn validated(workers: u64, bound: u64) -> Result<Self, ConfigError> {
        if workers < MIN_WORKERS {
            return Err(ConfigError::OutOfRange {
                key: KEY_WORKERS,
                value: workers,
                min: MIN_WORKERS,
            });
        }
        if bound < MIN_BOUND {
            return Err(ConfigError::OutOfRange {
                key: KEY_BOUND,
                value: bound,
                min: MIN_BOUND,
            });
        }
        // Anything past usize::MAX is clamped to the bound anyway.
        let workers = usize::try_from(workers).unwrap_or(usize::MAX);
        Ok(Self::new(workers, bound))
    }
}

/// Read and validate a configuration file.
pub fn load(path: &Path, format: ConfigFormat) -> Result<Settings, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, format)
}

/// Parse configuration text in the given format.
pub fn parse(text: &str, format: ConfigFormat) -> Result<Settings, ConfigError> {
    match format {
        ConfigFormat::KeyValue => parse_key_value(text),
        ConfigFormat::Pair => parse_pair(text),
    }
}

fn parse_integer(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let value = raw.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        });
    }
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Parse the `x=<workers>` / `y=<bound>` form. Blank lines are ignored.
pub fn parse_key_value(text: &str) -> Result<Settings, ConfigError> {
    let mut workers: Option<u64> = None;
    let mut bound: Option<u64> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::MalformedLine {
                line_number,
                line: line.to_string(),
            });
        };

        let (name, slot) = match key.trim() {
            KEY_WORKERS => (KEY_WORKERS, &mut workers),
            KEY_BOUND => (KEY_BOUND, &mut bound),
            other => {
                return Err(ConfigError::UnknownKey {
                    line_number,
                    key: other.to_string(),
                });
            }
        };

        if slot.is_some() {
            return Err(ConfigError::DuplicateKey {
                line_number,
                key: name.to_string(),
            });
        }
        *slot = Some(parse_integer(name, value)?);
    }

    let workers = workers.ok_or(ConfigError::MissingKey(KEY_WORKERS))?;
    let bound = bound.ok_or(ConfigError::MissingKey(KEY_BOUND))?;
    Settings::validated(workers, bound)
}

/// Parse the single-line `<workers> <bound>` form. Trailing tokens are
/// rejected.
pub fn parse_pair(text: &str) -> Result<Settings, ConfigError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Err(ConfigError::Empty),
        [workers, bound] => {
            let workers = parse_integer(KEY_WORKERS, workers)?;
            let bound = parse_integer(KEY_BOUND, bound)?;
            Settings::validated(workers, bound)
        }
        _ => Err(ConfigError::TokenCount {
            found: tokens.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_key_value() {
        let settings = parse_key_value("x=4\ny=1000\n").unwrap();
        assert_eq!(settings, Settings { workers: 4, bound: 1000 });
    }

    #[test]
    fn test_parse_key_value_order_and_whitespace() {
        let settings = parse_key_value("\n  y = 30 \n\nx=3\n").unwrap();
        assert_eq!(settings, Settings { workers: 3, bound: 30 });
    }

    #[test]
    fn test_parse_key_value_clamps_workers() {
        let settings = parse_key_value("x=16\ny=5").unwrap();
        assert_eq!(settings.workers, 5);
        assert_eq!(settings.bound, 5);
    }

    #[test]
    fn test_parse_key_value_malformed_line() {
        let err = parse_key_value("x=4\ny 10").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MalformedLine { line_number: 2, .. }
        ));
    }

    #[test]
    fn test_parse_key_value_unknown_key() {
        let err = parse_key_value("x=4\nz=10").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { ref key, .. } if key == "z"));

        // Keys are case-sensitive
        let err = parse_key_value("X=4\ny=10").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { .. }));
    }

    #[test]
    fn test_parse_key_value_duplicate_key() {
        let err = parse_key_value("x=4\nx=5\ny=10").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateKey { line_number: 2, .. }
        ));
    }

    #[test]
    fn test_parse_key_value_missing_key() {
        assert!(matches!(
            parse_key_value("x=4").unwrap_err(),
            ConfigError::MissingKey("y")
        ));
        assert!(matches!(
            parse_key_value("y=4").unwrap_err(),
            ConfigError::MissingKey("x")
        ));
        assert!(matches!(
            parse_key_value("").unwrap_err(),
            ConfigError::MissingKey("x")
        ));
    }

    #[test]
    fn test_parse_key_value_invalid_values() {
        for text in ["x=four\ny=10", "x=-1\ny=10", "x=\ny=10", "x=4\ny=1.5"] {
            assert!(
                matches!(parse_key_value(text), Err(ConfigError::InvalidValue { .. })),
                "expected invalid value for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_parse_key_value_out_of_range() {
        assert!(matches!(
            parse_key_value("x=0\ny=10").unwrap_err(),
            ConfigError::OutOfRange { key: "x", value: 0, min: 1 }
        ));
        assert!(matches!(
            parse_key_value("x=4\ny=1").unwrap_err(),
            ConfigError::OutOfRange { key: "y", value: 1, min: 2 }
        ));
    }

    #[test]
    fn test_parse_pair() {
        let settings = parse_pair("4 1000\n").unwrap();
        assert_eq!(settings, Settings { workers: 4, bound: 1000 });
    }

    #[test]
    fn test_parse_pair_rejects_bad_token_counts() {
        assert!(matches!(parse_pair("").unwrap_err(), ConfigError::Empty));
        assert!(matches!(parse_pair("   \n").unwrap_err(), ConfigError::Empty));
        assert!(matches!(
            parse_pair("4").unwrap_err(),
            ConfigError::TokenCount { found: 1 }
        ));
        assert!(matches!(
            parse_pair("4 100 extra").unwrap_err(),
            ConfigError::TokenCount { found: 3 }
        ));
    }

    #[test]
    fn test_settings_new_clamps() {
        assert_eq!(Settings::new(4, 1), Settings { workers: 1, bound: 1 });
        assert_eq!(Settings::new(0, 10), Settings { workers: 1, bound: 10 });
        assert_eq!(Settings::new(3, 30), Settings { workers: 3, bound: 30 });
    }

    #[test]
    fn test_config_format_from_str() {
        assert_eq!("key-value".parse::<ConfigFormat>().unwrap(), ConfigFormat::KeyValue);
        assert_eq!("key_value".parse::<ConfigFormat>().unwrap(), ConfigFormat::KeyValue);
        assert_eq!("pair".parse::<ConfigFormat>().unwrap(), ConfigFormat::Pair);
        assert!("yaml".parse::<ConfigFormat>().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.txt"), ConfigFormat::KeyValue).unwrap_err();
        assert!(matches!(err, ConfigError::Open { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x=2").unwrap();
        writeln!(file, "y=50").unwrap();
        let settings = load(file.path(), ConfigFormat::KeyValue).unwrap();
        assert_eq!(settings, Settings { workers: 2, bound: 50 });
    }
}
