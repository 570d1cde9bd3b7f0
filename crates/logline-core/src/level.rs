//! Log severity levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Severity of a log item. Ordering defines severity: a larger raw value is
/// more severe.
///
/// Encoded in JSON as its raw integer (`0` for verbose up to `4` for error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    Verbose = 0,
    Debug = 1,
    Info = 2,
    Warning = 3,
    Error = 4,
}

impl Level {
    /// All levels, from least to most severe.
    pub const ALL: [Level; 5] = [
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
    ];

    /// Upper case label, e.g. `"WARNING"`.
    pub fn label(self) -> &'static str {
        match self {
            Level::Verbose => "VERBOSE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }

    /// Whether an item of this level passes a severity floor of `min_level`.
    pub fn passes(self, min_level: Level) -> bool {
        min_level <= self
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for Level {
    type Error = LogError;

    fn try_from(raw: u8) -> Result<Self, LogError> {
        Level::ALL
            .get(usize::from(raw))
            .copied()
            .ok_or_else(|| LogError::InvalidLevel(raw.to_string()))
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" | "trace" => Ok(Level::Verbose),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_severity() {
        assert!(Level::Verbose < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Warning < Level::Error);
    }

    #[test]
    fn test_passes_is_inclusive() {
        assert!(Level::Warning.passes(Level::Warning));
        assert!(Level::Error.passes(Level::Warning));
        assert!(!Level::Info.passes(Level::Warning));
    }

    #[test]
    fn test_raw_value_roundtrip() {
        for level in Level::ALL {
            let raw: u8 = level.into();
            assert_eq!(Level::try_from(raw).unwrap(), level);
        }
        assert!(Level::try_from(5).is_err());
        assert!(matches!(Level::try_from(9), Err(LogError::InvalidLevel(raw)) if raw == "9"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("verbose".parse::<Level>().unwrap(), Level::Verbose);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_json_is_raw_integer() {
        assert_eq!(serde_json::to_string(&Level::Error).unwrap(), "4");
        let level: Level = serde_json::from_str("1").unwrap();
        assert_eq!(level, Level::Debug);
        assert!(serde_json::from_str::<Level>("9").is_err());
    }
}
