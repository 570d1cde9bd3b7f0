//! Error types for logline

use std::path::PathBuf;

use thiserror::Error;

use crate::item::LogItem;

/// Error produced while turning a log item into an output representation.
#[derive(Error, Debug)]
pub enum FormatError {
    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A formatting witness or output transform rejected the item
    #[error("Transform error: {0}")]
    Transform(String),
}

/// Error reported by a destination while delivering a log item.
///
/// These never propagate to the log call site; they are handed to the
/// dispatcher's failure handler.
#[derive(Error, Debug)]
pub enum DestinationError {
    /// Formatting a log item failed, nothing was delivered
    #[error("Destination {destination}: failed to format item: {source}")]
    Format {
        destination: String,
        item: Box<LogItem>,
        #[source]
        source: FormatError,
    },

    /// Writing a formatted item failed
    #[error("Destination {destination}: failed to write item to {path:?}: {source}")]
    Write {
        destination: String,
        path: PathBuf,
        item: Box<LogItem>,
        #[source]
        source: std::io::Error,
    },

    /// Writing a metadata message failed
    #[error("Destination {destination}: failed to write metadata to {path:?}: {source}")]
    MetadataWrite {
        destination: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log file couldn't be removed
    #[error("Failed to clear log file {path:?}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DestinationError {
    /// The id of the destination that failed, if known.
    pub fn destination(&self) -> Option<&str> {
        match self {
            Self::Format { destination, .. }
            | Self::Write { destination, .. }
            | Self::MetadataWrite { destination, .. } => Some(destination),
            Self::Clear { .. } => None,
        }
    }

    /// The item whose delivery failed, if the failure was item related.
    pub fn item(&self) -> Option<&LogItem> {
        match self {
            Self::Format { item, .. } | Self::Write { item, .. } => Some(item),
            Self::MetadataWrite { .. } | Self::Clear { .. } => None,
        }
    }
}

/// Main error type for setting up the logging pipeline
#[derive(Error, Debug)]
pub enum LogError {
    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or is inconsistent
    #[error("Config error: {0}")]
    Config(String),

    /// Error during serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown level name or raw value
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// The delivery worker thread could not be started
    #[error("Failed to spawn delivery worker {label}: {source}")]
    QueueSpawn {
        label: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Location;
    use crate::level::Level;

    #[test]
    fn test_error_display() {
        let err = LogError::InvalidLevel("loud".to_string());
        assert_eq!(format!("{}", err), "Invalid level: loud");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let log_err: LogError = io_err.into();
        assert!(matches!(log_err, LogError::Io(_)));
    }

    #[test]
    fn test_destination_error_accessors() {
        let item = LogItem::new(Level::Info, "hello", Location::new("a.rs", "f", 1));
        let err = DestinationError::Format {
            destination: "console".into(),
            item: Box::new(item.clone()),
            source: FormatError::Transform("nope".into()),
        };

        assert_eq!(err.destination(), Some("console"));
        assert_eq!(err.item(), Some(&item));
        assert!(err.to_string().contains("nope"));
    }
}
