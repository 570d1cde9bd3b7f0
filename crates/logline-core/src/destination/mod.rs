//! Log destinations: named sinks with a severity floor, a formatter and a
//! private delivery queue.
//!
//! `write` is fire-and-forget. Formatting and delivery happen on the
//! destination's own [`DeliveryQueue`](crate::queue::DeliveryQueue), in
//! submission order. Failures never reach the caller; they are handed to
//! the `on_failure` handler supplied by the dispatcher.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::DestinationError;
use crate::item::LogItem;
use crate::level::Level;

pub mod console;
pub mod file;
pub mod string;

pub use console::ConsoleLogDestination;
pub use file::FileLogDestination;
pub use string::StringLogDestination;

/// Receives delivery failures of a destination.
pub type FailureHandler = Arc<dyn Fn(DestinationError) + Send + Sync>;

/// Custom key/value data attached to a destination (user, device, session ids).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A configured log sink.
pub trait LogDestination: Send + Sync {
    /// Items below this level are not delivered here.
    fn min_level(&self) -> Level;

    /// Identity used by the dispatcher to deduplicate registrations.
    /// Defaults to the concrete type name.
    fn id(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Format and deliver `item`. Must not block on delivery.
    fn write(&self, item: LogItem, on_failure: FailureHandler);

    /// Attach custom metadata. Ignored unless the destination supports it.
    fn set_metadata(&self, _metadata: &Metadata, _on_failure: FailureHandler) {}

    /// Remove previously attached metadata. Ignored unless supported.
    fn remove_metadata(&self, _keys: &[String], _on_failure: FailureHandler) {}

    /// Block until everything written so far has been delivered.
    fn flush(&self) {}

    fn accepts(&self, level: Level) -> bool {
        level.passes(self.min_level())
    }
}

/// A destination's adjustable severity floor.
#[derive(Debug)]
pub struct MinLevel(AtomicU8);

impl MinLevel {
    /// A floor starting at `level`.
    pub fn new(level: Level) -> Self {
        Self(AtomicU8::new(level.into()))
    }

    pub fn get(&self) -> Level {
        Level::try_from(self.0.load(Ordering::Relaxed)).unwrap_or(Level::Verbose)
    }

    /// Takes effect for items dispatched afterwards.
    pub fn set(&self, level: Level) {
        self.0.store(level.into(), Ordering::Relaxed);
    }
}

/// A failure handler that drops every error.
pub fn ignore_failures() -> FailureHandler {
    Arc::new(|_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WarningsOnly;

    impl LogDestination for WarningsOnly {
        fn min_level(&self) -> Level {
            Level::Warning
        }

        fn write(&self, _item: LogItem, _on_failure: FailureHandler) {}
    }

    #[test]
    fn test_default_id_is_type_name() {
        assert!(WarningsOnly.id().ends_with("WarningsOnly"));

        let erased: Arc<dyn LogDestination> = Arc::new(WarningsOnly);
        assert_eq!(erased.id(), WarningsOnly.id());
    }

    #[test]
    fn test_accepts_uses_floor() {
        assert!(WarningsOnly.accepts(Level::Error));
        assert!(WarningsOnly.accepts(Level::Warning));
        assert!(!WarningsOnly.accepts(Level::Info));
    }

    #[test]
    fn test_min_level_is_adjustable() {
        let min = MinLevel::new(Level::Info);
        assert_eq!(min.get(), Level::Info);
        min.set(Level::Error);
        assert_eq!(min.get(), Level::Error);
    }
}
