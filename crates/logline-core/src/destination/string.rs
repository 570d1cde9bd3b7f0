//! In-memory destination accumulating formatted items into a string.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{FailureHandler, LogDestination, MinLevel};
use crate::error::{DestinationError, LogResult};
use crate::item::LogItem;
use crate::item_format::{LogItemFormatter, StringLogItemFormatter};
use crate::level::Level;
use crate::queue::DeliveryQueue;

#[derive(Debug, Default)]
struct Buffer {
    output: String,
    written_items: usize,
}

/// Collects formatted items joined by a linefeed.
///
/// The buffer and counter are only mutated from the destination's queue;
/// call [`flush`](LogDestination::flush) before reading them to observe
/// every write submitted so far.
pub struct StringLogDestination<F = StringLogItemFormatter> {
    id: String,
    min_level: MinLevel,
    formatter: Arc<F>,
    linefeed: Arc<str>,
    buffer: Arc<Mutex<Buffer>>,
    queue: DeliveryQueue,
}

impl<F> StringLogDestination<F>
where
    F: LogItemFormatter<Output = String> + 'static,
{
    /// An empty buffer accepting items at or above `min_level`.
    pub fn new(min_level: Level, formatter: F) -> LogResult<Self> {
        Ok(Self {
            id: std::any::type_name::<Self>().to_string(),
            min_level: MinLevel::new(min_level),
            formatter: Arc::new(formatter),
            linefeed: Arc::from("\n"),
            buffer: Arc::new(Mutex::new(Buffer::default())),
            queue: DeliveryQueue::new("logline-string")?,
        })
    }

    /// Separator placed between items. Defaults to `"\n"`.
    pub fn with_linefeed(mut self, linefeed: impl AsRef<str>) -> Self {
        self.linefeed = Arc::from(linefeed.as_ref());
        self
    }

    /// Override the registry identity, e.g. to register several string
    /// destinations on one dispatcher.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Change the floor for items dispatched from now on.
    pub fn set_min_level(&self, level: Level) {
        self.min_level.set(level);
    }

    /// Everything delivered so far.
    pub fn output(&self) -> String {
        self.buffer.lock().output.clone()
    }

    /// Number of items successfully formatted and appended.
    pub fn written_items(&self) -> usize {
        self.buffer.lock().written_items
    }
}

impl<F> LogDestination for StringLogDestination<F>
where
    F: LogItemFormatter<Output = String> + 'static,
{
    fn min_level(&self) -> Level {
        self.min_level.get()
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn write(&self, item: LogItem, on_failure: FailureHandler) {
        let formatter = Arc::clone(&self.formatter);
        let buffer = Arc::clone(&self.buffer);
        let linefeed = Arc::clone(&self.linefeed);
        let id = self.id.clone();

        self.queue.dispatch(move || match formatter.format(&item) {
            Ok(text) => {
                let mut buffer = buffer.lock();
                if buffer.written_items > 0 {
                    buffer.output.push_str(&linefeed);
                }
                buffer.output.push_str(&text);
                buffer.written_items += 1;
            }
            Err(source) => on_failure(DestinationError::Format {
                destination: id,
                item: Box::new(item),
                source,
            }),
        });
    }

    fn flush(&self) {
        self.queue.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::ignore_failures;
    use crate::error::FormatError;
    use crate::format::Formatting;
    use crate::item::Location;

    fn item(level: Level, message: &str) -> LogItem {
        LogItem::new(level, message, Location::new("a.rs", "f", 1))
    }

    #[test]
    fn test_accumulates_with_linefeed() {
        let destination =
            StringLogDestination::new(Level::Info, StringLogItemFormatter::message_only()).unwrap();

        for message in ["one", "two", "three"] {
            destination.write(item(Level::Info, message), ignore_failures());
        }
        destination.flush();

        assert_eq!(destination.output(), "one\ntwo\nthree");
        assert_eq!(destination.written_items(), 3);
    }

    #[test]
    fn test_custom_linefeed() {
        let destination = StringLogDestination::new(Level::Info, StringLogItemFormatter::message_only())
            .unwrap()
            .with_linefeed(" | ");

        destination.write(item(Level::Info, "a"), ignore_failures());
        destination.write(item(Level::Info, "b"), ignore_failures());
        destination.flush();

        assert_eq!(destination.output(), "a | b");
    }

    #[test]
    fn test_format_failure_reported_and_not_written() {
        let failing = StringLogItemFormatter::new(Formatting::new(|_, _: &mut String| {
            Err(FormatError::Transform("nope".into()))
        }));
        let destination = StringLogDestination::new(Level::Verbose, failing).unwrap();

        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();
        destination.write(
            item(Level::Error, "lost"),
            Arc::new(move |e: DestinationError| sink.lock().push(e.to_string())),
        );
        destination.flush();

        assert_eq!(destination.output(), "");
        assert_eq!(destination.written_items(), 0);
        assert_eq!(failures.lock().len(), 1);
        assert!(failures.lock()[0].contains("nope"));
    }

    #[test]
    fn test_with_id_and_min_level() {
        let destination =
            StringLogDestination::new(Level::Info, StringLogItemFormatter::default())
                .unwrap()
                .with_id("audit");
        assert_eq!(destination.id(), "audit");

        destination.set_min_level(Level::Error);
        assert_eq!(destination.min_level(), Level::Error);
    }
}
