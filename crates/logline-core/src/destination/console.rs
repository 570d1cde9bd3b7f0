//! Console destination.

use std::io::Write;
use std::sync::Arc;

use super::{FailureHandler, LogDestination, Metadata, MinLevel};
use crate::error::{DestinationError, LogResult};
use crate::item::LogItem;
use crate::item_format::{LogItemFormatter, StringLogItemFormatter};
use crate::level::Level;
use crate::queue::DeliveryQueue;

/// Emits a finished line. Receives the item's level so sinks can route
/// by severity (stderr for errors, a platform logger, ...).
pub type ConsoleOutput = Arc<dyn Fn(Level, &str) + Send + Sync>;

/// Renders attached metadata into a console line, or nothing.
pub type ConsoleMetadataFormatter = Arc<dyn Fn(&Metadata) -> Option<String> + Send + Sync>;

/// Prints formatted items through an output closure, stdout by default.
///
/// Items that format to an empty string are skipped.
pub struct ConsoleLogDestination<F = StringLogItemFormatter> {
    id: String,
    min_level: MinLevel,
    formatter: Arc<F>,
    output: ConsoleOutput,
    metadata_formatter: Option<ConsoleMetadataFormatter>,
    queue: DeliveryQueue,
}

impl<F> ConsoleLogDestination<F>
where
    F: LogItemFormatter<Output = String> + 'static,
{
    /// Print items at or above `min_level` to stdout.
    pub fn new(min_level: Level, formatter: F) -> LogResult<Self> {
        Ok(Self {
            id: std::any::type_name::<Self>().to_string(),
            min_level: MinLevel::new(min_level),
            formatter: Arc::new(formatter),
            output: Arc::new(print_line),
            metadata_formatter: None,
            queue: DeliveryQueue::new("logline-console")?,
        })
    }

    /// Send lines to `output` instead of stdout. Runs on the delivery
    /// thread.
    pub fn with_output(mut self, output: impl Fn(Level, &str) + Send + Sync + 'static) -> Self {
        self.output = Arc::new(output);
        self
    }

    /// Print a line whenever metadata is attached.
    pub fn with_metadata_formatter(
        mut self,
        formatter: impl Fn(&Metadata) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.metadata_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Change the floor for items dispatched from now on.
    pub fn set_min_level(&self, level: Level) {
        self.min_level.set(level);
    }
}

fn print_line(_level: Level, line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", line);
}

impl<F> LogDestination for ConsoleLogDestination<F>
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
        let output = Arc::clone(&self.output);
        let id = self.id.clone();

        self.queue.dispatch(move || match formatter.format(&item) {
            Ok(line) if line.is_empty() => {}
            Ok(line) => output(item.level(), &line),
            Err(source) => on_failure(DestinationError::Format {
                destination: id,
                item: Box::new(item),
                source,
            }),
        });
    }

    fn set_metadata(&self, metadata: &Metadata, _on_failure: FailureHandler) {
        let Some(formatter) = self.metadata_formatter.clone() else {
            return;
        };
        let output = Arc::clone(&self.output);
        let metadata = metadata.clone();

        self.queue.dispatch(move || {
            if let Some(line) = formatter(&metadata).filter(|line| !line.is_empty()) {
                output(Level::Info, &line);
            }
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
    use crate::format::Formatting;
    use crate::item::Location;
    use parking_lot::Mutex;

    fn capture<F>(formatter: F) -> (ConsoleLogDestination<F>, Arc<Mutex<Vec<(Level, String)>>>)
    where
        F: LogItemFormatter<Output = String> + 'static,
    {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let destination = ConsoleLogDestination::new(Level::Verbose, formatter)
            .unwrap()
            .with_output(move |level, line| sink.lock().push((level, line.to_string())));
        (destination, lines)
    }

    fn item(level: Level, message: &str) -> LogItem {
        LogItem::new(level, message, Location::new("main.rs", "run", 3))
    }

    #[test]
    fn test_writes_through_output_closure() {
        let (destination, lines) = capture(StringLogItemFormatter::message_only());

        destination.write(item(Level::Warning, "careful"), ignore_failures());
        destination.write(item(Level::Error, "broken"), ignore_failures());
        destination.flush();

        assert_eq!(
            *lines.lock(),
            vec![
                (Level::Warning, "careful".to_string()),
                (Level::Error, "broken".to_string())
            ]
        );
    }

    #[test]
    fn test_skips_empty_lines() {
        let (destination, lines) = capture(StringLogItemFormatter::message_only());

        destination.write(item(Level::Info, ""), ignore_failures());
        destination.write(item(Level::Info, "kept"), ignore_failures());
        destination.flush();

        assert_eq!(lines.lock().len(), 1);
        assert_eq!(lines.lock()[0].1, "kept");
    }

    #[test]
    fn test_metadata_line() {
        let (destination, lines) = capture(StringLogItemFormatter::new(Formatting::empty()));
        let destination = destination.with_metadata_formatter(|metadata| {
            metadata.get("user").map(|user| format!("user = {}", user))
        });

        let mut metadata = Metadata::new();
        metadata.insert("session".into(), serde_json::json!(7));
        destination.set_metadata(&metadata, ignore_failures());
        metadata.insert("user".into(), serde_json::json!("ada"));
        destination.set_metadata(&metadata, ignore_failures());
        destination.flush();

        assert_eq!(*lines.lock(), vec![(Level::Info, "user = \"ada\"".to_string())]);
    }

    #[test]
    fn test_metadata_ignored_without_formatter() {
        let (destination, lines) = capture(StringLogItemFormatter::message_only());
        destination.set_metadata(&Metadata::new(), ignore_failures());
        destination.flush();
        assert!(lines.lock().is_empty());
    }
}
