//! Custom tracing Layer that forwards events into a [`Log`].
//!
//! Events keep their source file and line. The span scope, joined with
//! `" > "`, becomes the item's module (the event target when there is no
//! span). Structured fields are appended to the message as `key=value`.
//!
//! Modules named this way are not looked up in the [`Log`] module
//! registry: the subscriber's own filters already decide which targets
//! are recorded.

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::item::Location;
use crate::level::Level;
use crate::log::Log;

/// A tracing Layer that turns events into log items.
pub struct LogLayer {
    log: Arc<Log>,
}

impl LogLayer {
    /// Forward events into `log`.
    pub fn new(log: Arc<Log>) -> Self {
        Self { log }
    }

    /// The dispatcher events are forwarded to.
    pub fn log(&self) -> &Arc<Log> {
        &self.log
    }
}

/// `TRACE` maps to [`Level::Verbose`], the others by name.
pub fn level_from_tracing(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE => Level::Verbose,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warning,
        _ => Level::Error,
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();

        // Our own diagnostics would loop back into the destinations.
        if metadata.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return;
        }

        let level = level_from_tracing(metadata.level());
        if !self.log.is_enabled(level) {
            return;
        }

        let module = ctx
            .event_scope(event)
            .map(|scope| {
                scope
                    .from_root()
                    .map(|span| span.name())
                    .collect::<Vec<_>>()
                    .join(" > ")
            })
            .filter(|spans| !spans.is_empty())
            .unwrap_or_else(|| metadata.target().to_string());

        let location = Location::new(
            metadata.file().unwrap_or(""),
            "",
            metadata.line().unwrap_or(0),
        );

        self.log.log_tagged(
            module,
            level,
            || {
                let mut visitor = MessageVisitor::default();
                event.record(&mut visitor);
                visitor.finish()
            },
            location,
        );
    }
}

/// Visitor that renders an event's message and fields into one line.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        let mut line = self.message.unwrap_or_default();
        for (name, value) in self.fields {
            if !line.is_empty() {
                line.push(' ');
            }
            let _ = write!(line, "{}={}", name, value);
        }
        line
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut buf = String::new();
        let _ = write!(&mut buf, "{:?}", value);

        if field.name() == "message" {
            self.message = Some(buf);
        } else {
            self.fields.push((field.name(), buf));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.push((field.name(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::StringLogDestination;
    use crate::format::components::{level, message, module};
    use crate::format::Formatting;
    use crate::item_format::StringLogItemFormatter;
    use tracing_subscriber::prelude::*;

    fn capture(min_level: Level) -> (Arc<Log>, Arc<StringLogDestination>) {
        let log = Arc::new(Log::new());
        let destination = Arc::new(
            StringLogDestination::new(
                min_level,
                StringLogItemFormatter::new(
                    level() + Formatting::from(" ") + module("") + Formatting::from(" ") + message(),
                ),
            )
            .unwrap(),
        );
        log.register(destination.clone());
        (log, destination)
    }

    #[test]
    fn test_layer_forwards_events() {
        let (log, destination) = capture(Level::Verbose);
        let subscriber = tracing_subscriber::registry().with(LogLayer::new(log.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "Test message");
            tracing::warn!(target: "app", count = 42, peer = "b", "Warning with field");
            let span = tracing::info_span!("sync");
            let _guard = span.enter();
            tracing::trace!(target: "app", "inside");
        });
        log.flush();

        assert_eq!(
            destination.output(),
            "INFO app Test message\nWARNING app Warning with field count=42 peer=b\nVERBOSE sync inside"
        );
    }

    #[test]
    fn test_layer_respects_levels() {
        let (log, destination) = capture(Level::Warning);
        let subscriber = tracing_subscriber::registry().with(LogLayer::new(log.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "app", "dropped");
            tracing::error!(target: "app", "kept");
        });
        log.flush();

        assert_eq!(destination.output(), "ERROR app kept");
    }

    #[test]
    fn test_layer_ignores_module_registry() {
        let (log, destination) = capture(Level::Verbose);
        log.register_module("other", Level::Error);
        let subscriber = tracing_subscriber::registry().with(LogLayer::new(log.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "unregistered", "still forwarded");
        });
        log.flush();

        assert_eq!(destination.output(), "DEBUG unregistered still forwarded");
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_from_tracing(&tracing::Level::TRACE), Level::Verbose);
        assert_eq!(level_from_tracing(&tracing::Level::WARN), Level::Warning);
        assert_eq!(level_from_tracing(&tracing::Level::ERROR), Level::Error);
    }
}
