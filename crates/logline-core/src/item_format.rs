//! Log item formatters: turn a [`LogItem`] into a destination's output type.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::FormatError;
use crate::format::components::{
    emoji_level, file, function, level, level_tag, line, message, module, thread, timestamp,
};
use crate::format::{Formatting, Group};
use crate::formatting;
use crate::item::LogItem;
use crate::level_format::{LevelFormatter, PlainLevelFormatter};

/// Transforms log items into an output representation.
///
/// Implementations hold no mutable state: `format` is a pure function of
/// the item and the formatter's fixed configuration, and is safe to call
/// from any number of threads at once.
pub trait LogItemFormatter: Send + Sync {
    type Output;

    fn format(&self, item: &LogItem) -> Result<Self::Output, FormatError>;
}

impl<F: LogItemFormatter + ?Sized> LogItemFormatter for Arc<F> {
    type Output = F::Output;

    fn format(&self, item: &LogItem) -> Result<Self::Output, FormatError> {
        (**self).format(item)
    }
}

/// Formats items as text through a [`Formatting<String>`] witness.
#[derive(Debug, Clone)]
pub struct StringLogItemFormatter {
    formatting: Formatting<String>,
}

impl StringLogItemFormatter {
    /// A formatter driven by any string witness.
    pub fn new(formatting: Formatting<String>) -> Self {
        Self { formatting }
    }

    /// The default layout using the given level formatter:
    ///
    /// `<escape><color><label><reset> <message> (<file>:<function>:<line>) [<thread>]`
    ///
    /// where `<file>` is the last path component of the source file.
    pub fn with_level_formatter(level_formatter: Arc<dyn LevelFormatter>) -> Self {
        Self::new(formatting![
            level_tag(level_formatter),
            " ",
            message(),
            " (",
            file(true),
            ":",
            function(),
            ":",
            line(),
            ") [",
            thread(),
            "]",
        ])
    }

    /// Long layout with timestamp and module:
    ///
    /// `<timestamp> <module> | <emoji> <LEVEL padded to 7> | [<thread>] <function> | <file>:<line> | <message>`
    ///
    /// The module is dropped (with its space) when the item has none.
    pub fn detailed() -> Self {
        Self::new(
            Group::<String>::new([
                Group::<String>::new([timestamp(), module("")])
                    .separator(" ")
                    .build()
                    .trimmed(),
                "|".into(),
                emoji_level(),
                level().right_padded(7, ' '),
                "|".into(),
                thread().wrapped("[", "]"),
                function(),
                "|".into(),
                Group::<String>::new([file(true), line()]).separator(":").build(),
                "|".into(),
                message(),
            ])
            .separator(" ")
            .build(),
        )
    }

    /// Only the message text.
    pub fn message_only() -> Self {
        Self::new(message())
    }

    /// The witness every item goes through.
    pub fn formatting(&self) -> &Formatting<String> {
        &self.formatting
    }
}

impl Default for StringLogItemFormatter {
    /// The default layout with [`PlainLevelFormatter`], e.g.
    /// `📕ERROR disk full (writer.rs:flush:88) [io]`.
    fn default() -> Self {
        Self::with_level_formatter(Arc::new(PlainLevelFormatter))
    }
}

impl LogItemFormatter for StringLogItemFormatter {
    type Output = String;

    fn format(&self, item: &LogItem) -> Result<String, FormatError> {
        self.formatting.format_item(item)
    }
}

/// Serializes complete items as JSON.
///
/// The document has the fields `timestamp` (RFC 3339, nanoseconds),
/// `module` (omitted when absent), `level` (raw integer 0-4), `message`,
/// `file`, `function`, `line` and `thread`. [`decode`](Self::decode)
/// reconstructs an equal item.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLogItemFormatter {
    pretty: bool,
}

impl JsonLogItemFormatter {
    /// Compact single-line output, one document per item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-line, indented output. Not suitable for JSONL files.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Parse a document produced by either layout back into an item.
    pub fn decode(&self, bytes: &[u8]) -> Result<LogItem, FormatError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl LogItemFormatter for JsonLogItemFormatter {
    type Output = Vec<u8>;

    fn format(&self, item: &LogItem) -> Result<Vec<u8>, FormatError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(item)?
        } else {
            serde_json::to_vec(item)?
        };
        Ok(bytes)
    }
}

/// Read every item from a JSONL log file, in file order.
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_json_lines(path: impl AsRef<Path>) -> std::io::Result<Vec<LogItem>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let mut items = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match LogItem::from_json_line(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(path = %path.display(), line = index + 1, error = %e, "Skipping unparseable log line");
            }
        }
    }

    Ok(items)
}
