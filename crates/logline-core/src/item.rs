//! Log item: one immutable logged event.
//!
//! Items are plain values. Everything is captured when the item is built and
//! nothing changes afterwards, so the same item can be handed to any number
//! of destinations on any number of threads.

use std::thread::{self, ThreadId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// Source location of a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub function: &'static str,
    pub line: u32,
}

impl Location {
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }

    /// Location of the caller. The enclosing function is not known through
    /// `#[track_caller]`, so it is left empty; use [`location!`](crate::location)
    /// to capture it as well.
    #[track_caller]
    pub fn caller() -> Self {
        let caller = std::panic::Location::caller();
        Self::new(caller.file(), "", caller.line())
    }
}

/// Captures the current file, enclosing function name and line.
#[macro_export]
macro_rules! location {
    () => {
        $crate::item::Location::new(
            file!(),
            $crate::item::short_function_name({
                fn __logline_here() {}
                fn type_name_of<T>(_: T) -> &'static str {
                    ::std::any::type_name::<T>()
                }
                type_name_of(__logline_here)
            }),
            line!(),
        )
    };
}

/// Reduces a `type_name` path of a marker fn nested in a function to the
/// function's own name, e.g. `app::net::connect::__logline_here` -> `connect`.
#[doc(hidden)]
pub fn short_function_name(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::__logline_here").unwrap_or(path);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// A single log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogItem {
    /// Creation time, serialized as RFC 3339 with nanoseconds
    timestamp: DateTime<Utc>,

    /// Optional module (subsystem) name the item was logged for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    module: Option<String>,

    /// Severity, serialized as its raw integer
    level: Level,

    message: String,
    file: String,
    function: String,
    line: u32,

    /// Resolved name of the logging thread, see [`current_thread_name`]
    thread: String,
}

impl LogItem {
    /// Create an item stamped with the current time and thread.
    pub fn new(level: Level, message: impl Into<String>, location: Location) -> Self {
        Self {
            timestamp: Utc::now(),
            module: None,
            level,
            message: message.into(),
            file: location.file.to_string(),
            function: location.function.to_string(),
            line: location.line,
            thread: current_thread_name(),
        }
    }

    /// Create an item from explicit field values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        timestamp: DateTime<Utc>,
        module: Option<String>,
        level: Level,
        message: impl Into<String>,
        file: impl Into<String>,
        function: impl Into<String>,
        line: u32,
        thread: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            module,
            level,
            message: message.into(),
            file: file.into(),
            function: function.into(),
            line,
            thread: thread.into(),
        }
    }

    /// Returns a copy of this item tagged with a module name.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON line.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Name of the calling thread as recorded in log items.
pub fn current_thread_name() -> String {
    let current = thread::current();
    resolve_thread_name(current.name(), current.id())
}

/// Thread naming rule for log items:
/// - the main thread (named `"main"` by the Rust runtime) is `""`
/// - any other named thread is its name
/// - unnamed threads get an opaque identity string such as `ThreadId(7)`
pub fn resolve_thread_name(name: Option<&str>, id: ThreadId) -> String {
    match name {
        Some("main") => String::new(),
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{:?}", id),
    }
}
