//! logline core library
//!
//! Structured logging pipeline with composable formatting and asynchronous,
//! per-destination delivery.
//!
//! ## Overview
//!
//! A log call builds one immutable [`LogItem`] (timestamp, level, message,
//! source location, thread, optional module) and hands it to every
//! registered destination whose minimum level it passes. Each destination
//! formats the item and delivers it on its own background queue, so the
//! calling thread never formats or performs I/O.
//!
//! ```text
//! info!("...") ──► Log ──┬──► ConsoleLogDestination ─► queue ─► stdout
//!                        ├──► FileLogDestination    ─► queue ─► app.jsonl
//!                        └──► StringLogDestination  ─► queue ─► String
//! ```
//!
//! Calls tagged with a module (`Log::module("storage").warning(..)`) are
//! only delivered for modules registered with [`Log::register_module`],
//! at or above the module's floor.
//!
//! Formatting is built from [`Formatting`] witnesses that compose like a
//! monoid, either with `+` or declaratively through [`formatting!`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use logline_core::{info, ConsoleLogDestination, Level, Log, StringLogItemFormatter};
//!
//! let console = ConsoleLogDestination::new(Level::Info, StringLogItemFormatter::default())?;
//! Log::global().register(Arc::new(console));
//!
//! info!("listening on {}", addr);
//! // 📘INFO listening on 0.0.0.0:8080 (main.rs:main:12) []
//! Log::global().flush();
//! ```
//!
//! ## Modules
//!
//! - [`level`]: severity levels
//! - [`item`]: the log item and call-site capture
//! - [`format`]: formatting witnesses, builder and components
//! - [`level_format`]: plain and ANSI level rendering
//! - [`item_format`]: string and JSON item formatters
//! - [`destination`]: console, file and in-memory destinations
//! - [`log`]: the dispatcher and logging macros
//! - [`layer`]: bridge from `tracing` events
//! - [`config`]: configuration and [`LoggingBuilder`]

pub mod config;
pub mod destination;
pub mod error;
pub mod format;
pub mod item;
pub mod item_format;
pub mod layer;
pub mod level;
pub mod level_format;
pub mod log;
pub mod queue;

pub use config::{FileFormat, LogConfig, LoggingBuilder};
pub use destination::{
    ConsoleLogDestination, FailureHandler, FileLogDestination, LogDestination, Metadata,
    StringLogDestination,
};
pub use error::{DestinationError, FormatError, LogError, LogResult};
pub use format::{Formatting, FormattingBuilder};
pub use item::{LogItem, Location};
pub use item_format::{JsonLogItemFormatter, LogItemFormatter, StringLogItemFormatter};
pub use layer::LogLayer;
pub use level::Level;
pub use level_format::{AnsiLevelFormatter, LevelFormatter, PlainLevelFormatter};
pub use log::{ErrorHandler, Log, ModuleLog};
