//! Level formatters: how a level is colored and labelled.
//!
//! | Level   | Plain color | ANSI color |
//! |---------|-------------|------------|
//! | verbose | 📓          | 251m       |
//! | debug   | 📗          | 35m        |
//! | info    | 📘          | 38m        |
//! | warning | 📒          | 178m       |
//! | error   | 📕          | 197m       |
//!
//! Both strategies use the upper case level name as label.

use crate::level::Level;

/// ANSI 256-color foreground escape prefix. The color code follows.
pub const ANSI_COLOR_ESCAPE: &str = "\u{1b}[38;5;";

/// ANSI attribute reset sequence.
pub const ANSI_COLOR_RESET: &str = "\u{1b}[0m";

/// Maps a level to color and label strings.
///
/// The provided methods implement the plain strategy, so a custom formatter
/// only overrides what differs.
pub trait LevelFormatter: Send + Sync {
    /// Sequence emitted before the color string. Empty by default.
    fn color_escape(&self) -> &str {
        ""
    }

    /// Sequence emitted after the colored section. Empty by default.
    fn color_reset(&self) -> &str {
        ""
    }

    /// Color token for `level`. Emoji by default.
    fn color_string(&self, level: Level) -> &str {
        emoji(level)
    }

    /// Label for `level`. The upper case level name by default.
    fn label_string(&self, level: Level) -> &str {
        level.label()
    }
}

/// Emoji labels, no escape sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLevelFormatter;

impl LevelFormatter for PlainLevelFormatter {}

/// Terminal 256-color escape codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiLevelFormatter;

impl LevelFormatter for AnsiLevelFormatter {
    fn color_escape(&self) -> &str {
        ANSI_COLOR_ESCAPE
    }

    fn color_reset(&self) -> &str {
        ANSI_COLOR_RESET
    }

    fn color_string(&self, level: Level) -> &str {
        ansi_color_code(level)
    }
}

pub(crate) fn emoji(level: Level) -> &'static str {
    match level {
        Level::Verbose => "📓",
        Level::Debug => "📗",
        Level::Info => "📘",
        Level::Warning => "📒",
        Level::Error => "📕",
    }
}

pub(crate) fn ansi_color_code(level: Level) -> &'static str {
    match level {
        Level::Verbose => "251m",
        Level::Debug => "35m",
        Level::Info => "38m",
        Level::Warning => "178m",
        Level::Error => "197m",
    }
}
