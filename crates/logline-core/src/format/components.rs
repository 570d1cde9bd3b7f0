//! Ready-made formatting witnesses for log item fields, grouping and
//! string post-processing.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use chrono::SecondsFormat;

use super::formatting::{Formatting, Output};
use crate::error::FormatError;
use crate::item::LogItem;
use crate::level_format::{ansi_color_code, emoji, LevelFormatter, ANSI_COLOR_ESCAPE, ANSI_COLOR_RESET};

/// The item's timestamp as RFC 3339 UTC with milliseconds,
/// e.g. `2026-01-21T14:30:45.123Z`.
pub fn timestamp() -> Formatting<String> {
    Formatting::property(|item: &LogItem| {
        item.timestamp()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    })
}

/// The item's timestamp rendered with a `strftime`-style pattern.
///
/// An invalid pattern fails formatting instead of panicking.
pub fn timestamp_with(pattern: impl Into<String>) -> Formatting<String> {
    let pattern = pattern.into();
    Formatting::new(move |item, output: &mut String| {
        write!(output, "{}", item.timestamp().format(&pattern)).map_err(|_| {
            FormatError::Transform(format!("invalid timestamp pattern {:?}", pattern))
        })
    })
}

/// The item's module, or `default` when it has none.
pub fn module(default: impl Into<String>) -> Formatting<String> {
    let default = default.into();
    Formatting::new(move |item, output: &mut String| {
        output.push_str(item.module().unwrap_or(&default));
        Ok(())
    })
}

/// The item's level name, e.g. `WARNING`.
pub fn level() -> Formatting<String> {
    Formatting::new(|item, output: &mut String| {
        output.push_str(item.level().label());
        Ok(())
    })
}

/// The item's level as an emoji.
pub fn emoji_level() -> Formatting<String> {
    Formatting::new(|item, output: &mut String| {
        output.push_str(emoji(item.level()));
        Ok(())
    })
}

/// The item's message, unchanged.
pub fn message() -> Formatting<String> {
    Formatting::new(|item, output: &mut String| {
        output.push_str(item.message());
        Ok(())
    })
}

/// The name of the thread that logged the item (`""` for the main
/// thread).
pub fn thread() -> Formatting<String> {
    Formatting::new(|item, output: &mut String| {
        output.push_str(item.thread());
        Ok(())
    })
}

/// The function that logged the item.
pub fn function() -> Formatting<String> {
    Formatting::new(|item, output: &mut String| {
        output.push_str(item.function());
        Ok(())
    })
}

/// The source line that logged the item.
pub fn line() -> Formatting<String> {
    Formatting::new(|item, output: &mut String| {
        let _ = write!(output, "{}", item.line());
        Ok(())
    })
}

/// The last path component of the item's file, optionally without its
/// extension.
pub fn file(include_extension: bool) -> Formatting<String> {
    Formatting::new(move |item, output: &mut String| {
        let path = Path::new(item.file());
        let name = if include_extension {
            path.file_name()
        } else {
            path.file_stem()
        };
        output.push_str(&name.map(|n| n.to_string_lossy()).unwrap_or_default());
        Ok(())
    })
}

/// The level color from `formatter`.
pub fn level_color(formatter: Arc<dyn LevelFormatter>) -> Formatting<String> {
    Formatting::new(move |item, output: &mut String| {
        output.push_str(formatter.color_string(item.level()));
        Ok(())
    })
}

/// The level label from `formatter`.
pub fn level_label(formatter: Arc<dyn LevelFormatter>) -> Formatting<String> {
    Formatting::new(move |item, output: &mut String| {
        output.push_str(formatter.label_string(item.level()));
        Ok(())
    })
}

/// `<escape><color><label><reset>` from `formatter`.
pub fn level_tag(formatter: Arc<dyn LevelFormatter>) -> Formatting<String> {
    Formatting::new(move |item, output: &mut String| {
        let level = item.level();
        output.push_str(formatter.color_escape());
        output.push_str(formatter.color_string(level));
        output.push_str(formatter.label_string(level));
        output.push_str(formatter.color_reset());
        Ok(())
    })
}

/// A sequence of witnesses with an optional prefix, suffix and separator
/// between elements.
#[derive(Debug, Clone)]
pub struct Group<O: Output> {
    prefix: Option<O>,
    separator: Option<O>,
    suffix: Option<O>,
    items: Vec<Formatting<O>>,
}

impl<O: Output + Clone> Group<O> {
    /// A group of `items` with no prefix, separator or suffix.
    pub fn new<E, I>(items: I) -> Self
    where
        E: Into<Formatting<O>>,
        I: IntoIterator<Item = E>,
    {
        Self {
            prefix: None,
            separator: None,
            suffix: None,
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Emitted once before the first item.
    pub fn prefix(mut self, prefix: impl Into<O>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Emitted between consecutive items.
    pub fn separator(mut self, separator: impl Into<O>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Emitted once after the last item.
    pub fn suffix(mut self, suffix: impl Into<O>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Reduce the group to a single witness.
    pub fn build(self) -> Formatting<O> {
        let separator = self.separator.map(Formatting::value).unwrap_or_default();

        let mut body = Formatting::empty();
        for (index, item) in self.items.into_iter().enumerate() {
            if index > 0 {
                body += separator.clone();
            }
            body += item;
        }

        self.prefix.map(Formatting::value).unwrap_or_default()
            + body
            + self.suffix.map(Formatting::value).unwrap_or_default()
    }
}

impl<O: Output + Clone> From<Group<O>> for Formatting<O> {
    fn from(group: Group<O>) -> Self {
        group.build()
    }
}

impl<O: Output> Formatting<O> {
    /// Surrounds this witness's output with `prefix` and `suffix`.
    pub fn wrapped(self, prefix: impl Into<O>, suffix: impl Into<O>) -> Self {
        Formatting::value(prefix.into()) + self + Formatting::value(suffix.into())
    }
}

impl Formatting<String> {
    /// Uppercases the output.
    pub fn uppercased(self) -> Self {
        self.map(|s| *s = s.to_uppercase())
    }

    /// Lowercases the output.
    pub fn lowercased(self) -> Self {
        self.map(|s| *s = s.to_lowercase())
    }

    /// Left-pads the output with `fill` up to `width` characters.
    pub fn left_padded(self, width: usize, fill: char) -> Self {
        self.map(move |s| {
            let missing = width.saturating_sub(s.chars().count());
            if missing > 0 {
                let mut padded: String = std::iter::repeat(fill).take(missing).collect();
                padded.push_str(s);
                *s = padded;
            }
        })
    }

    /// Right-pads the output with `fill` up to `width` characters.
    pub fn right_padded(self, width: usize, fill: char) -> Self {
        self.map(move |s| {
            let missing = width.saturating_sub(s.chars().count());
            s.extend(std::iter::repeat(fill).take(missing));
        })
    }

    /// Removes leading and trailing whitespace from the output.
    pub fn trimmed(self) -> Self {
        self.map(|s| {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        })
    }
}

/// Fixed ANSI terminal coloring by level, independent of any
/// [`LevelFormatter`].
pub mod ansi {
    use super::*;

    /// The 256-color foreground escape prefix, `\x1b[38;5;`.
    pub fn color_escape() -> Formatting<String> {
        Formatting::value(ANSI_COLOR_ESCAPE.to_string())
    }

    /// The attribute reset sequence, `\x1b[0m`.
    pub fn color_reset() -> Formatting<String> {
        Formatting::value(ANSI_COLOR_RESET.to_string())
    }

    /// The item's level as a 256-color code, e.g. `197m` for error.
    pub fn color_level() -> Formatting<String> {
        Formatting::new(|item, output: &mut String| {
            output.push_str(ansi_color_code(item.level()));
            Ok(())
        })
    }

    /// Colors a group of witnesses with the item's level color.
    pub fn color_group<E, I>(separator: Option<&str>, items: I) -> Formatting<String>
    where
        E: Into<Formatting<String>>,
        I: IntoIterator<Item = E>,
    {
        let mut group = Group::<String>::new(items);
        if let Some(separator) = separator {
            group = group.separator(separator);
        }
        color_escape() + color_level() + group.build() + color_reset()
    }
}
