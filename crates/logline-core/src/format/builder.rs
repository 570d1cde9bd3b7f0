//! Declarative composition of formatting witnesses.
//!
//! A format is declared as an ordered list of expressions, each of which
//! converts into a [`Formatting`]:
//!
//! - a witness (or anything building one, like the [components](super::components))
//! - a literal output value (`"|"` for strings, `b"|"` for bytes), which
//!   becomes a constant witness
//! - an `Option` of a witness, which contributes nothing when `None`
//! - an [`Either`] choosing exactly one of two branches
//! - a `Vec` of witnesses, reduced in sequence order
//!
//! The builder folds them with [`Formatting::concat`] in written order.
//!
//! ```ignore
//! use logline_core::format::components::{level, message};
//! use logline_core::formatting;
//!
//! let witness = formatting![level(), " ", message()];
//! ```

use super::formatting::{Formatting, Output};

/// Two mutually exclusive branches of a format expression.
#[derive(Debug, Clone)]
pub enum Either<A, B = A> {
    First(A),
    Second(B),
}

impl<A, B> Either<A, B> {
    /// Picks `first` when `condition` holds, `second` otherwise.
    pub fn when(condition: bool, first: A, second: B) -> Self {
        if condition {
            Either::First(first)
        } else {
            Either::Second(second)
        }
    }
}

impl<O, A, B> From<Either<A, B>> for Formatting<O>
where
    O: Output,
    A: Into<Formatting<O>>,
    B: Into<Formatting<O>>,
{
    fn from(either: Either<A, B>) -> Self {
        match either {
            Either::First(first) => first.into(),
            Either::Second(second) => second.into(),
        }
    }
}

impl<O: Output> From<Option<Formatting<O>>> for Formatting<O> {
    fn from(formatting: Option<Formatting<O>>) -> Self {
        formatting.unwrap_or_default()
    }
}

impl<O: Output> From<Vec<Formatting<O>>> for Formatting<O> {
    fn from(formattings: Vec<Formatting<O>>) -> Self {
        formattings.into_iter().collect()
    }
}

impl From<&str> for Formatting<String> {
    fn from(value: &str) -> Self {
        Formatting::value(value.to_string())
    }
}

impl From<String> for Formatting<String> {
    fn from(value: String) -> Self {
        Formatting::value(value)
    }
}

impl From<char> for Formatting<String> {
    fn from(value: char) -> Self {
        Formatting::value(value.to_string())
    }
}

impl From<&[u8]> for Formatting<Vec<u8>> {
    fn from(value: &[u8]) -> Self {
        Formatting::value(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Formatting<Vec<u8>> {
    fn from(value: &[u8; N]) -> Self {
        Formatting::value(value.to_vec())
    }
}

impl From<Vec<u8>> for Formatting<Vec<u8>> {
    fn from(value: Vec<u8>) -> Self {
        Formatting::value(value)
    }
}

/// Accumulates format expressions and reduces them to one witness.
#[derive(Debug, Clone)]
pub struct FormattingBuilder<O: Output> {
    parts: Vec<Formatting<O>>,
}

impl<O: Output> Default for FormattingBuilder<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Output> FormattingBuilder<O> {
    /// A builder with no expressions; it builds the empty witness.
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Appends an expression.
    pub fn push(mut self, expr: impl Into<Formatting<O>>) -> Self {
        self.parts.push(expr.into());
        self
    }

    /// Appends an expression only when present.
    pub fn push_opt<E: Into<Formatting<O>>>(self, expr: Option<E>) -> Self {
        match expr {
            Some(expr) => self.push(expr),
            None => self,
        }
    }

    /// Appends whichever branch `either` holds.
    pub fn push_either<A, B>(self, either: Either<A, B>) -> Self
    where
        A: Into<Formatting<O>>,
        B: Into<Formatting<O>>,
    {
        self.push(either)
    }

    /// Appends `first` when `condition` holds, `second` otherwise.
    pub fn push_if(
        self,
        condition: bool,
        first: impl Into<Formatting<O>>,
        second: impl Into<Formatting<O>>,
    ) -> Self {
        self.push(Either::when(condition, first.into(), second.into()))
    }

    /// Appends every expression of `exprs`, in iteration order.
    pub fn extend<E, I>(mut self, exprs: I) -> Self
    where
        E: Into<Formatting<O>>,
        I: IntoIterator<Item = E>,
    {
        self.parts.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// Number of expressions pushed so far.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Reduces the declared expressions, in order, to a single witness.
    pub fn build(self) -> Formatting<O> {
        self.parts.into_iter().collect()
    }
}

/// Builds a witness from a comma separated list of format expressions.
///
/// ```ignore
/// let witness: Formatting<String> = formatting!["[", thread(), "] ", message()];
/// ```
#[macro_export]
macro_rules! formatting {
    () => {
        $crate::format::Formatting::empty()
    };
    ($($expr:expr),+ $(,)?) => {
        $crate::format::FormattingBuilder::new()
            $(.push($expr))+
            .build()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Location, LogItem};
    use crate::level::Level;

    fn item() -> LogItem {
        LogItem::new(Level::Debug, "body", Location::new("lib.rs", "main", 3))
    }

    fn message() -> Formatting<String> {
        Formatting::property(|i: &LogItem| i.message().to_string())
    }

    #[test]
    fn test_sequence_preserves_order() {
        let witness = FormattingBuilder::new().push("A").push("B").push("C").build();
        assert_eq!(witness.format_item(&item()).unwrap(), "ABC");
    }

    #[test]
    fn test_optional_expression() {
        let absent: Option<&str> = None;
        let witness = FormattingBuilder::new()
            .push("<")
            .push_opt(absent)
            .push_opt(Some(message()))
            .push(">")
            .build();
        assert_eq!(witness.format_item(&item()).unwrap(), "<body>");
    }

    #[test]
    fn test_either_picks_one_branch() {
        let first = FormattingBuilder::new().push_if(true, "yes", "no").build();
        let second = FormattingBuilder::new().push_if(false, "yes", "no").build();
        assert_eq!(first.format_item(&item()).unwrap(), "yes");
        assert_eq!(second.format_item(&item()).unwrap(), "no");

        let detailed = false;
        let witness: Formatting<String> = FormattingBuilder::new()
            .push_either(Either::when(detailed, message().uppercased(), message()))
            .build();
        assert_eq!(witness.format_item(&item()).unwrap(), "body");
    }

    #[test]
    fn test_array_expression() {
        let parts: Vec<Formatting<String>> = vec!["1".into(), "2".into(), "3".into()];
        let witness = FormattingBuilder::new().push("[").push(parts).push("]").build();
        assert_eq!(witness.format_item(&item()).unwrap(), "[123]");
    }

    #[test]
    fn test_extend() {
        let witness = FormattingBuilder::new().extend(["x", "y", "z"]).build();
        assert_eq!(witness.format_item(&item()).unwrap(), "xyz");
    }

    #[test]
    fn test_empty_builder_is_identity() {
        let builder = FormattingBuilder::<String>::new();
        assert!(builder.is_empty());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_macro() {
        let witness: Formatting<String> = crate::formatting!["(", message(), ')'];
        assert_eq!(witness.format_item(&item()).unwrap(), "(body)");

        let empty: Formatting<String> = crate::formatting![];
        assert_eq!(empty.format_item(&item()).unwrap(), "");
    }

    #[test]
    fn test_byte_literals() {
        let witness: Formatting<Vec<u8>> = crate::formatting![b"<", b">".as_slice()];
        assert_eq!(witness.format_item(&item()).unwrap(), b"<>".to_vec());
    }
}
