//! The `Formatting` witness: a reusable rule that appends some projection
//! of a [`LogItem`] to an output accumulator.
//!
//! Witnesses form a monoid under [`Formatting::concat`] with
//! [`Formatting::empty`] as identity:
//!
//! ```text
//! empty.concat(w)            == w == w.concat(empty)
//! a.concat(b).concat(c)      == a.concat(b.concat(c))
//! ```
//!
//! so a sequence of witnesses can be reduced in any association order and
//! still append the same output.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::sync::Arc;

use crate::error::FormatError;
use crate::item::LogItem;

/// An output accumulator a witness can append to.
pub trait Output: Default + Send + Sync + 'static {
    /// Appends `other` to the end of `self`.
    fn append(&mut self, other: &Self);
}

impl Output for String {
    fn append(&mut self, other: &Self) {
        self.push_str(other);
    }
}

impl Output for Vec<u8> {
    fn append(&mut self, other: &Self) {
        self.extend_from_slice(other);
    }
}

type FormatFn<O> = dyn Fn(&LogItem, &mut O) -> Result<(), FormatError> + Send + Sync;

/// A stateless, composable formatting rule.
///
/// Cloning is cheap (the rule is shared) and applying a witness never
/// mutates it, so one witness can format any number of items concurrently.
pub struct Formatting<O> {
    format: Arc<FormatFn<O>>,
    identity: bool,
}

impl<O> Clone for Formatting<O> {
    fn clone(&self) -> Self {
        Self {
            format: Arc::clone(&self.format),
            identity: self.identity,
        }
    }
}

impl<O> fmt::Debug for Formatting<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatting")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl<O: Output> Formatting<O> {
    /// Create a witness from an appending closure.
    pub fn new<F>(format: F) -> Self
    where
        F: Fn(&LogItem, &mut O) -> Result<(), FormatError> + Send + Sync + 'static,
    {
        Self {
            format: Arc::new(format),
            identity: false,
        }
    }

    /// The identity witness: appends nothing.
    pub fn empty() -> Self {
        Self {
            format: Arc::new(|_: &LogItem, _: &mut O| Ok::<(), FormatError>(())),
            identity: true,
        }
    }

    /// Appends a constant, ignoring the item.
    pub fn value(value: O) -> Self {
        Self::new(move |_, output| {
            output.append(&value);
            Ok(())
        })
    }

    /// Appends a projection of the item.
    pub fn property<F>(project: F) -> Self
    where
        F: Fn(&LogItem) -> O + Send + Sync + 'static,
    {
        Self::new(move |item, output| {
            output.append(&project(item));
            Ok(())
        })
    }

    /// Appends a fallible projection of the item.
    pub fn try_property<F>(project: F) -> Self
    where
        F: Fn(&LogItem) -> Result<O, FormatError> + Send + Sync + 'static,
    {
        Self::new(move |item, output| {
            output.append(&project(item)?);
            Ok(())
        })
    }

    /// Whether this is the identity witness.
    pub fn is_empty(&self) -> bool {
        self.identity
    }

    /// Appends this witness's output for `item` to `output`.
    ///
    /// On error, `output` may hold a partial result; callers must discard
    /// it. [`format_item`](Self::format_item) does that for you.
    pub fn apply(&self, item: &LogItem, output: &mut O) -> Result<(), FormatError> {
        (self.format)(item, output)
    }

    /// Formats `item` into a fresh output value.
    pub fn format_item(&self, item: &LogItem) -> Result<O, FormatError> {
        let mut output = O::default();
        self.apply(item, &mut output)?;
        Ok(output)
    }

    /// Sequential composition: `self`'s output followed by `next`'s.
    pub fn concat(self, next: Self) -> Self {
        if self.identity {
            return next;
        }
        if next.identity {
            return self;
        }

        let (first, second) = (self.format, next.format);
        Self::new(move |item, output| {
            first(item, output)?;
            second(item, output)
        })
    }

    /// Post-processes this witness's output before appending it.
    pub fn map<F>(self, transform: F) -> Self
    where
        F: Fn(&mut O) + Send + Sync + 'static,
    {
        self.try_map(move |output| {
            transform(output);
            Ok(())
        })
    }

    /// Fallible variant of [`map`](Self::map).
    pub fn try_map<F>(self, transform: F) -> Self
    where
        F: Fn(&mut O) -> Result<(), FormatError> + Send + Sync + 'static,
    {
        let upstream = self.format;
        Self::new(move |item, output| {
            let mut scratch = O::default();
            upstream(item, &mut scratch)?;
            transform(&mut scratch)?;
            output.append(&scratch);
            Ok(())
        })
    }
}

impl<O: Output> Default for Formatting<O> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<O: Output> Add for Formatting<O> {
    type Output = Formatting<O>;

    fn add(self, rhs: Self) -> Self::Output {
        self.concat(rhs)
    }
}

impl<O: Output> AddAssign for Formatting<O> {
    fn add_assign(&mut self, rhs: Self) {
        let lhs = std::mem::take(self);
        *self = lhs.concat(rhs);
    }
}

impl<O: Output> FromIterator<Formatting<O>> for Formatting<O> {
    fn from_iter<I: IntoIterator<Item = Formatting<O>>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::concat)
    }
}

impl<O: Output> Sum for Formatting<O> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.collect()
    }
}
