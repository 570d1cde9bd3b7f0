//! Composable log item formatting.
//!
//! - [`formatting`]: the [`Formatting`] witness and its monoid algebra
//! - [`builder`]: declarative composition of witnesses ([`FormattingBuilder`], [`formatting!`](crate::formatting))
//! - [`components`]: witnesses for item fields, groups and string maps

pub mod builder;
pub mod components;
pub mod formatting;

pub use builder::{Either, FormattingBuilder};
pub use components::Group;
pub use formatting::{Formatting, Output};
