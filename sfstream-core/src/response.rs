//! Handler output conversion.

use crate::{
    error::BoxError,
    event::{Derived, Event},
};
use std::{iter::Chain, option, vec};

/// What a handler emits for one input: nothing, one event, or a finite
/// sequence. Flattened into the output stream in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilteredValue {
    /// No events.
    #[default]
    Empty,
    /// A single event.
    One(Event),
    /// A sequence of events.
    Many(Vec<Event>),
}

impl FilteredValue {
    /// Number of events emitted.
    pub fn len(&self) -> usize {
        match self {
            FilteredValue::Empty => 0,
            FilteredValue::One(_) => 1,
            FilteredValue::Many(events) => events.len(),
        }
    }

    /// Whether nothing is emitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for FilteredValue {
    type Item = Event;
    type IntoIter = Chain<option::IntoIter<Event>, vec::IntoIter<Event>>;

    fn into_iter(self) -> Self::IntoIter {
        let (one, many) = match self {
            FilteredValue::Empty => (None, Vec::new()),
            FilteredValue::One(event) => (Some(event), Vec::new()),
            FilteredValue::Many(events) => (None, events),
        };
        one.into_iter().chain(many)
    }
}

/// Trait for converting a handler's output into a [`FilteredValue`].
///
/// # Default Implementations
///
/// - `()` → nothing
/// - `Event` / `Derived` → one event
/// - `Option<Event>` → one event or nothing
/// - `Vec<Event>` / `[Event; N]` → the sequence
/// - `Result<T, E>` → delegates to `T` or reports the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be emitted by a handler",
    label = "missing `IntoFiltered` implementation",
    note = "Handlers return `()`, an `Event`, `Option<Event>`, `Vec<Event>` or a `Result` of those."
)]
pub trait IntoFiltered {
    /// Convert, or report the handler's error.
    fn into_filtered(self) -> Result<FilteredValue, BoxError>;
}

impl IntoFiltered for FilteredValue {
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        Ok(self)
    }
}

impl IntoFiltered for () {
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::Empty)
    }
}

impl IntoFiltered for Event {
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::One(self))
    }
}

impl IntoFiltered for Derived {
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::One(self.finish()))
    }
}

impl IntoFiltered for Option<Event> {
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        Ok(self.map_or(FilteredValue::Empty, FilteredValue::One))
    }
}

impl IntoFiltered for Vec<Event> {
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::Many(self))
    }
}

impl<const N: usize> IntoFiltered for [Event; N] {
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::Many(self.into()))
    }
}

impl<T, E> IntoFiltered for Result<T, E>
where
    T: IntoFiltered,
    E: Into<BoxError>,
{
    fn into_filtered(self) -> Result<FilteredValue, BoxError> {
        match self {
            Ok(t) => t.into_filtered(),
            Err(e) => Err(e.into()),
        }
    }
}
