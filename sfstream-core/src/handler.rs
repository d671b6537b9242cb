//! # Handlers
//!
//! The dispatch targets of the filter and collector engines.
//!
//! A [`Handler<In>`] turns one input into a [`FilteredValue`]. The input type
//! says what the handler is given:
//!
//! - `Event` for pass/fail handlers of the filter engine,
//! - [`ErrorContext`] for error handlers,
//! - [`EventContext`] for per-event collector handlers.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|event: Event| event.derive_with("seen", true)`
//! 2. **Struct implementation**: `impl Handler<EventContext> for MyHandler`.
//!    The struct's own fields stand in for the "owning instance" of a method
//!    handler.
//! 3. **Extractor-based**: `bind(|event: Event, Last(last): Last| ...)`, see
//!    [`bind`].
//!
//! [`ErrorContext`]: crate::ErrorContext
//! [`EventContext`]: crate::EventContext
//! [`bind`]: crate::bind

use crate::{
    context::{ErrorContext, EventContext},
    error::BoxError,
    event::Event,
    response::{FilteredValue, IntoFiltered},
};

/// A dispatch target producing zero, one or many events per input.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle input of type `{In}`",
    label = "missing `Handler<{In}>` implementation",
    note = "Closures `FnMut({In}) -> R` where `R: IntoFiltered` are handlers."
)]
pub trait Handler<In> {
    /// Handle one input.
    fn call(&mut self, input: In) -> Result<FilteredValue, BoxError>;
}

// Blanket impl for closures
impl<F, In, R> Handler<In> for F
where
    F: FnMut(In) -> R,
    R: IntoFiltered,
{
    fn call(&mut self, input: In) -> Result<FilteredValue, BoxError> {
        (self)(input).into_filtered()
    }
}

/// Emits the event unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassEvent;

impl Handler<Event> for PassEvent {
    fn call(&mut self, input: Event) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::One(input))
    }
}

impl Handler<EventContext> for PassEvent {
    fn call(&mut self, input: EventContext) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::One(input.event))
    }
}

/// Emits nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockEvent;

impl Handler<Event> for BlockEvent {
    fn call(&mut self, _input: Event) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::Empty)
    }
}

// ============================================================================
// Error policies
// ============================================================================

/// Re-raises the error; the stream fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaiseError;

impl Handler<ErrorContext> for RaiseError {
    fn call(&mut self, input: ErrorContext) -> Result<FilteredValue, BoxError> {
        Err(input.into_error())
    }
}

/// Drops the offending event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipError;

impl Handler<ErrorContext> for SkipError {
    fn call(&mut self, _input: ErrorContext) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::Empty)
    }
}

/// Passes the original event through as if nothing happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreError;

impl Handler<ErrorContext> for IgnoreError {
    fn call(&mut self, input: ErrorContext) -> Result<FilteredValue, BoxError> {
        Ok(FilteredValue::One(input.event))
    }
}
