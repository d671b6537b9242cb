//! Error types for sfstream.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`StreamError`] - Errors carried through an event stream as `Err` items
//! - [`EventError`] - Malformed events (missing required properties)
//! - [`CompletionError`] - Reading a completion result too early

use crate::event::EventKind;
use thiserror::Error;

/// A boxed error type for handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that travel down an event stream.
///
/// Every stage forwards these untouched; the producing stage ends after
/// yielding one.
#[derive(Error, Debug)]
pub enum StreamError {
    /// A handler failed and the error policy re-raised it.
    #[error("handler error: {0}")]
    Handler(#[source] BoxError),

    /// The stream did not have the shape a stage requires.
    #[error("expected {expected} event, found {found}")]
    UnexpectedEvent {
        /// What the stage required.
        expected: &'static str,
        /// The kind that was actually seen.
        found: EventKind,
    },

    /// The stream ended before a block's end predicate matched.
    #[error("stream ended inside an unterminated block after {collected} events")]
    UnterminatedBlock {
        /// Number of block events delivered before the stream ended.
        collected: usize,
    },

    /// An event could not be constructed.
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Errors raised while constructing events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A property that the kind requires was not supplied.
    #[error("{kind} events require a `{property}` property")]
    MissingProperty {
        /// The kind being built.
        kind: EventKind,
        /// The missing property name.
        property: &'static str,
    },
}

/// Errors reading the result of a lazily produced sequence.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionError {
    /// The sequence has not been fully consumed yet.
    #[error("result requested before the sequence was fully consumed")]
    Pending,

    /// The sequence finished without signalling a result.
    #[error("sequence finished without a result")]
    NoResult,
}

impl StreamError {
    /// Wrap any error as a re-raised handler error.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        StreamError::Handler(err.into())
    }
}

// Convenience conversions
impl From<BoxError> for StreamError {
    fn from(err: BoxError) -> Self {
        StreamError::Handler(err)
    }
}
