//! # Filter Engine
//!
//! Pass/fail/error dispatch over an event stream, and the [`StreamFilter`]
//! abstraction that composes stream transformations.
//!
//! For every event, the check picks the pass or the fail handler. If that
//! handler fails, the error handler receives the event and the error. Each
//! handler's [`FilteredValue`] is flattened into the output in order.
//!
//! ```rust,ignore
//! let out = filter_stream(source)
//!     .check(type_check([EventKind::Cell]))
//!     .on_pass(|event: Event| event.derive_with("seen", true))
//!     .on_fail(PassEvent)
//!     .on_error(SkipError);
//! ```
//!
//! [`FilteredValue`]: crate::FilteredValue

use crate::{
    check::{Always, EventCheck},
    context::ErrorContext,
    error::StreamError,
    event::Event,
    handler::{BlockEvent, Handler, PassEvent, RaiseError},
    stream::{EventResult, EventStream},
};
use std::collections::VecDeque;

// ============================================================================
// StreamFilter
// ============================================================================

/// A reusable transformation of an event stream.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `StreamFilter`",
    label = "missing `StreamFilter` implementation",
    note = "Use `streamfilter(..)`, a `Collector`, or a closure `FnOnce(EventStream) -> EventStream`."
)]
pub trait StreamFilter<'a> {
    /// Transform `stream`.
    fn apply(self, stream: EventStream<'a>) -> EventStream<'a>;

    /// Feeds this filter's output into `next`.
    fn then<B>(self, next: B) -> Then<Self, B>
    where
        Self: Sized,
        B: StreamFilter<'a>,
    {
        Then {
            first: self,
            second: next,
        }
    }
}

impl<'a, F> StreamFilter<'a> for F
where
    F: FnOnce(EventStream<'a>) -> EventStream<'a>,
{
    fn apply(self, stream: EventStream<'a>) -> EventStream<'a> {
        (self)(stream)
    }
}

/// Two filters applied one after the other.
#[derive(Debug, Clone)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<'a, A, B> StreamFilter<'a> for Then<A, B>
where
    A: StreamFilter<'a>,
    B: StreamFilter<'a>,
{
    fn apply(self, stream: EventStream<'a>) -> EventStream<'a> {
        self.second.apply(self.first.apply(stream))
    }
}

/// Applies filters to any stream of event results.
pub trait EventStreamExt<'a>: Iterator<Item = EventResult> + Sized + 'a {
    /// Run this stream through `filter`.
    fn pipe<F>(self, filter: F) -> EventStream<'a>
    where
        F: StreamFilter<'a>,
    {
        filter.apply(Box::new(self))
    }
}

impl<'a, I> EventStreamExt<'a> for I where I: Iterator<Item = EventResult> + 'a {}

// ============================================================================
// FilterSpec
// ============================================================================

/// A filter definition that is not yet bound to a stream.
///
/// Built by [`streamfilter`]; becomes a [`FilterStream`] when applied.
#[derive(Debug, Clone)]
pub struct FilterSpec<C, P, F, E> {
    check: C,
    on_pass: P,
    on_fail: F,
    on_error: E,
}

impl Default for FilterSpec<Always, PassEvent, BlockEvent, RaiseError> {
    fn default() -> Self {
        Self {
            check: Always,
            on_pass: PassEvent,
            on_fail: BlockEvent,
            on_error: RaiseError,
        }
    }
}

/// Define a filter around a pass handler.
///
/// The check defaults to always true, so by default every event goes through
/// `on_pass`.
pub fn streamfilter<P>(on_pass: P) -> FilterSpec<Always, P, BlockEvent, RaiseError>
where
    P: Handler<Event>,
{
    FilterSpec::default().on_pass(on_pass)
}

impl<C, P, F, E> FilterSpec<C, P, F, E> {
    /// Replace the check that routes events to `on_pass` or `on_fail`.
    pub fn check<C2>(self, check: C2) -> FilterSpec<C2, P, F, E>
    where
        C2: EventCheck,
    {
        FilterSpec {
            check,
            on_pass: self.on_pass,
            on_fail: self.on_fail,
            on_error: self.on_error,
        }
    }

    /// Handler for events the check matches.
    pub fn on_pass<P2>(self, on_pass: P2) -> FilterSpec<C, P2, F, E>
    where
        P2: Handler<Event>,
    {
        FilterSpec {
            check: self.check,
            on_pass,
            on_fail: self.on_fail,
            on_error: self.on_error,
        }
    }

    /// Handler for events the check rejects. Drops them by default.
    pub fn on_fail<F2>(self, on_fail: F2) -> FilterSpec<C, P, F2, E>
    where
        F2: Handler<Event>,
    {
        FilterSpec {
            check: self.check,
            on_pass: self.on_pass,
            on_fail,
            on_error: self.on_error,
        }
    }

    /// Handler for pass or fail handler errors. Re-raises by default.
    pub fn on_error<E2>(self, on_error: E2) -> FilterSpec<C, P, F, E2>
    where
        E2: Handler<ErrorContext>,
    {
        FilterSpec {
            check: self.check,
            on_pass: self.on_pass,
            on_fail: self.on_fail,
            on_error,
        }
    }

    /// Bind the filter to a source.
    pub fn filter<I>(self, source: I) -> FilterStream<I::IntoIter, C, P, F, E>
    where
        I: IntoIterator<Item = EventResult>,
    {
        FilterStream {
            source: source.into_iter(),
            spec: self,
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl<'a, C, P, F, E> StreamFilter<'a> for FilterSpec<C, P, F, E>
where
    C: EventCheck + 'a,
    P: Handler<Event> + 'a,
    F: Handler<Event> + 'a,
    E: Handler<ErrorContext> + 'a,
{
    fn apply(self, stream: EventStream<'a>) -> EventStream<'a> {
        Box::new(self.filter(stream))
    }
}

// ============================================================================
// FilterStream
// ============================================================================

/// A filter bound to a source: builder and iterator in one.
pub struct FilterStream<I, C, P, F, E> {
    source: I,
    spec: FilterSpec<C, P, F, E>,
    pending: VecDeque<Event>,
    done: bool,
}

/// Start a filter over `source` with the default configuration: every event
/// passes unchanged, and handler errors end the stream.
pub fn filter_stream<I>(
    source: I,
) -> FilterStream<I::IntoIter, Always, PassEvent, BlockEvent, RaiseError>
where
    I: IntoIterator<Item = EventResult>,
{
    FilterSpec::default().filter(source)
}

impl<I, C, P, F, E> FilterStream<I, C, P, F, E> {
    fn with_spec<C2, P2, F2, E2>(
        self,
        spec: impl FnOnce(FilterSpec<C, P, F, E>) -> FilterSpec<C2, P2, F2, E2>,
    ) -> FilterStream<I, C2, P2, F2, E2> {
        FilterStream {
            source: self.source,
            spec: spec(self.spec),
            pending: self.pending,
            done: self.done,
        }
    }

    /// See [`FilterSpec::check`].
    pub fn check<C2>(self, check: C2) -> FilterStream<I, C2, P, F, E>
    where
        C2: EventCheck,
    {
        self.with_spec(|spec| spec.check(check))
    }

    /// See [`FilterSpec::on_pass`].
    pub fn on_pass<P2>(self, on_pass: P2) -> FilterStream<I, C, P2, F, E>
    where
        P2: Handler<Event>,
    {
        self.with_spec(|spec| spec.on_pass(on_pass))
    }

    /// See [`FilterSpec::on_fail`].
    pub fn on_fail<F2>(self, on_fail: F2) -> FilterStream<I, C, P, F2, E>
    where
        F2: Handler<Event>,
    {
        self.with_spec(|spec| spec.on_fail(on_fail))
    }

    /// See [`FilterSpec::on_error`].
    pub fn on_error<E2>(self, on_error: E2) -> FilterStream<I, C, P, F, E2>
    where
        E2: Handler<ErrorContext>,
    {
        self.with_spec(|spec| spec.on_error(on_error))
    }
}

impl<I, C, P, F, E> Iterator for FilterStream<I, C, P, F, E>
where
    I: Iterator<Item = EventResult>,
    C: EventCheck,
    P: Handler<Event>,
    F: Handler<Event>,
    E: Handler<ErrorContext>,
{
    type Item = EventResult;

    fn next(&mut self) -> Option<EventResult> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }

            let event = match self.source.next() {
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };

            let spec = &mut self.spec;
            let handled = if spec.check.matches(&event) {
                spec.on_pass.call(event.clone())
            } else {
                spec.on_fail.call(event.clone())
            };

            let value = match handled {
                Ok(value) => value,
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        kind = %event.kind(),
                        %error,
                        "handler failed, routing to error handler"
                    );

                    match spec.on_error.call(ErrorContext::new(event, error)) {
                        Ok(value) => value,
                        Err(error) => {
                            self.done = true;
                            return Some(Err(StreamError::Handler(error)));
                        }
                    }
                }
            };
            self.pending.extend(value);
        }
    }
}
