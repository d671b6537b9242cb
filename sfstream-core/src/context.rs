//! # Handler Contexts and Extractors
//!
//! What a handler is told about the event it is processing, and the
//! extractor pattern that lets a handler declare only the parts it needs.
//!
//! # Contexts
//!
//! - [`EventContext`]: an event inside a collected block, with its lifecycle
//!   flags and counters.
//! - [`ErrorContext`]: an event whose pass/fail handler failed, with the error.
//!
//! # Extractors
//!
//! [`bind`] wraps a function whose arguments implement [`FromContext`]; each
//! argument is extracted from the context before the call:
//!
//! ```rust,ignore
//! let mark = bind(|event: Event, Last(last): Last| {
//!     event.derive_with("is_last", last)
//! });
//! collector.for_each_event(mark);
//! ```
//!
//! Functions of zero to six extractor arguments are supported.

use crate::{
    error::BoxError,
    event::Event,
    handler::Handler,
    response::{FilteredValue, IntoFiltered},
};
use std::marker::PhantomData;

bitflags::bitflags! {
    /// Where an event sits inside its block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Position: u8 {
        /// The block's first event.
        const FIRST = 1;
        /// The block's last event.
        const LAST = 1 << 1;
    }
}

/// An event inside a collected block.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// The event being handled.
    pub event: Event,
    /// Zero-based position within the block.
    pub index: usize,
    /// Set on the block's first event.
    pub first: bool,
    /// Set when the event matched the block's end predicate, or when the
    /// stream ran out after it.
    pub last: bool,
    /// Zero-based ordinal of the block among all blocks of the collector.
    pub block: usize,
}

impl EventContext {
    /// The `first` and `last` flags as a set.
    pub fn position(&self) -> Position {
        let mut position = Position::empty();
        position.set(Position::FIRST, self.first);
        position.set(Position::LAST, self.last);
        position
    }
}

/// An event whose handler failed.
#[derive(Debug)]
pub struct ErrorContext {
    /// The event whose handler failed.
    pub event: Event,
    error: Option<BoxError>,
}

impl ErrorContext {
    /// Pair `event` with the `error` its handler returned.
    pub fn new(event: Event, error: BoxError) -> Self {
        Self {
            event,
            error: Some(error),
        }
    }

    /// The error, unless an extractor already took it.
    pub fn error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.error.as_deref()
    }

    /// The error, or a placeholder if an extractor already took it.
    pub fn into_error(mut self) -> BoxError {
        take_error(&mut self)
    }

    /// The event and the error.
    pub fn into_parts(mut self) -> (Event, BoxError) {
        let error = take_error(&mut self);
        (self.event, error)
    }
}

fn take_error(ctx: &mut ErrorContext) -> BoxError {
    ctx.error
        .take()
        .unwrap_or_else(|| "error already extracted".into())
}

// ============================================================================
// Extraction
// ============================================================================

/// Extract `Self` from a handler context.
///
/// Extraction is infallible: every extractor is defined for every context it
/// implements this trait for.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be extracted from `{C}`",
    label = "missing `FromContext` implementation",
    note = "Implement `FromContext<{C}>` to use this type as a handler argument."
)]
pub trait FromContext<C>: Sized {
    /// Extract the value from `ctx`.
    fn from_context(ctx: &mut C) -> Self;
}

/// Zero-based position within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index(pub usize);

/// Whether this is the block's first event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct First(pub bool);

/// Whether this is the block's last event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Last(pub bool);

/// Zero-based ordinal of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIndex(pub usize);

impl FromContext<EventContext> for Event {
    fn from_context(ctx: &mut EventContext) -> Self {
        ctx.event.clone()
    }
}

impl FromContext<EventContext> for EventContext {
    fn from_context(ctx: &mut EventContext) -> Self {
        ctx.clone()
    }
}

impl FromContext<EventContext> for Index {
    fn from_context(ctx: &mut EventContext) -> Self {
        Index(ctx.index)
    }
}

impl FromContext<EventContext> for First {
    fn from_context(ctx: &mut EventContext) -> Self {
        First(ctx.first)
    }
}

impl FromContext<EventContext> for Last {
    fn from_context(ctx: &mut EventContext) -> Self {
        Last(ctx.last)
    }
}

impl FromContext<EventContext> for BlockIndex {
    fn from_context(ctx: &mut EventContext) -> Self {
        BlockIndex(ctx.block)
    }
}

impl FromContext<EventContext> for Position {
    fn from_context(ctx: &mut EventContext) -> Self {
        ctx.position()
    }
}

impl FromContext<ErrorContext> for Event {
    fn from_context(ctx: &mut ErrorContext) -> Self {
        ctx.event.clone()
    }
}

/// Takes the error out of the context. A second extraction in the same call
/// yields a placeholder error.
impl FromContext<ErrorContext> for BoxError {
    fn from_context(ctx: &mut ErrorContext) -> Self {
        take_error(ctx)
    }
}

// ============================================================================
// Handler Integration
// ============================================================================

/// A handler that extracts its arguments from the context.
///
/// Built by [`bind`]. `Args` is the tuple of argument types and is inferred
/// from the wrapped function.
pub struct Bind<F, Args> {
    func: F,
    _marker: PhantomData<fn() -> Args>,
}

/// Wrap a function of extractor arguments as a [`Handler`].
pub fn bind<F, Args>(func: F) -> Bind<F, Args> {
    Bind {
        func,
        _marker: PhantomData,
    }
}

impl<F: Clone, Args> Clone for Bind<F, Args> {
    fn clone(&self) -> Self {
        bind(self.func.clone())
    }
}

macro_rules! impl_bind {
    ($($T:ident),*) => {
        impl<C, F, R, $($T,)*> Handler<C> for Bind<F, ($($T,)*)>
        where
            $($T: FromContext<C>,)*
            F: FnMut($($T,)*) -> R,
            R: IntoFiltered,
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(&mut self, mut input: C) -> Result<FilteredValue, BoxError> {
                $(
                    let $T = $T::from_context(&mut input);
                )*
                (self.func)($($T,)*).into_filtered()
            }
        }
    };
}

impl_bind!();
impl_bind!(T1);
impl_bind!(T1, T2);
impl_bind!(T1, T2, T3);
impl_bind!(T1, T2, T3, T4);
impl_bind!(T1, T2, T3, T4, T5);
impl_bind!(T1, T2, T3, T4, T5, T6);
