//! # sfstream-core
//!
//! The stream transformation engine: typed events, checks, and the filter and
//! collector engines that reshape a lazy event stream.
//!
//! This crate has minimal dependencies and is meant to be imported by code
//! that builds its own filters without the `sfstream-std` building blocks.
//!
//! # Layers
//!
//! Leaves first; every layer only uses the ones above it.
//!
//! ## Events ([`Event`])
//!
//! An immutable kind plus an ordered property map. Events are derived, never
//! mutated: [`Event::derive`] copies the properties and records the source.
//!
//! ## Checks ([`EventCheck`], [`CollectorCheck`])
//!
//! Predicates over events, composed with `and` / `or` / `not`. A
//! [`CollectorCheck`] additionally decides where a block starts and hands out
//! the predicate that finds its end.
//!
//! ## Stream primitives
//!
//! [`SharedStream`], [`first_then_rest`], [`conditional_wrapper`] and
//! [`until_match`]: lookahead without buffering the stream.
//!
//! ## Filter engine ([`filter_stream`], [`StreamFilter`])
//!
//! Per-event dispatch to pass, fail and error [`Handler`]s. Each handler emits
//! zero, one or many events.
//!
//! ## Block matcher ([`BlockMatcher`], [`block_check`])
//!
//! Depth tracking for nested start/end pairs.
//!
//! ## Collector engine ([`Collector`])
//!
//! Partitions a stream into pass-through spans and delimited blocks, and
//! routes each block to a handler, whole or event by event.
//!
//! ## Context binding ([`bind`], [`completion`])
//!
//! Handlers declare the context values they want as extractor arguments.
//!
//! # Error Types
//!
//! - [`StreamError`] - Errors carried through a stream as `Err` items
//! - [`EventError`] - Malformed events
//! - [`CompletionError`] - Completion results read too early

#![warn(missing_docs)]
#![deny(clippy::wildcard_imports)]

mod block;
mod check;
mod collector;
mod completion;
mod context;
mod error;
mod event;
mod filter;
mod handler;
mod response;
mod stream;

// Re-exports
pub use block::{BlockCheck, BlockMatcher, BlockState, block_check};
pub use check::{
    AllOf, Always, And, AnyOf, BlockEnd, BoxBlockEnd, BoxCheck, CollectorCheck, EventCheck, Never,
    Not, Or, PropertyCheck, StartEnd, TypeCheck, always, and_check, collector_check, never,
    or_check, property_check, type_check,
};
pub use collector::{
    Collecting, Collector, CollectorOptions, Delivery, EventCursor, ForEachEvent, ForEachSegment,
    PartialBlock, Segment,
};
pub use completion::{Completing, CompletionHandle, Emit, completion};
pub use context::{
    Bind, BlockIndex, ErrorContext, EventContext, First, FromContext, Index, Last, Position, bind,
};
pub use error::{BoxError, CompletionError, EventError, StreamError};
pub use event::{Derived, Event, EventBuilder, EventKind, SOURCE, Value};
pub use filter::{
    EventStreamExt, FilterSpec, FilterStream, StreamFilter, Then, filter_stream, streamfilter,
};
pub use handler::{BlockEvent, Handler, IgnoreError, PassEvent, RaiseError, SkipError};
pub use response::{FilteredValue, IntoFiltered};
pub use stream::{
    ConditionalWrapper, EventResult, EventStream, IntoEvents, Remainder, SharedStream, UntilMatch,
    conditional_wrapper, events, first_then_rest, until_match,
};
