//! # sfstream - Stream Transformation Engine
//!
//! `sfstream` reshapes lazy streams of typed events. Sources turn tables and
//! markup into [`Event`]s; filters and collectors transform the stream one
//! event or one delimited block at a time. Nothing is buffered beyond the
//! block being delivered.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sfstream::prelude::*;
//!
//! // Drop every event the check rejects
//! let only_cells = streamfilter(PassEvent).check(type_check([EventKind::Cell]));
//!
//! // Promote the first row of each table to column headers
//! let out: Vec<_> = events(source)
//!     .pipe(promote_first_row())
//!     .pipe(only_cells)
//!     .collect();
//! ```
//!
//! ## Collecting blocks
//!
//! ```rust,ignore
//! use sfstream::prelude::*;
//!
//! let rows = Collector::new(block_check(EventKind::StartRow))
//!     .iterations(2)
//!     .for_each_event(bind(|event: Event, Index(i): Index, Last(last): Last| {
//!         event.derive().with("i", i).with("last", last).finish()
//!     }));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use sfstream_core::{
    // Stream primitives
    ConditionalWrapper,
    EventResult,
    EventStream,
    IntoEvents,
    Remainder,
    SharedStream,
    UntilMatch,
    conditional_wrapper,
    events,
    first_then_rest,
    until_match,
    // Events
    Derived,
    Event,
    EventBuilder,
    EventKind,
    SOURCE,
    Value,
    // Checks
    AllOf,
    Always,
    And,
    AnyOf,
    BlockEnd,
    BoxBlockEnd,
    BoxCheck,
    CollectorCheck,
    EventCheck,
    Never,
    Not,
    Or,
    PropertyCheck,
    StartEnd,
    TypeCheck,
    always,
    and_check,
    collector_check,
    never,
    or_check,
    property_check,
    type_check,
    // Filter engine
    EventStreamExt,
    FilterSpec,
    FilterStream,
    StreamFilter,
    Then,
    filter_stream,
    streamfilter,
    // Handlers and responses
    BlockEvent,
    FilteredValue,
    Handler,
    IgnoreError,
    IntoFiltered,
    PassEvent,
    RaiseError,
    SkipError,
    // Block matcher
    BlockCheck,
    BlockMatcher,
    BlockState,
    block_check,
    // Collector engine
    Collecting,
    Collector,
    CollectorOptions,
    Delivery,
    EventCursor,
    ForEachEvent,
    ForEachSegment,
    PartialBlock,
    Segment,
    // Context binding
    Bind,
    BlockIndex,
    ErrorContext,
    EventContext,
    First,
    FromContext,
    Index,
    Last,
    Position,
    bind,
    // Completion
    Completing,
    CompletionHandle,
    Emit,
    completion,
    // Error types
    BoxError,
    CompletionError,
    EventError,
    StreamError,
};

pub use sfstream_std::{
    HeaderRow, LoggingStage, element_end, header_wrapper, promote_first_row, xml_collector,
    xml_region,
};

/// Ready-made filters.
pub mod filters {
    pub use sfstream_std::filters::{column_headers, xml};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use sfstream_std::testing::*;
}

/// Prelude module - common imports for sfstream.
///
/// # Usage
///
/// ```rust,ignore
/// use sfstream::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Context binding
        BlockIndex,
        // Errors
        BoxError,
        // Collectors
        Collector,
        CollectorCheck,
        // Events
        Event,
        // Core traits
        EventCheck,
        EventContext,
        EventKind,
        EventResult,
        EventStream,
        EventStreamExt,
        First,
        FilteredValue,
        Handler,
        Index,
        Last,
        PartialBlock,
        PassEvent,
        StreamError,
        StreamFilter,
        Value,
        bind,
        block_check,
        collector_check,
        events,
        promote_first_row,
        property_check,
        streamfilter,
        type_check,
    };
}
