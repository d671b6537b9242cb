#![allow(dead_code)]

use sfstream::{
    CollectorCheck, Event, EventResult, StreamError, collector_check, property_check,
    testing::values,
};

// ============================================================================
// Stream Helpers
// ============================================================================

/// Unwrap every item of a stream that is expected to be error free.
pub fn collect_ok(out: impl IntoIterator<Item = EventResult>) -> Vec<Event> {
    out.into_iter().collect::<Result<_, StreamError>>().unwrap()
}

/// The `value` properties of an error-free stream, concatenated.
pub fn text(out: impl IntoIterator<Item = EventResult>) -> String {
    values(&collect_ok(out))
}

/// Split a stream into its events and the error that ended it, if any.
pub fn split(out: impl IntoIterator<Item = EventResult>) -> (Vec<Event>, Option<StreamError>) {
    let mut events = Vec::new();
    for item in out {
        match item {
            Ok(event) => events.push(event),
            Err(err) => return (events, Some(err)),
        }
    }
    (events, None)
}

// ============================================================================
// Checks
// ============================================================================

/// Blocks from a `value == "a"` event to the next `value == end` event.
pub fn a_to(end: &'static str) -> impl CollectorCheck + Clone {
    collector_check(
        property_check([("value", "a")]),
        property_check([("value", end)]),
    )
}
