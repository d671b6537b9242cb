//! XML region extraction.
//!
//! An XML region runs from a `StartElement` to the next `EndElement` with the
//! same `tag`, both included. Elements nested inside the region under the
//! same tag name are not supported: the first matching `EndElement` closes
//! the region.

use sfstream_core::{
    And, EventCheck, EventKind, EventResult, EventStream, PropertyCheck, StreamError,
    StreamFilter, TypeCheck, Value, first_then_rest, property_check, type_check, until_match,
};
use std::iter;

/// Matches the `EndElement` that closes an element with the given tag.
pub fn element_end(tag: impl Into<Value>) -> And<TypeCheck, PropertyCheck> {
    type_check([EventKind::EndElement])
        .and(property_check([("tag", tag)]))
}

/// The region opened by the first event of `source`.
///
/// An empty source yields an empty region. A first event that is not a
/// `StartElement` yields [`StreamError::UnexpectedEvent`].
pub fn xml_region<'a, I>(source: I) -> EventStream<'a>
where
    I: IntoIterator<Item = EventResult>,
    I::IntoIter: 'a,
{
    let mut source = source.into_iter();
    let start = match source.next() {
        None => return Box::new(iter::empty()),
        Some(Err(err)) => return Box::new(iter::once(Err(err))),
        Some(Ok(event)) => event,
    };
    if !start.is(&EventKind::StartElement) {
        return Box::new(iter::once(Err(StreamError::UnexpectedEvent {
            expected: "StartElement",
            found: start.kind().clone(),
        })));
    }

    let end = element_end(start.get("tag").cloned().unwrap_or_default());
    Box::new(until_match(
        first_then_rest(Ok(start), source),
        move |event| end.matches(event),
        true,
    ))
}

/// Hand the XML region at the head of the stream to `handler`.
///
/// Events after the region are not read.
pub fn xml_collector<'a, F, R>(handler: F) -> impl StreamFilter<'a>
where
    F: FnOnce(EventStream<'a>) -> R + 'a,
    R: IntoIterator<Item = EventResult>,
    R::IntoIter: 'a,
{
    move |stream: EventStream<'a>| -> EventStream<'a> {
        Box::new(handler(xml_region(stream)).into_iter())
    }
}
