//! # Collector Engine
//!
//! Splits a stream into pass-through spans and collected blocks, and routes
//! each block to a handler.
//!
//! A [`Collector`] scans its input with a [`CollectorCheck`]. Events before a
//! block go through the pass function. The triggering event and everything up
//! to (and including) the event accepted by the block's end predicate form a
//! [`Segment`], delivered in one of two ways:
//!
//! - [`Collector::for_each_event`]: the handler runs once per block event and
//!   receives an [`EventContext`] with the event's index and lifecycle flags.
//! - [`Collector::for_each_segment`]: the handler receives the lazy
//!   [`Segment`] and returns a replacement stream. Block events it leaves
//!   unread go back to the outer scan, except the trigger: a handler that
//!   never reads it drops it.
//!
//! ```rust,ignore
//! let rows = Collector::new(block_check(EventKind::StartRow))
//!     .iterations(1)
//!     .for_each_event(|ctx: EventContext| ctx.event.derive_with("first", ctx.first));
//! let out = source.pipe(rows);
//! ```

use crate::{
    check::{BoxBlockEnd, CollectorCheck},
    context::EventContext,
    error::StreamError,
    event::Event,
    filter::StreamFilter,
    handler::{Handler, PassEvent},
    response::FilteredValue,
    stream::{EventResult, EventStream, SharedStream},
};
use std::{collections::VecDeque, fmt};

// ============================================================================
// Options
// ============================================================================

/// What happens when the stream ends before a block's end predicate matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialBlock {
    /// Deliver the collected tail as the block; its last event is flagged `last`.
    #[default]
    Deliver,
    /// Deliver the tail, then fail with [`StreamError::UnterminatedBlock`].
    Error,
}

/// Collector configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorOptions {
    /// Maximum number of blocks to collect. `None` is unbounded.
    pub iterations: Option<usize>,
    /// Once `iterations` blocks were collected, drop the rest of the stream
    /// instead of passing it through.
    pub stop_after: bool,
    /// Handling of a block the stream ends inside of.
    pub partial_block: PartialBlock,
}

impl CollectorOptions {
    fn capped(&self, blocks: usize) -> bool {
        self.iterations.is_some_and(|cap| blocks >= cap)
    }
}

// ============================================================================
// Segment
// ============================================================================

/// One collected block, read lazily from the shared source.
///
/// Yields the triggering event first, then events up to and including the
/// one the end predicate accepts.
pub struct Segment<'a> {
    source: SharedStream<'a, EventResult>,
    trigger: Option<Event>,
    end: BoxBlockEnd,
    partial: PartialBlock,
    block: usize,
    collected: usize,
    closed: bool,
    finished: bool,
}

impl<'a> Segment<'a> {
    fn new(
        source: SharedStream<'a, EventResult>,
        trigger: Event,
        end: BoxBlockEnd,
        partial: PartialBlock,
        block: usize,
    ) -> Self {
        Self {
            source,
            trigger: Some(trigger),
            end,
            partial,
            block,
            collected: 0,
            closed: false,
            finished: false,
        }
    }

    /// Zero-based ordinal of this block.
    pub fn block(&self) -> usize {
        self.block
    }

    /// Number of block events read so far.
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// Whether the end predicate has matched.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The next event and whether it is the block's last.
    ///
    /// The flag is known before the event is handed out: it is set when the
    /// end predicate accepts the event, or, under [`PartialBlock::Deliver`],
    /// when nothing follows it.
    pub fn next_event(&mut self) -> Option<Result<(Event, bool), StreamError>> {
        let event = match self.next()? {
            Ok(event) => event,
            Err(err) => return Some(Err(err)),
        };
        let last = self.closed
            || (self.partial == PartialBlock::Deliver && !self.source.has_next());
        Some(Ok((event, last)))
    }
}

impl Iterator for Segment<'_> {
    type Item = EventResult;

    fn next(&mut self) -> Option<EventResult> {
        if let Some(trigger) = self.trigger.take() {
            self.collected += 1;
            return Some(Ok(trigger));
        }
        if self.finished {
            return None;
        }

        match self.source.next() {
            Some(Ok(event)) => {
                self.collected += 1;
                if self.end.is_end(&event) {
                    self.closed = true;
                    self.finished = true;
                }
                Some(Ok(event))
            }
            Some(Err(err)) => {
                self.finished = true;
                Some(Err(err))
            }
            None => {
                self.finished = true;

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    block = self.block,
                    collected = self.collected,
                    policy = ?self.partial,
                    "stream ended inside a block"
                );

                match self.partial {
                    PartialBlock::Deliver => None,
                    PartialBlock::Error => Some(Err(StreamError::UnterminatedBlock {
                        collected: self.collected,
                    })),
                }
            }
        }
    }
}

impl fmt::Debug for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("block", &self.block)
            .field("collected", &self.collected)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Delivery modes
// ============================================================================

/// How a collector hands a block to its handler.
pub trait Delivery<'a> {
    /// Per-block state.
    type Active;

    /// Start delivering a freshly opened block.
    fn open(&mut self, segment: Segment<'a>) -> Self::Active;

    /// Produce the next output of the block. `None` ends the block.
    fn step(&mut self, active: &mut Self::Active) -> Option<Result<FilteredValue, StreamError>>;
}

/// Per-event delivery. See [`Collector::for_each_event`].
#[derive(Debug, Clone)]
pub struct ForEachEvent<H>(H);

/// Per-segment delivery. See [`Collector::for_each_segment`].
#[derive(Debug, Clone)]
pub struct ForEachSegment<H>(H);

/// Per-event delivery state.
#[derive(Debug)]
pub struct EventCursor<'a> {
    segment: Segment<'a>,
    index: usize,
}

impl<'a, H> Delivery<'a> for ForEachEvent<H>
where
    H: Handler<EventContext>,
{
    type Active = EventCursor<'a>;

    fn open(&mut self, segment: Segment<'a>) -> EventCursor<'a> {
        EventCursor { segment, index: 0 }
    }

    fn step(&mut self, active: &mut EventCursor<'a>) -> Option<Result<FilteredValue, StreamError>> {
        let (event, last) = match active.segment.next_event()? {
            Ok(next) => next,
            Err(err) => return Some(Err(err)),
        };
        let ctx = EventContext {
            event,
            index: active.index,
            first: active.index == 0,
            last,
            block: active.segment.block(),
        };
        active.index += 1;
        Some(self.0.call(ctx).map_err(StreamError::Handler))
    }
}

impl<'a, H, R> Delivery<'a> for ForEachSegment<H>
where
    H: FnMut(Segment<'a>) -> R,
    R: IntoIterator<Item = EventResult>,
    R::IntoIter: 'a,
{
    type Active = EventStream<'a>;

    fn open(&mut self, segment: Segment<'a>) -> EventStream<'a> {
        Box::new((self.0)(segment).into_iter())
    }

    fn step(&mut self, active: &mut EventStream<'a>) -> Option<Result<FilteredValue, StreamError>> {
        Some(active.next()?.map(FilteredValue::One))
    }
}

// ============================================================================
// Collector
// ============================================================================

/// A collector definition.
///
/// Without a handler every block passes through unchanged.
#[derive(Debug, Clone)]
pub struct Collector<K, D = ForEachEvent<PassEvent>, P = PassEvent> {
    check: K,
    delivery: D,
    pass: P,
    options: CollectorOptions,
}

impl<K> Collector<K>
where
    K: CollectorCheck,
{
    /// A pass-through collector delimiting blocks with `check`.
    pub fn new(check: K) -> Self {
        Self {
            check,
            delivery: ForEachEvent(PassEvent),
            pass: PassEvent,
            options: CollectorOptions::default(),
        }
    }
}

impl<K, D, P> Collector<K, D, P> {
    /// Collect at most `iterations` blocks. Zero means unbounded.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.options.iterations = (iterations > 0).then_some(iterations);
        self
    }

    /// See [`CollectorOptions::stop_after`].
    pub fn stop_after(mut self, stop_after: bool) -> Self {
        self.options.stop_after = stop_after;
        self
    }

    /// See [`PartialBlock`].
    pub fn partial_block(mut self, partial_block: PartialBlock) -> Self {
        self.options.partial_block = partial_block;
        self
    }

    /// Replace all options at once.
    pub fn options(mut self, options: CollectorOptions) -> Self {
        self.options = options;
        self
    }

    /// Transform applied to events outside blocks.
    pub fn pass_function<P2>(self, pass: P2) -> Collector<K, D, P2>
    where
        P2: Handler<Event>,
    {
        Collector {
            check: self.check,
            delivery: self.delivery,
            pass,
            options: self.options,
        }
    }

    /// Run `handler` once per block event.
    pub fn for_each_event<H>(self, handler: H) -> Collector<K, ForEachEvent<H>, P>
    where
        H: Handler<EventContext>,
    {
        Collector {
            check: self.check,
            delivery: ForEachEvent(handler),
            pass: self.pass,
            options: self.options,
        }
    }

    /// Hand every block to `handler` as a lazy [`Segment`].
    ///
    /// The segment yields the trigger first. If the handler never reads it,
    /// the trigger is dropped; other unread block events rejoin the scan.
    pub fn for_each_segment<'a, H, R>(self, handler: H) -> Collector<K, ForEachSegment<H>, P>
    where
        H: FnMut(Segment<'a>) -> R,
        R: IntoIterator<Item = EventResult>,
        R::IntoIter: 'a,
    {
        Collector {
            check: self.check,
            delivery: ForEachSegment(handler),
            pass: self.pass,
            options: self.options,
        }
    }

    /// Bind the collector to a source.
    pub fn filter<'a, I>(self, source: I) -> Collecting<'a, K, D, P>
    where
        I: IntoIterator<Item = EventResult>,
        I::IntoIter: 'a,
        D: Delivery<'a>,
    {
        Collecting {
            source: SharedStream::new(source),
            check: self.check,
            delivery: self.delivery,
            pass: self.pass,
            options: self.options,
            blocks: 0,
            pending: VecDeque::new(),
            state: State::Scanning,
        }
    }
}

impl<'a, K, D, P> StreamFilter<'a> for Collector<K, D, P>
where
    K: CollectorCheck + 'a,
    D: Delivery<'a> + 'a,
    D::Active: 'a,
    P: Handler<Event> + 'a,
{
    fn apply(self, stream: EventStream<'a>) -> EventStream<'a> {
        Box::new(self.filter(stream))
    }
}

enum State<A> {
    Scanning,
    Block(A),
    Remainder,
    Done,
}

/// A collector bound to a source.
pub struct Collecting<'a, K, D, P>
where
    D: Delivery<'a>,
{
    source: SharedStream<'a, EventResult>,
    check: K,
    delivery: D,
    pass: P,
    options: CollectorOptions,
    blocks: usize,
    pending: VecDeque<Event>,
    state: State<D::Active>,
}

impl<'a, K, D, P> Collecting<'a, K, D, P>
where
    D: Delivery<'a>,
{
    /// Number of blocks collected so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    fn open_block(&mut self, trigger: Event, end: BoxBlockEnd) {
        #[cfg(feature = "tracing")]
        tracing::trace!(block = self.blocks, kind = %trigger.kind(), "block opened");

        let segment = Segment::new(
            self.source.clone(),
            trigger,
            end,
            self.options.partial_block,
            self.blocks,
        );
        self.blocks += 1;
        self.state = State::Block(self.delivery.open(segment));
    }

    fn close_block(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::trace!(block = self.blocks - 1, "block closed");

        self.state = if !self.options.capped(self.blocks) {
            State::Scanning
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                blocks = self.blocks,
                stop_after = self.options.stop_after,
                "iteration cap reached"
            );

            if self.options.stop_after {
                State::Done
            } else {
                State::Remainder
            }
        };
    }

    fn fail(&mut self, err: StreamError) -> Option<EventResult> {
        self.state = State::Done;
        Some(Err(err))
    }
}

impl<'a, K, D, P> Iterator for Collecting<'a, K, D, P>
where
    K: CollectorCheck,
    D: Delivery<'a>,
    P: Handler<Event>,
{
    type Item = EventResult;

    fn next(&mut self) -> Option<EventResult> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }

            match &mut self.state {
                State::Done => return None,
                State::Remainder => {
                    return match self.source.next()? {
                        Ok(event) => Some(Ok(event)),
                        Err(err) => self.fail(err),
                    };
                }
                State::Block(active) => match self.delivery.step(active) {
                    Some(Ok(value)) => self.pending.extend(value),
                    Some(Err(err)) => return self.fail(err),
                    None => self.close_block(),
                },
                State::Scanning => {
                    let event = match self.source.next() {
                        Some(Ok(event)) => event,
                        Some(Err(err)) => return self.fail(err),
                        None => {
                            self.state = State::Done;
                            return None;
                        }
                    };
                    match self.check.begin(&event) {
                        Some(end) => self.open_block(event, end),
                        None => match self.pass.call(event) {
                            Ok(value) => self.pending.extend(value),
                            Err(err) => return self.fail(StreamError::Handler(err)),
                        },
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{collector_check, property_check};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn values(s: &str) -> Vec<EventResult> {
        s.chars()
            .map(|c| Ok(Event::generic().with("value", c)))
            .collect()
    }

    fn value(event: &Event) -> String {
        event.get_str("value").unwrap_or("?").to_owned()
    }

    fn text(out: impl IntoIterator<Item = EventResult>) -> String {
        out.into_iter().map(|e| value(&e.unwrap())).collect()
    }

    fn a_to(end: &'static str) -> impl CollectorCheck + Clone {
        collector_check(
            property_check([("value", "a")]),
            property_check([("value", end)]),
        )
    }

    #[test]
    fn blocks_are_routed_to_the_handler() {
        let seen = RefCell::new(String::new());
        let input = "nnnnnabcdennnnnnn";
        let out = Collector::new(a_to("e"))
            .for_each_event(|ctx: EventContext| {
                seen.borrow_mut().push_str(&value(&ctx.event));
                ctx.event
            })
            .filter(values(input));
        assert_eq!(text(out), input);
        assert_eq!(seen.into_inner(), "abcde");
    }

    #[test]
    fn iteration_cap_passes_remainder_through() {
        let seen = RefCell::new(0);
        let input = "nabcden".repeat(5);
        let out = Collector::new(a_to("e"))
            .iterations(2)
            .for_each_event(|ctx: EventContext| {
                if ctx.first {
                    *seen.borrow_mut() += 1;
                }
                ctx.event
            })
            .filter(values(&input));
        assert_eq!(text(out), input);
        assert_eq!(seen.into_inner(), 2);
    }

    #[test]
    fn stop_after_drops_remainder() {
        let input = "nabcden".repeat(5);
        let out = Collector::new(a_to("e"))
            .iterations(2)
            .stop_after(true)
            .filter(values(&input));
        assert_eq!(text(out), "nabcdennabcde");
    }

    #[test]
    fn per_event_index_and_flags() {
        let out = Collector::new(a_to("c"))
            .for_each_event(|ctx: EventContext| {
                ctx.event
                    .derive()
                    .with("index", ctx.index)
                    .with("first", ctx.first)
                    .with("last", ctx.last)
            })
            .filter(values(&"nabcn".repeat(2)));
        let flags: Vec<_> = out
            .map(Result::unwrap)
            .filter(|e| e.has("index"))
            .map(|e| {
                (
                    value(&e),
                    e.get_int("index").unwrap_or(-1),
                    e.get_bool("first").unwrap_or_default(),
                    e.get_bool("last").unwrap_or_default(),
                )
            })
            .collect();
        let expected: [(&str, i64, bool, bool); 3] =
            [("a", 0, true, false), ("b", 1, false, false), ("c", 2, false, true)];
        let expected: Vec<_> = expected
            .iter()
            .chain(&expected)
            .map(|&(v, i, f, l)| (v.to_owned(), i, f, l))
            .collect();
        assert_eq!(flags, expected);
    }

    #[test]
    fn pass_function_applies_outside_blocks() {
        let input = "nnnnnabcdennnnnnn".repeat(5);
        let out = Collector::new(a_to("e"))
            .pass_function(|event: Event| event.derive_with("value", "-"))
            .filter(values(&input));
        assert_eq!(text(out), input.replace('n', "-"));
    }

    #[test]
    fn segments_are_delivered_whole() {
        let seen = RefCell::new(Vec::new());
        let input = "nnnnnabcdennnnnnn".repeat(5);
        let out = Collector::new(a_to("e"))
            .for_each_segment(|segment| {
                let events: Vec<_> = segment.collect();
                let run: String = events.iter().map(|e| value(e.as_ref().unwrap())).collect();
                seen.borrow_mut().push(run);
                events
            })
            .filter(values(&input));
        assert_eq!(text(out), input);
        assert_eq!(seen.into_inner(), vec!["abcde"; 5]);
    }

    #[test]
    fn unread_segment_events_rejoin_the_scan() {
        let out = Collector::new(a_to("e"))
            .for_each_segment(|segment| {
                segment
                    .take(2)
                    .map(|e| e.map(|e| e.derive_with("value", value(&e).to_uppercase())))
            })
            .filter(values("nabcden"));
        assert_eq!(text(out), "nABcden");
    }

    #[test]
    fn unread_trigger_is_dropped() {
        let out = Collector::new(a_to("e"))
            .for_each_segment(|_segment| std::iter::empty())
            .filter(values("nabcden"));
        assert_eq!(text(out), "nbcden");
    }

    #[test]
    fn partial_block_is_delivered_by_default() {
        let out: Vec<_> = Collector::new(a_to("e"))
            .for_each_event(|ctx: EventContext| ctx.event.derive_with("last", ctx.last))
            .filter(values("nab"))
            .map(Result::unwrap)
            .collect();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].get_bool("last"), Some(false));
        assert_eq!(out[2].get_bool("last"), Some(true));
    }

    #[test]
    fn partial_block_can_be_an_error() {
        let out: Vec<_> = Collector::new(a_to("e"))
            .partial_block(PartialBlock::Error)
            .filter(values("nab"))
            .collect();
        assert_eq!(out.len(), 4);
        assert!(matches!(
            out[3],
            Err(StreamError::UnterminatedBlock { collected: 2 })
        ));
    }

    #[test]
    fn handler_errors_end_the_stream() {
        let out: Vec<_> = Collector::new(a_to("e"))
            .for_each_event(|ctx: EventContext| {
                if ctx.index == 1 {
                    Err("boom")
                } else {
                    Ok(ctx.event)
                }
            })
            .filter(values("nabcden"))
            .collect();
        assert_eq!(out.len(), 3);
        assert!(matches!(&out[2], Err(StreamError::Handler(e)) if e.to_string() == "boom"));
    }
}
