//! # Stream Primitives
//!
//! Lookahead-preserving iteration helpers that the filter and collector
//! engines are built from.
//!
//! - [`first_then_rest`]: un-consume a peeked item without buffering the stream
//! - [`conditional_wrapper`]: hand a sub-region of a stream to a wrapper
//! - [`until_match`]: read up to a boundary event
//! - [`SharedStream`]: the clonable handle that lets several readers take
//!   turns on one underlying source
//!
//! Everything is pull-based and single-threaded: a stage runs only when its
//! consumer asks for the next item.

use crate::{
    error::{CompletionError, StreamError},
    event::Event,
};
use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt,
    iter::{Chain, Once},
    rc::Rc,
};

/// One item of an event stream.
pub type EventResult = Result<Event, StreamError>;

/// A type-erased event stream.
pub type EventStream<'a> = Box<dyn Iterator<Item = EventResult> + 'a>;

/// Lift plain events into an event stream.
pub fn events<'a, I>(events: I) -> EventStream<'a>
where
    I: IntoIterator<Item = Event>,
    I::IntoIter: 'a,
{
    Box::new(events.into_iter().map(Ok))
}

/// Conversion of plain event collections into an [`EventStream`].
pub trait IntoEvents<'a> {
    /// Wrap every event as `Ok`.
    fn into_events(self) -> EventStream<'a>;
}

impl<'a, I> IntoEvents<'a> for I
where
    I: IntoIterator<Item = Event>,
    I::IntoIter: 'a,
{
    fn into_events(self) -> EventStream<'a> {
        events(self)
    }
}

// ============================================================================
// Shared Stream
// ============================================================================

struct Shared<'a, T> {
    pending: VecDeque<T>,
    source: Box<dyn Iterator<Item = T> + 'a>,
}

/// A clonable handle onto one underlying iterator.
///
/// All clones read from the same position: an item taken through one clone
/// is gone for the others. Items can be pushed back to the front.
///
/// The handle borrows its state only for the duration of a single `next`,
/// so a reader may hand a clone to a nested reader and keep going once the
/// nested reader stops.
pub struct SharedStream<'a, T> {
    inner: Rc<RefCell<Shared<'a, T>>>,
}

impl<'a, T> SharedStream<'a, T> {
    /// Share `source` between all clones of the returned handle.
    pub fn new<I>(source: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        Self {
            inner: Rc::new(RefCell::new(Shared {
                pending: VecDeque::new(),
                source: Box::new(source.into_iter()),
            })),
        }
    }

    /// Put an item back; it will be the next one read.
    pub fn push_front(&self, item: T) {
        self.inner.borrow_mut().pending.push_front(item);
    }

    /// The next item without consuming it.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        if self.has_next() {
            self.inner.borrow().pending.front().cloned()
        } else {
            None
        }
    }

    /// Whether another item is available. Pulls at most one item from the
    /// source and keeps it.
    pub fn has_next(&self) -> bool {
        let mut shared = self.inner.borrow_mut();
        if !shared.pending.is_empty() {
            return true;
        }
        match shared.source.next() {
            Some(item) => {
                shared.pending.push_back(item);
                true
            }
            None => false,
        }
    }
}

impl<T> Clone for SharedStream<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Iterator for SharedStream<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let mut shared = self.inner.borrow_mut();
        match shared.pending.pop_front() {
            Some(item) => Some(item),
            None => shared.source.next(),
        }
    }
}

impl<T> fmt::Debug for SharedStream<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStream")
            .field("pending", &self.inner.borrow().pending.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// first_then_rest
// ============================================================================

/// Yields `first`, then everything in `rest`.
pub fn first_then_rest<T, I>(first: T, rest: I) -> Chain<Once<T>, I::IntoIter>
where
    I: IntoIterator<Item = T>,
{
    std::iter::once(first).chain(rest)
}

// ============================================================================
// conditional_wrapper
// ============================================================================

/// What a [`conditional_wrapper`] wrapper receives: the matching item
/// followed by the shared remainder of the source.
pub type Remainder<'a, T> = Chain<Once<T>, SharedStream<'a, T>>;

/// Iterator returned by [`conditional_wrapper`].
pub struct ConditionalWrapper<'a, T, W, C> {
    source: SharedStream<'a, T>,
    wrapper: W,
    check: C,
    current: Option<Box<dyn Iterator<Item = T> + 'a>>,
}

/// Scan `source`; for each item where `check` matches, delegate the
/// remainder (the item re-attached in front) to `wrapper`.
///
/// The wrapper may consume any prefix of the remainder. Once its output is
/// exhausted the scan resumes after whatever it consumed. If the wrapper
/// never reads the matching item, that item is dropped. Items that do not
/// match pass through unchanged.
pub fn conditional_wrapper<'a, T, S, W, R, C>(
    source: S,
    wrapper: W,
    check: C,
) -> ConditionalWrapper<'a, T, W, C>
where
    S: IntoIterator<Item = T>,
    S::IntoIter: 'a,
    W: FnMut(Remainder<'a, T>) -> R,
    R: IntoIterator<Item = T>,
    R::IntoIter: 'a,
    C: FnMut(&T) -> bool,
{
    ConditionalWrapper {
        source: SharedStream::new(source),
        wrapper,
        check,
        current: None,
    }
}

impl<'a, T, W, R, C> Iterator for ConditionalWrapper<'a, T, W, C>
where
    W: FnMut(Remainder<'a, T>) -> R,
    R: IntoIterator<Item = T>,
    R::IntoIter: 'a,
    C: FnMut(&T) -> bool,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(current) = self.current.as_mut() {
                match current.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }

            let item = self.source.next()?;
            if !(self.check)(&item) {
                return Some(item);
            }
            let remainder = first_then_rest(item, self.source.clone());
            self.current = Some(Box::new((self.wrapper)(remainder).into_iter()));
        }
    }
}

// ============================================================================
// until_match
// ============================================================================

/// Iterator returned by [`until_match`].
pub struct UntilMatch<I, F> {
    source: I,
    is_end: F,
    yield_final: bool,
    finished: bool,
    final_event: Option<Event>,
}

/// Yield events until `is_end` matches.
///
/// The matching event is consumed. With `yield_final` it is yielded as well;
/// either way it is available from [`UntilMatch::final_event`] once the
/// iterator is exhausted. An `Err` item is forwarded and ends the scan.
pub fn until_match<I, F>(source: I, is_end: F, yield_final: bool) -> UntilMatch<I::IntoIter, F>
where
    I: IntoIterator<Item = EventResult>,
    F: FnMut(&Event) -> bool,
{
    UntilMatch {
        source: source.into_iter(),
        is_end,
        yield_final,
        finished: false,
        final_event: None,
    }
}

impl<I, F> UntilMatch<I, F> {
    /// The boundary event that ended the scan.
    ///
    /// `Ok(None)` means the source ran out before a match.
    pub fn final_event(&self) -> Result<Option<&Event>, CompletionError> {
        if self.finished {
            Ok(self.final_event.as_ref())
        } else {
            Err(CompletionError::Pending)
        }
    }

    /// Whether the scan has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<I, F> Iterator for UntilMatch<I, F>
where
    I: Iterator<Item = EventResult>,
    F: FnMut(&Event) -> bool,
{
    type Item = EventResult;

    fn next(&mut self) -> Option<EventResult> {
        if self.finished {
            return None;
        }
        match self.source.next() {
            None => {
                self.finished = true;
                None
            }
            Some(Err(err)) => {
                self.finished = true;
                Some(Err(err))
            }
            Some(Ok(event)) if (self.is_end)(&event) => {
                self.finished = true;
                if self.yield_final {
                    self.final_event = Some(event.clone());
                    Some(Ok(event))
                } else {
                    self.final_event = Some(event);
                    None
                }
            }
            Some(ok) => Some(ok),
        }
    }
}
