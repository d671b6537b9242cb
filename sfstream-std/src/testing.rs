//! Testing utilities for sfstream.
//!
//! This module provides utilities to make testing checks, filters and
//! collectors easier.
//!
//! # Features
//!
//! - [`value_events`]: one generic event per character, with `value` set
//! - [`table_events`]: a table in the canonical table grammar
//! - [`values`]: project the `value` property of events back into a string
//! - [`RecordingHandler`]: a per-event handler that records what it saw
//! - [`SpyCheck`]: a check that counts its evaluations
//! - [`FailOn`]: a pass handler that fails on selected events

use sfstream_core::{
    BoxError, Event, EventCheck, EventContext, EventKind, EventResult, FilteredValue, Handler,
    Value,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use thiserror::Error;

// ============================================================================
// Event fixtures
// ============================================================================

/// One generic event per character of `s`, with `value` set to the character.
///
/// ```rust,ignore
/// let stream = value_events("nnabc");
/// ```
pub fn value_events(s: &str) -> Vec<EventResult> {
    s.chars()
        .map(|c| Ok(Event::generic().with("value", c)))
        .collect()
}

/// A table named `name`: `StartTable`, one `StartRow .. EndRow` per row with
/// a `Cell` per value, then `EndTable`.
///
/// Rows carry `row_index`; cells carry `value`, `column_index` and
/// `row_index`.
pub fn table_events(name: &str, rows: &[&[&str]]) -> Vec<EventResult> {
    let mut events = vec![Event::start_table().with("table_name", name)];
    for (row_index, row) in rows.iter().enumerate() {
        events.push(Event::start_row().with("row_index", row_index));
        events.extend(row.iter().enumerate().map(|(column_index, value)| {
            Event::cell()
                .with("value", *value)
                .with("column_index", column_index)
                .with("row_index", row_index)
        }));
        events.push(Event::end_row().with("row_index", row_index));
    }
    events.push(Event::end_table().with("table_name", name));
    events.into_iter().map(Ok).collect()
}

/// The `value` properties of `events`, concatenated. Events without one
/// contribute nothing.
pub fn values<'e>(events: impl IntoIterator<Item = &'e Event>) -> String {
    events
        .into_iter()
        .filter_map(|event| event.get("value"))
        .map(Value::to_string)
        .collect()
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A per-event collector handler that records every context it receives and
/// passes the event through.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::new();
/// let out = source.pipe(Collector::new(check).for_each_event(recorder.clone()));
///
/// assert_eq!(recorder.values(), "abcde");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    seen: Arc<Mutex<Vec<EventContext>>>,
}

impl RecordingHandler {
    /// An empty recorder. Clones share the recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the recorded contexts.
    pub fn seen(&self) -> Vec<EventContext> {
        self.seen.lock().unwrap().clone()
    }

    /// Number of recorded contexts.
    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// The `value` properties of the recorded events, concatenated.
    pub fn values(&self) -> String {
        values(self.seen().iter().map(|ctx| &ctx.event))
    }

    /// `(first, last)` for every recorded event.
    pub fn flags(&self) -> Vec<(bool, bool)> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|ctx| (ctx.first, ctx.last))
            .collect()
    }

    /// Number of distinct blocks seen.
    pub fn blocks(&self) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|ctx| ctx.first)
            .count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl Handler<EventContext> for RecordingHandler {
    fn call(&mut self, input: EventContext) -> Result<FilteredValue, BoxError> {
        let event = input.event.clone();
        self.seen.lock().unwrap().push(input);
        Ok(FilteredValue::One(event))
    }
}

// ============================================================================
// Spy Check
// ============================================================================

/// A check that counts how often it was evaluated.
#[derive(Debug, Clone)]
pub struct SpyCheck<C> {
    check: C,
    calls: Arc<AtomicUsize>,
}

impl<C> SpyCheck<C> {
    /// Count evaluations of `check`. Clones share the count.
    pub fn new(check: C) -> Self {
        Self {
            check,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the current count.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<C: EventCheck> EventCheck for SpyCheck<C> {
    fn matches(&self, event: &Event) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check.matches(event)
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// The error raised by [`FailOn`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("refused {kind} event")]
pub struct Refused {
    /// Kind of the refused event.
    pub kind: EventKind,
}

/// A pass handler that fails on the events a check selects and passes the
/// others through.
#[derive(Debug, Clone)]
pub struct FailOn<C> {
    check: C,
}

impl<C: EventCheck> FailOn<C> {
    /// Fail on the events `check` matches.
    pub fn new(check: C) -> Self {
        Self { check }
    }
}

impl FailOn<Box<dyn Fn(&Event) -> bool>> {
    /// Fail on every event of `kind`.
    pub fn kind(kind: EventKind) -> Self {
        Self::new(Box::new(move |event: &Event| event.is(&kind)))
    }

    /// Fail on every event whose `value` is `value`.
    pub fn value(value: impl Into<Value>) -> Self {
        let value = value.into();
        let check = move |event: &Event| event.get("value") == Some(&value);
        Self::new(Box::new(check))
    }
}

impl<C: EventCheck> Handler<Event> for FailOn<C> {
    fn call(&mut self, input: Event) -> Result<FilteredValue, BoxError> {
        if self.check.matches(&input) {
            return Err(Refused {
                kind: input.kind().clone(),
            }
            .into());
        }
        Ok(FilteredValue::One(input))
    }
}
