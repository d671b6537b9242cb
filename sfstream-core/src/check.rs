//! # Checks
//!
//! Boolean predicates over events, and the combinators that compose them.
//!
//! - [`EventCheck`]: `&Event -> bool`. Closures implement it directly.
//! - [`CollectorCheck`]: `&Event -> Option<end predicate>`. Used by the
//!   collector to find where a block starts and how it ends.
//! - [`BlockEnd`]: a possibly stateful end predicate. Every `EventCheck` is one.
//!
//! Checks are expected to be free of side effects beyond idempotent
//! evaluation; combinators short-circuit.

use crate::event::{Event, EventKind, Value};

/// A predicate over events.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `EventCheck`",
    label = "missing `EventCheck` implementation",
    note = "Closures of the form `|event: &Event| -> bool` are checks."
)]
pub trait EventCheck {
    /// Whether `event` satisfies the check.
    fn matches(&self, event: &Event) -> bool;

    /// Both checks must match. Short-circuits on the first false.
    fn and<C>(self, other: C) -> And<Self, C>
    where
        Self: Sized,
        C: EventCheck,
    {
        And {
            first: self,
            second: other,
        }
    }

    /// Either check must match. Short-circuits on the first true.
    fn or<C>(self, other: C) -> Or<Self, C>
    where
        Self: Sized,
        C: EventCheck,
    {
        Or {
            first: self,
            second: other,
        }
    }

    /// Inverts the check.
    fn not(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not { check: self }
    }

    /// Boxes the check.
    fn boxed(self) -> BoxCheck
    where
        Self: Sized + 'static,
    {
        BoxCheck(Box::new(self))
    }
}

impl<F> EventCheck for F
where
    F: Fn(&Event) -> bool,
{
    fn matches(&self, event: &Event) -> bool {
        (self)(event)
    }
}

/// A type-erased check.
pub struct BoxCheck(Box<dyn EventCheck>);

impl EventCheck for BoxCheck {
    fn matches(&self, event: &Event) -> bool {
        self.0.matches(event)
    }
}

/// Built by [`EventCheck::and`].
#[derive(Debug, Clone)]
pub struct And<A, B> {
    first: A,
    second: B,
}

impl<A: EventCheck, B: EventCheck> EventCheck for And<A, B> {
    fn matches(&self, event: &Event) -> bool {
        self.first.matches(event) && self.second.matches(event)
    }
}

/// Built by [`EventCheck::or`].
#[derive(Debug, Clone)]
pub struct Or<A, B> {
    first: A,
    second: B,
}

impl<A: EventCheck, B: EventCheck> EventCheck for Or<A, B> {
    fn matches(&self, event: &Event) -> bool {
        self.first.matches(event) || self.second.matches(event)
    }
}

/// Built by [`EventCheck::not`].
#[derive(Debug, Clone)]
pub struct Not<C> {
    check: C,
}

impl<C: EventCheck> EventCheck for Not<C> {
    fn matches(&self, event: &Event) -> bool {
        !self.check.matches(event)
    }
}

/// Matches every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl EventCheck for Always {
    fn matches(&self, _event: &Event) -> bool {
        true
    }
}

/// Matches no event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl EventCheck for Never {
    fn matches(&self, _event: &Event) -> bool {
        false
    }
}

/// A check that matches every event.
pub fn always() -> Always {
    Always
}

/// A check that matches no event.
pub fn never() -> Never {
    Never
}

/// Matches events whose kind is one of a set.
///
/// With an empty set the check answers the `permissive` flag for every event.
#[derive(Debug, Clone, Default)]
pub struct TypeCheck {
    kinds: Vec<EventKind>,
    permissive: bool,
}

impl TypeCheck {
    /// Match any of `kinds`.
    pub fn new(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            permissive: false,
        }
    }

    /// The answer given when no kinds were supplied.
    pub fn permissive(mut self, permissive: bool) -> Self {
        self.permissive = permissive;
        self
    }
}

impl EventCheck for TypeCheck {
    fn matches(&self, event: &Event) -> bool {
        if self.kinds.is_empty() {
            return self.permissive;
        }
        self.kinds.contains(event.kind())
    }
}

/// Shorthand for [`TypeCheck::new`].
pub fn type_check(kinds: impl IntoIterator<Item = EventKind>) -> TypeCheck {
    TypeCheck::new(kinds)
}

/// All checks must match (short-circuit, evaluated in order).
pub struct AllOf(Vec<BoxCheck>);

impl EventCheck for AllOf {
    fn matches(&self, event: &Event) -> bool {
        self.0.iter().all(|check| check.matches(event))
    }
}

/// Any check must match (short-circuit, evaluated in order).
pub struct AnyOf(Vec<BoxCheck>);

impl EventCheck for AnyOf {
    fn matches(&self, event: &Event) -> bool {
        self.0.iter().any(|check| check.matches(event))
    }
}

/// Match when every check in `checks` matches. Empty matches everything.
pub fn and_check(checks: impl IntoIterator<Item = BoxCheck>) -> AllOf {
    AllOf(checks.into_iter().collect())
}

/// Match when any check in `checks` matches. Empty matches nothing.
pub fn or_check(checks: impl IntoIterator<Item = BoxCheck>) -> AnyOf {
    AnyOf(checks.into_iter().collect())
}

/// Matches events whose named properties all equal the given values.
///
/// A missing property is a non-match, never an error.
#[derive(Debug, Clone, Default)]
pub struct PropertyCheck {
    expected: Vec<(String, Value)>,
}

impl PropertyCheck {
    /// A check with no expectations; it matches every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also require `key` to equal `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.expected.push((key.into(), value.into()));
        self
    }
}

impl EventCheck for PropertyCheck {
    fn matches(&self, event: &Event) -> bool {
        self.expected
            .iter()
            .all(|(key, value)| event.get(key) == Some(value))
    }
}

/// Match events holding every `(key, value)` pair of `expected`.
pub fn property_check<K, V>(expected: impl IntoIterator<Item = (K, V)>) -> PropertyCheck
where
    K: Into<String>,
    V: Into<Value>,
{
    expected
        .into_iter()
        .fold(PropertyCheck::new(), |check, (k, v)| check.with(k, v))
}

// ============================================================================
// Block delimiting
// ============================================================================

/// A possibly stateful predicate that detects the end of a block.
pub trait BlockEnd {
    /// Whether `event` closes the block.
    fn is_end(&mut self, event: &Event) -> bool;
}

impl<C: EventCheck> BlockEnd for C {
    fn is_end(&mut self, event: &Event) -> bool {
        self.matches(event)
    }
}

/// A boxed end predicate, one per collected block.
pub type BoxBlockEnd = Box<dyn BlockEnd>;

/// Decides where collected blocks start.
///
/// Returns `None` while the event is before a block. On the triggering event
/// it returns the predicate that will detect the block's end. The trigger
/// itself is never passed to that predicate.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `CollectorCheck`",
    label = "missing `CollectorCheck` implementation",
    note = "Use `collector_check(start, end)` or `block_check(..)` to build one."
)]
pub trait CollectorCheck {
    /// The end predicate for a block triggered by `event`, if it starts one.
    fn begin(&self, event: &Event) -> Option<BoxBlockEnd>;
}

impl<F> CollectorCheck for F
where
    F: Fn(&Event) -> Option<BoxBlockEnd>,
{
    fn begin(&self, event: &Event) -> Option<BoxBlockEnd> {
        (self)(event)
    }
}

/// The collector check built by [`collector_check`].
#[derive(Debug, Clone)]
pub struct StartEnd<S, E> {
    start: S,
    end: E,
}

impl<S, E> CollectorCheck for StartEnd<S, E>
where
    S: EventCheck,
    E: EventCheck + Clone + 'static,
{
    fn begin(&self, event: &Event) -> Option<BoxBlockEnd> {
        if self.start.matches(event) {
            Some(Box::new(self.end.clone()))
        } else {
            None
        }
    }
}

/// Returns `end` whenever `start` matches the current event.
pub fn collector_check<S, E>(start: S, end: E) -> StartEnd<S, E>
where
    S: EventCheck,
    E: EventCheck + Clone + 'static,
{
    StartEnd { start, end }
}
