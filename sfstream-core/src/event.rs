//! # Event Model
//!
//! Immutable, tagged records describing one point in a structured data
//! stream. An [`Event`] is a [`EventKind`] plus an insertion-ordered map of
//! named [`Value`]s.
//!
//! Events are never mutated. A new event is produced by deriving from an
//! existing one: the property map is copied, overrides are applied and the
//! `source` property points back at the original for provenance.
//!
//! # Grammar
//!
//! Producers emit, and the engine assumes:
//!
//! ```text
//! container  := StartContainer table* EndContainer
//! table      := StartTable row* EndTable
//! row        := StartRow cell* EndRow
//! element    := StartElement (element | TextNode | CommentNode | ProcessingInstructionNode)* EndElement
//! ```
//!
//! # Equality
//!
//! Two events are equal when their kinds match **and** their property maps
//! hold the same keys with equal values (order-insensitive). Use
//! [`Event::same_properties`] to compare property maps alone.

use crate::error::EventError;
use std::{borrow::Cow, collections::BTreeMap, fmt, sync::Arc};

/// Property key holding the event an event was derived from.
pub const SOURCE: &str = "source";

/// The tag of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Untyped event.
    Generic,
    /// Opens a container of tables, such as a workbook.
    StartContainer,
    /// Closes a container.
    EndContainer,
    /// Opens a table.
    StartTable,
    /// Closes a table.
    EndTable,
    /// Opens a row.
    StartRow,
    /// Closes a row.
    EndRow,
    /// One table cell.
    Cell,
    /// Opens an XML element. Requires `tag`.
    StartElement,
    /// Closes an XML element. Requires `tag`.
    EndElement,
    /// XML character data. Requires `text`.
    TextNode,
    /// XML comment. Requires `text`.
    CommentNode,
    /// XML processing instruction. Requires `text`.
    ProcessingInstructionNode,
    /// A user-defined kind.
    Custom(Cow<'static, str>),
}

impl EventKind {
    /// A user-defined kind.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        EventKind::Custom(name.into())
    }

    /// The kind that closes a region opened by this kind, if any.
    pub fn pair(&self) -> Option<EventKind> {
        match self {
            EventKind::StartContainer => Some(EventKind::EndContainer),
            EventKind::StartTable => Some(EventKind::EndTable),
            EventKind::StartRow => Some(EventKind::EndRow),
            EventKind::StartElement => Some(EventKind::EndElement),
            _ => None,
        }
    }

    /// The property an event of this kind cannot be built without.
    pub fn required_property(&self) -> Option<&'static str> {
        match self {
            EventKind::StartElement | EventKind::EndElement => Some("tag"),
            EventKind::TextNode
            | EventKind::CommentNode
            | EventKind::ProcessingInstructionNode => Some("text"),
            _ => None,
        }
    }

    /// The kind's name.
    pub fn name(&self) -> &str {
        match self {
            EventKind::Generic => "Generic",
            EventKind::StartContainer => "StartContainer",
            EventKind::EndContainer => "EndContainer",
            EventKind::StartTable => "StartTable",
            EventKind::EndTable => "EndTable",
            EventKind::StartRow => "StartRow",
            EventKind::EndRow => "EndRow",
            EventKind::Cell => "Cell",
            EventKind::StartElement => "StartElement",
            EventKind::EndElement => "EndElement",
            EventKind::TextNode => "TextNode",
            EventKind::CommentNode => "CommentNode",
            EventKind::ProcessingInstructionNode => "ProcessingInstructionNode",
            EventKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(String),
    /// An ordered list, such as column headers.
    List(Vec<Value>),
    /// A nested map.
    Map(BTreeMap<String, Value>),
    /// Another event, used for provenance.
    Event(Event),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The event, if this holds one.
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Value::Event(event) => Some(event),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => write!(f, "{map:?}"),
            Value::Event(event) => write!(f, "<{}>", event.kind()),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value $(as $cast)?)
                }
            }
        )+
    };
}

impl_value_from!(
    bool => Bool,
    i64 => Int,
    i32 => Int as i64,
    u32 => Int as i64,
    f64 => Float,
    String => Str,
    Event => Event,
    BTreeMap<String, Value> => Map,
);

/// Saturates at `i64::MAX`.
impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Str(value.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Insertion-ordered property storage.
#[derive(Clone, Default, PartialEq)]
struct Properties(Vec<(String, Value)>);

impl Properties {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn set(&mut self, key: String, value: Value) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    fn same_as(&self, other: &Properties) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

/// An immutable, tagged stream event.
///
/// Cloning is cheap: the property map is shared.
#[derive(Clone)]
pub struct Event {
    kind: EventKind,
    properties: Arc<Properties>,
}

impl Event {
    fn bare(kind: EventKind) -> Self {
        Self {
            kind,
            properties: Arc::new(Properties::default()),
        }
    }

    /// Start building an event of any kind. Required properties are checked
    /// by [`EventBuilder::build`].
    pub fn builder(kind: EventKind) -> EventBuilder {
        EventBuilder {
            kind,
            properties: Properties::default(),
        }
    }

    /// An untyped event.
    pub fn generic() -> Self {
        Self::bare(EventKind::Generic)
    }

    /// An event of a user-defined kind.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::bare(EventKind::custom(name))
    }

    /// A `StartContainer` event.
    pub fn start_container() -> Self {
        Self::bare(EventKind::StartContainer)
    }

    /// An `EndContainer` event.
    pub fn end_container() -> Self {
        Self::bare(EventKind::EndContainer)
    }

    /// A `StartTable` event.
    pub fn start_table() -> Self {
        Self::bare(EventKind::StartTable)
    }

    /// An `EndTable` event.
    pub fn end_table() -> Self {
        Self::bare(EventKind::EndTable)
    }

    /// A `StartRow` event.
    pub fn start_row() -> Self {
        Self::bare(EventKind::StartRow)
    }

    /// An `EndRow` event.
    pub fn end_row() -> Self {
        Self::bare(EventKind::EndRow)
    }

    /// A `Cell` event.
    pub fn cell() -> Self {
        Self::bare(EventKind::Cell)
    }

    /// A `StartElement` event for `tag`.
    pub fn start_element(tag: impl Into<Value>) -> Self {
        Self::bare(EventKind::StartElement).with("tag", tag)
    }

    /// An `EndElement` event for `tag`.
    pub fn end_element(tag: impl Into<Value>) -> Self {
        Self::bare(EventKind::EndElement).with("tag", tag)
    }

    /// A `TextNode` holding `text`.
    pub fn text_node(text: impl Into<Value>) -> Self {
        Self::bare(EventKind::TextNode).with("text", text)
    }

    /// A `CommentNode` holding `text`.
    pub fn comment_node(text: impl Into<Value>) -> Self {
        Self::bare(EventKind::CommentNode).with("text", text)
    }

    /// A `ProcessingInstructionNode` holding `text`.
    pub fn processing_instruction(text: impl Into<Value>) -> Self {
        Self::bare(EventKind::ProcessingInstructionNode)
            .with("text", text)
    }

    /// Returns this event with one more property, for use while an event is
    /// being put together. No `source` is recorded; see [`Event::derive`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let properties = Arc::make_mut(&mut self.properties);
        properties.set(key.into(), value.into());
        self
    }

    /// Derive a new event of the same kind. The copy records `self` as its
    /// `source`.
    pub fn derive(&self) -> Derived {
        Derived {
            event: Event {
                kind: self.kind.clone(),
                properties: Arc::new(self.provenance()),
            },
        }
    }

    /// Derive a new event of a different kind.
    pub fn derive_as(&self, kind: EventKind) -> EventBuilder {
        EventBuilder {
            kind,
            properties: self.provenance(),
        }
    }

    /// A copy of the properties with `source` pointing at `self`.
    fn provenance(&self) -> Properties {
        let mut properties = (*self.properties).clone();
        let source = Value::Event(self.clone());
        properties.set(SOURCE.to_owned(), source);
        properties
    }

    /// Shorthand for `self.derive().with(key, value).finish()`.
    pub fn derive_with(&self, key: impl Into<String>, value: impl Into<Value>) -> Event {
        self.derive().with(key, value).finish()
    }

    /// The event's kind.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Whether the event has `kind`.
    pub fn is(&self, kind: &EventKind) -> bool {
        &self.kind == kind
    }

    /// The property stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Whether a property is stored under `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The property under `key`, if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// The property under `key`, if it is an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// The property under `key`, if it is a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// The `tag` of an XML element event.
    pub fn tag(&self) -> Option<&str> {
        self.get_str("tag")
    }

    /// The event this one was derived from.
    pub fn source(&self) -> Option<&Event> {
        self.get(SOURCE).and_then(Value::as_event)
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties, `source` included.
    pub fn len(&self) -> usize {
        self.properties.0.len()
    }

    /// Whether the event has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.0.is_empty()
    }

    /// Compare property maps, ignoring kind.
    pub fn same_properties(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.properties, &other.properties)
            || self.properties.same_as(&other.properties)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.same_properties(other)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind)?;
        f.debug_map()
            .entries(self.properties.0.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// Builder for events whose kind may require properties.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    kind: EventKind,
    properties: Properties,
}

impl EventBuilder {
    /// Set a property, replacing any earlier value under `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.set(key.into(), value.into());
        self
    }

    /// Finish the event, checking the kind's required property.
    pub fn build(self) -> Result<Event, EventError> {
        if let Some(property) = self.kind.required_property() {
            if self.properties.get(property).is_none() {
                return Err(EventError::MissingProperty {
                    kind: self.kind,
                    property,
                });
            }
        }
        Ok(Event {
            kind: self.kind,
            properties: Arc::new(self.properties),
        })
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// A derivation in progress. The kind is fixed, so finishing cannot fail.
#[derive(Debug, Clone)]
pub struct Derived {
    event: Event,
}

impl Derived {
    /// Override a property on the copy.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event = self.event.with(key, value);
        self
    }

    /// The derived event.
    pub fn finish(self) -> Event {
        self.event
    }
}

impl From<Derived> for Event {
    fn from(derived: Derived) -> Self {
        derived.finish()
    }
}
