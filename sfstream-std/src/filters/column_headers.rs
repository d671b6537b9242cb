//! Column-header promotion.
//!
//! Turns the first row of every table into column headers: the `StartTable`
//! gets a `column_headers` list, every later `StartRow` gets `headers` and a
//! renumbered `row_index`, and every `Cell` gets the `header` of its column.

use sfstream_core::{
    BlockCheck, Collector, Event, EventKind, EventResult, EventStream, ForEachSegment, Segment,
    SharedStream, StreamError, Value, block_check, until_match,
};
use std::{cell::RefCell, iter};

/// Property holding the header list on `StartTable`.
pub const COLUMN_HEADERS: &str = "column_headers";
/// Property holding the header list on `StartRow`.
pub const HEADERS: &str = "headers";
/// Property holding a cell's header.
pub const HEADER: &str = "header";

/// The promoted header row. Lookups out of range give `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderRow(Vec<String>);

impl HeaderRow {
    /// Headers in column order.
    pub fn new(headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(headers.into_iter().map(Into::into).collect())
    }

    /// Read the headers from the cells of one row.
    pub fn from_row<'e>(row: impl IntoIterator<Item = &'e Event>) -> Self {
        Self(
            row.into_iter()
                .filter(|event| event.is(&EventKind::Cell))
                .map(|cell| cell.get("value").map(ToString::to_string).unwrap_or_default())
                .collect(),
        )
    }

    /// The header of column `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// The header of column `index`, or `default` past the last column.
    pub fn get_or<'h>(&'h self, index: usize, default: &'h str) -> &'h str {
        self.get(index).unwrap_or(default)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the header row had no cells.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Headers in column order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn to_value(&self) -> Value {
        Value::from(self.0.clone())
    }
}

/// A collector that promotes the first row of every table.
pub fn promote_first_row<'a>()
-> Collector<BlockCheck, ForEachSegment<fn(Segment<'a>) -> EventStream<'a>>> {
    Collector::new(block_check(EventKind::StartTable))
        .for_each_segment(header_wrapper::<Segment<'a>> as fn(Segment<'a>) -> EventStream<'a>)
}

/// Promote the first row of the table at the head of `source`.
///
/// The first event must be a `StartTable`. Events between it and the first
/// row are kept. A table without rows gets an empty header list.
pub fn header_wrapper<'a, I>(source: I) -> EventStream<'a>
where
    I: IntoIterator<Item = EventResult>,
    I::IntoIter: 'a,
{
    let mut source = SharedStream::new(source);
    let start_table = match source.next() {
        None => return Box::new(iter::empty()),
        Some(Err(err)) => return Box::new(iter::once(Err(err))),
        Some(Ok(event)) => event,
    };
    if !start_table.is(&EventKind::StartTable) {
        return Box::new(iter::once(Err(StreamError::UnexpectedEvent {
            expected: "StartTable",
            found: start_table.kind().clone(),
        })));
    }

    let headers = RefCell::new(None);
    let mut leading = Vec::new();
    {
        let table = until_match(source.clone(), |event| event.is(&EventKind::EndTable), true);
        let first_row = Collector::new(block_check(EventKind::StartRow))
            .iterations(1)
            .stop_after(true)
            .for_each_segment(|row| {
                let row: Vec<_> = row.filter_map(Result::ok).collect();
                *headers.borrow_mut() = Some(HeaderRow::from_row(&row));
                iter::empty()
            });
        for item in first_row.filter(table) {
            match item {
                Ok(event) => leading.push(event),
                Err(err) => return Box::new(iter::once(Err(err))),
            }
        }
    }
    let headers = headers.into_inner().unwrap_or_default();

    #[cfg(feature = "tracing")]
    tracing::trace!(headers = headers.len(), leading = leading.len(), "promoted header row");

    let start_table = start_table
        .derive()
        .with(COLUMN_HEADERS, headers.to_value())
        .finish();

    let mut row_index = 0;
    let rows = source.map(move |item| {
        item.map(|event| {
            if event.is(&EventKind::StartRow) {
                let row = event
                    .derive()
                    .with(HEADERS, headers.to_value())
                    .with("row_index", row_index)
                    .finish();
                row_index += 1;
                return row;
            }
            if !event.is(&EventKind::Cell) {
                return event;
            }
            let header = event
                .get_int("column_index")
                .and_then(|index| usize::try_from(index).ok())
                .and_then(|index| headers.get(index));
            match header {
                Some(header) => event.derive_with(HEADER, header),
                None => event,
            }
        })
    });

    Box::new(
        iter::once(Ok(start_table))
            .chain(leading.into_iter().map(Ok))
            .chain(rows),
    )
}
