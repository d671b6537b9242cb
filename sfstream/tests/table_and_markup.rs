mod common;

use common::{collect_ok, split};
use pretty_assertions::assert_eq;
use sfstream::{
    Collector, Event, EventKind, EventStreamExt, LoggingStage, PassEvent, StreamError, Value,
    block_check, events,
    filters::column_headers::{COLUMN_HEADERS, HEADER, HEADERS},
    promote_first_row, streamfilter,
    testing::table_events,
    type_check, xml_collector, xml_region,
};

// ============================================================================
// Test: Column headers
// ============================================================================

fn sales() -> Vec<Result<Event, StreamError>> {
    table_events(
        "sales",
        &[
            &["region", "units", "price"],
            &["north", "10", "2.5"],
            &["south", "7", "3.0"],
        ],
    )
}

#[test]
fn header_row_is_promoted() {
    let out = collect_ok(sales().into_iter().pipe(promote_first_row()));

    let headers = Value::from(vec!["region", "units", "price"]);
    assert!(out[0].is(&EventKind::StartTable));
    assert_eq!(out[0].get(COLUMN_HEADERS), Some(&headers));
    assert_eq!(out[0].get_str("table_name"), Some("sales"));

    // The header row itself is gone: 2 data rows of 3 cells each remain.
    assert_eq!(out.len(), 1 + 2 * (1 + 3 + 1) + 1);
    assert!(out.last().is_some_and(|e| e.is(&EventKind::EndTable)));

    let rows: Vec<_> = out.iter().filter(|e| e.is(&EventKind::StartRow)).collect();
    assert!(rows.iter().all(|row| row.get(HEADERS) == Some(&headers)));
}

#[test]
fn cells_know_their_header() {
    let out = collect_ok(sales().into_iter().pipe(promote_first_row()));
    let cells: Vec<_> = out
        .iter()
        .filter(|e| e.is(&EventKind::Cell))
        .map(|e| {
            let header = e.get_str(HEADER).unwrap_or("?");
            format!("{header}={}", e.get_str("value").unwrap_or("?"))
        })
        .collect();
    assert_eq!(
        cells,
        [
            "region=north",
            "units=10",
            "price=2.5",
            "region=south",
            "units=7",
            "price=3.0"
        ]
    );
}

#[test]
fn promoted_events_remember_their_source() {
    let out = collect_ok(sales().into_iter().pipe(promote_first_row()));
    let cell = out.iter().find(|e| e.is(&EventKind::Cell)).unwrap();
    let source = cell.source().unwrap();
    assert!(source.get(HEADER).is_none());
    assert_eq!(source.get_str("value"), Some("north"));
}

#[test]
fn events_around_tables_pass_through() {
    let mut source = vec![Ok(Event::generic().with("value", "before"))];
    source.extend(sales());
    source.push(Ok(Event::generic().with("value", "after")));
    let out = collect_ok(source.into_iter().pipe(promote_first_row()));
    assert_eq!(out.first().and_then(|e| e.get_str("value")), Some("before"));
    assert_eq!(out.last().and_then(|e| e.get_str("value")), Some("after"));
}

#[test]
fn promotion_composes_with_filters() {
    let only_cells = streamfilter(PassEvent).check(type_check([EventKind::Cell]));
    let out = collect_ok(
        sales()
            .into_iter()
            .pipe(promote_first_row())
            .pipe(LoggingStage::new("cells"))
            .pipe(only_cells),
    );
    assert_eq!(out.len(), 6);
    assert!(out.iter().all(|e| e.has(HEADER)));
}

// ============================================================================
// Test: XML regions
// ============================================================================

fn document() -> Vec<Event> {
    vec![
        Event::start_element("library"),
        Event::start_element("book"),
        Event::start_element("title"),
        Event::text_node("Dune"),
        Event::end_element("title"),
        Event::end_element("book"),
        Event::start_element("book"),
        Event::start_element("title"),
        Event::text_node("Emma"),
        Event::end_element("title"),
        Event::end_element("book"),
        Event::end_element("library"),
    ]
}

fn titles(out: impl IntoIterator<Item = Result<Event, StreamError>>) -> Vec<String> {
    collect_ok(out)
        .iter()
        .filter(|e| e.is(&EventKind::TextNode))
        .filter_map(|e| e.get_str("text").map(str::to_owned))
        .collect()
}

#[test]
fn region_covers_the_whole_element() {
    let region = collect_ok(xml_region(events(document())));
    assert_eq!(region.len(), document().len());
    assert_eq!(region.last().and_then(Event::tag), Some("library"));
}

#[test]
fn every_book_is_its_own_region() {
    let books = Collector::new(block_check(EventKind::StartElement))
        .for_each_segment(|segment| {
            let region = xml_region(segment);
            let count = region.count();
            std::iter::once(Ok(Event::generic().with("events", count)))
        });
    let out = collect_ok(events(document().into_iter().skip(1).take(10)).pipe(books));
    let counts: Vec<_> = out.iter().filter_map(|e| e.get_int("events")).collect();
    assert_eq!(counts, [5, 5]);
}

#[test]
fn collector_hands_the_region_to_the_handler() {
    let out = events(document()).pipe(xml_collector(|region| region));
    assert_eq!(titles(out), ["Dune", "Emma"]);
}

#[test]
fn region_must_open_with_an_element() {
    let (out, error) = split(xml_region(events([Event::text_node("stray")])));
    assert!(out.is_empty());
    assert!(matches!(
        error,
        Some(StreamError::UnexpectedEvent { expected: "StartElement", .. })
    ));
}
