mod common;

use common::{a_to, collect_ok, split, text};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sfstream::{
    BlockMatcher, BlockState, Collector, Event, EventContext, EventError, EventKind, EventResult,
    EventStreamExt, PartialBlock, StreamError, block_check, events,
    testing::{FailOn, RecordingHandler, value_events, values},
};
use std::cell::RefCell;

const SCENARIO: &str = "nnnnnabcdennnnnnn";

// ============================================================================
// Test: Round trip
// ============================================================================

proptest! {
    #[test]
    fn pass_through_collector_is_identity(input in "[abcen]{0,64}") {
        let out = Collector::new(a_to("e")).filter(value_events(&input));
        prop_assert_eq!(text(out), input.clone());

        let out = Collector::new(a_to("e"))
            .for_each_segment(|segment| segment)
            .filter(value_events(&input));
        prop_assert_eq!(text(out), input);
    }

    #[test]
    fn every_block_event_reaches_the_handler_once(input in "[abcen]{0,64}") {
        let recorder = RecordingHandler::new();
        let out = Collector::new(a_to("e"))
            .for_each_event(recorder.clone())
            .filter(value_events(&input));
        prop_assert_eq!(text(out), input.clone());

        // Blocks run from an `a` to the next `e`, or to the end of the input.
        let mut expected = String::new();
        let mut inside = false;
        for c in input.chars() {
            if !inside && c == 'a' {
                inside = true;
                expected.push(c);
            } else if inside {
                expected.push(c);
                inside = c != 'e';
            }
        }
        prop_assert_eq!(recorder.values(), expected);
    }
}

// ============================================================================
// Test: Scenario
// ============================================================================

#[test]
fn block_between_pass_through_spans() {
    let recorder = RecordingHandler::new();
    let out = value_events(SCENARIO)
        .into_iter()
        .pipe(Collector::new(a_to("e")).for_each_event(recorder.clone()));
    assert_eq!(text(out), SCENARIO);
    assert_eq!(recorder.values(), "abcde");
    assert_eq!(recorder.blocks(), 1);
}

#[test]
fn lifecycle_flags() {
    let recorder = RecordingHandler::new();
    let out = Collector::new(a_to("e"))
        .for_each_event(recorder.clone())
        .filter(value_events(SCENARIO));
    assert_eq!(out.count(), SCENARIO.len());
    assert_eq!(
        recorder.flags(),
        [
            (true, false),
            (false, false),
            (false, false),
            (false, false),
            (false, true)
        ]
    );
}

#[test]
fn event_index_restarts_per_block() {
    let recorder = RecordingHandler::new();
    let input = SCENARIO.repeat(3);
    let out = Collector::new(a_to("e"))
        .for_each_event(recorder.clone())
        .filter(value_events(&input));
    assert_eq!(out.count(), input.len());

    let seen = recorder.seen();
    let indices: Vec<_> = seen.iter().map(|ctx| ctx.index).collect();
    assert_eq!(indices, [0, 1, 2, 3, 4].repeat(3));
    let blocks: Vec<_> = seen.iter().map(|ctx| ctx.block).collect();
    assert_eq!(blocks, [[0; 5], [1; 5], [2; 5]].concat());
}

#[test]
fn trigger_is_not_offered_to_the_end_predicate() {
    let recorder = RecordingHandler::new();
    let out = Collector::new(a_to("a"))
        .for_each_event(recorder.clone())
        .filter(value_events("nanan"));
    assert_eq!(text(out), "nanan");
    assert_eq!(recorder.values(), "ana");
    assert_eq!(
        recorder.flags(),
        [(true, false), (false, false), (false, true)]
    );
}

#[test]
fn block_opened_by_the_last_event_is_first_and_last() {
    let recorder = RecordingHandler::new();
    let out = Collector::new(a_to("e"))
        .for_each_event(recorder.clone())
        .filter(value_events("nna"));
    assert_eq!(text(out), "nna");
    assert_eq!(recorder.flags(), [(true, true)]);
}

// ============================================================================
// Test: Iterations
// ============================================================================

#[test]
fn iterations_limit_collected_blocks() {
    let recorder = RecordingHandler::new();
    let input = SCENARIO.repeat(5);
    let out = Collector::new(a_to("e"))
        .iterations(2)
        .for_each_event(recorder.clone())
        .filter(value_events(&input));
    assert_eq!(text(out), input);
    assert_eq!(recorder.blocks(), 2);
    assert_eq!(recorder.values(), "abcdeabcde");
}

#[test]
fn stop_after_drops_everything_past_the_last_block() {
    let recorder = RecordingHandler::new();
    let input = SCENARIO.repeat(5);
    let out = Collector::new(a_to("e"))
        .iterations(2)
        .stop_after(true)
        .for_each_event(recorder.clone())
        .filter(value_events(&input));
    let expected = format!("{SCENARIO}nnnnnabcde");
    assert_eq!(text(out), expected);
    assert_eq!(recorder.blocks(), 2);
}

#[test]
fn zero_iterations_is_unbounded() {
    let recorder = RecordingHandler::new();
    let out = Collector::new(a_to("e"))
        .iterations(0)
        .stop_after(true)
        .for_each_event(recorder.clone())
        .filter(value_events(&SCENARIO.repeat(4)));
    assert_eq!(out.count(), SCENARIO.len() * 4);
    assert_eq!(recorder.blocks(), 4);
}

// ============================================================================
// Test: Pass function
// ============================================================================

#[test]
fn pass_function_only_sees_events_outside_blocks() {
    let input = SCENARIO.repeat(5);
    let out = Collector::new(a_to("e"))
        .pass_function(|event: Event| event.derive_with("value", "-"))
        .filter(value_events(&input));
    assert_eq!(text(out), input.replace('n', "-"));
}

#[test]
fn pass_function_errors_end_the_stream() {
    let out = Collector::new(a_to("e"))
        .pass_function(FailOn::value('x'))
        .filter(value_events("nabcenxnn"));
    let (events, error) = split(out);
    assert_eq!(values(&events), "nabcen");
    assert!(matches!(error, Some(StreamError::Handler(_))));
}

// ============================================================================
// Test: Segment delivery
// ============================================================================

#[test]
fn segments_are_delivered_in_order() {
    let seen = RefCell::new(Vec::new());
    let input = SCENARIO.repeat(5);
    let out = Collector::new(a_to("e"))
        .for_each_segment(|segment| {
            let block = segment.block();
            let events = collect_ok(segment);
            seen.borrow_mut().push((block, values(&events)));
            events.into_iter().map(Ok)
        })
        .filter(value_events(&input));
    assert_eq!(text(out), input);
    let seen = seen.into_inner();
    assert_eq!(seen.len(), 5);
    for (i, (block, run)) in seen.iter().enumerate() {
        assert_eq!((*block, run.as_str()), (i, "abcde"));
    }
}

#[test]
fn segment_handler_can_replace_the_block() {
    let out = Collector::new(a_to("e"))
        .for_each_segment(|segment| {
            let collected = segment.count();
            std::iter::once(Ok(Event::generic().with("value", collected)))
        })
        .filter(value_events(SCENARIO));
    assert_eq!(text(out), "nnnnn5nnnnnnn");
}

#[test]
fn segment_handler_that_skips_the_trigger_drops_it() {
    let out = Collector::new(a_to("e"))
        .iterations(1)
        .for_each_segment(|_segment| std::iter::empty())
        .filter(value_events(SCENARIO));
    assert_eq!(text(out), SCENARIO.replacen('a', "", 1));
}

#[test]
fn malformed_replacement_events_end_the_stream() {
    let out = Collector::new(a_to("e"))
        .for_each_segment(|segment| {
            segment.map(|item| -> EventResult {
                let event = item?;
                Ok(event.derive_as(EventKind::TextNode).build()?)
            })
        })
        .filter(value_events("nabcen"));
    let (events, error) = split(out);
    assert_eq!(values(&events), "n");
    assert!(matches!(
        error,
        Some(StreamError::Event(EventError::MissingProperty {
            property: "text",
            ..
        }))
    ));
}

#[test]
fn unread_block_events_return_to_the_scan() {
    let out = Collector::new(a_to("e"))
        .iterations(1)
        .for_each_segment(|segment| segment.take(1))
        .filter(value_events(SCENARIO));
    // `bcde` were never read by the handler and go through untouched.
    assert_eq!(text(out), SCENARIO);
}

// ============================================================================
// Test: Partial blocks
// ============================================================================

#[test]
fn unterminated_block_is_delivered() {
    let recorder = RecordingHandler::new();
    let out = Collector::new(a_to("e"))
        .for_each_event(recorder.clone())
        .filter(value_events("nnabc"));
    assert_eq!(text(out), "nnabc");
    assert_eq!(
        recorder.flags(),
        [(true, false), (false, false), (false, true)]
    );
}

#[test]
fn unterminated_block_can_fail() {
    let out = Collector::new(a_to("e"))
        .partial_block(PartialBlock::Error)
        .filter(value_events("nnabc"));
    let (events, error) = split(out);
    assert_eq!(values(&events), "nnabc");
    assert!(matches!(
        error,
        Some(StreamError::UnterminatedBlock { collected: 3 })
    ));
}

#[test]
fn failing_unterminated_block_never_flags_last() {
    let recorder = RecordingHandler::new();
    let out = Collector::new(a_to("e"))
        .partial_block(PartialBlock::Error)
        .for_each_event(recorder.clone())
        .filter(value_events("nnabc"));
    let (events, error) = split(out);
    assert_eq!(values(&events), "nnabc");
    assert_eq!(
        recorder.flags(),
        [(true, false), (false, false), (false, false)]
    );
    assert!(matches!(
        error,
        Some(StreamError::UnterminatedBlock { collected: 3 })
    ));
}

#[test]
fn handler_errors_inside_a_block_end_the_stream() {
    let out = Collector::new(a_to("e"))
        .for_each_event(|ctx: EventContext| {
            if ctx.event.get_str("value") == Some("c") {
                Err("bad block event")
            } else {
                Ok(ctx.event)
            }
        })
        .filter(value_events(SCENARIO));
    let (events, error) = split(out);
    assert_eq!(values(&events), "nnnnnab");
    assert_eq!(error.unwrap().to_string(), "handler error: bad block event");
}

// ============================================================================
// Test: Nested blocks
// ============================================================================

fn kinds(spec: &str) -> Vec<Event> {
    spec.chars()
        .map(|c| match c {
            'A' => Event::custom("A").with("value", c),
            'B' => Event::custom("B").with("value", c),
            _ => Event::generic().with("value", c),
        })
        .collect()
}

#[test]
fn matcher_tracks_nesting_depth() {
    let mut matcher = BlockMatcher::new(Some(EventKind::custom("A")), Some(EventKind::custom("B")));
    let complete: Vec<_> = kinds("AABABB").iter().map(|e| matcher.check(e)).collect();
    assert_eq!(complete, [false, false, false, false, false, true]);
    assert_eq!(matcher.state(), &BlockState::Closed);
}

#[test]
fn nested_blocks_are_collected_whole() {
    let recorder = RecordingHandler::new();
    let check = block_check(EventKind::custom("A"))
        .end(EventKind::custom("B"));
    let out = events(kinds("nAABABBnAnBBn"))
        .pipe(Collector::new(check).for_each_event(recorder.clone()));
    assert_eq!(text(out), "nAABABBnAnBBn");
    // The second block closes on the first `B`; the stray `B` that follows
    // passes through.
    assert_eq!(recorder.values(), "AABABBAnB");
    assert_eq!(recorder.blocks(), 2);
}

#[test]
fn block_check_pairs_table_kinds() {
    let recorder = RecordingHandler::new();
    let source = vec![
        Event::generic(),
        Event::start_table(),
        Event::start_row(),
        Event::end_row(),
        Event::end_table(),
        Event::generic(),
    ];
    let out = collect_ok(
        Collector::new(block_check(EventKind::StartTable))
            .for_each_event(recorder.clone())
            .filter(events(source)),
    );
    assert_eq!(out.len(), 6);
    assert_eq!(recorder.count(), 4);
    assert!(recorder.seen()[3].event.is(&EventKind::EndTable));
    assert!(recorder.seen()[3].last);
}
