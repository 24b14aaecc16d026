//! Integration tests for the emitted trace document structure.
//!
//! Covers the documented shape: metadata records first in registration
//! order, B/E pairs per recorded span, the trailing empty record, and the
//! round-trip property that the whole document parses with serde_json.

#![cfg(feature = "capture")]

mod common;

use microtrace::Tracer;
use std::sync::Arc;

/// Register a worker on `tracer` and run `work` on it to completion.
fn on_registered_thread(tracer: &Arc<Tracer>, name: &'static str, work: impl FnOnce() + Send) {
    let tracer = Arc::clone(tracer);
    std::thread::scope(|scope| {
        scope.spawn(move || {
            tracer.register_thread(name);
            work();
        });
    });
}

#[test]
fn test_empty_tracer_dumps_valid_empty_document() {
    let tracer = Arc::new(Tracer::new());
    let records = common::dump_records(&tracer);
    assert!(records.is_empty(), "no threads, no records: {records:?}");
}

#[test]
fn test_document_is_line_oriented_with_trailing_empty_record() {
    let tracer = Arc::new(Tracer::new());
    on_registered_thread(&tracer, "worker", || {
        let _span = microtrace::span("op");
    });

    let text = common::dump_to_string(&tracer);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.first(), Some(&"["));
    assert_eq!(lines.last(), Some(&"]"));
    assert_eq!(lines[lines.len() - 2], "{}");
    // One record per line, every real record comma-terminated.
    for line in &lines[1..lines.len() - 2] {
        assert!(line.ends_with("},"), "unterminated record line: {line}");
    }
}

#[test]
fn test_every_span_yields_matching_begin_end_pair() {
    let tracer = Arc::new(Tracer::new());
    on_registered_thread(&tracer, "worker", || {
        for _ in 0..5 {
            let _span = microtrace::span("step");
        }
    });

    let records = common::dump_records(&tracer);
    let tid = common::tid_of(&records, "worker");
    let pid = records[0]["pid"].as_u64().unwrap();
    let events = common::event_records(&records);
    assert_eq!(events.len(), 10);

    for pair in events.chunks(2) {
        let (begin, end) = (pair[0], pair[1]);
        assert_eq!(begin["ph"], "B");
        assert_eq!(end["ph"], "E");
        assert_eq!(begin["name"], end["name"]);
        assert_eq!(begin["name"], "step");
        assert_eq!(begin["cat"], "P");
        assert_eq!(begin["pid"].as_u64().unwrap(), pid);
        assert_eq!(begin["tid"].as_u64().unwrap(), tid);
        assert!(end["ts"].as_u64().unwrap() >= begin["ts"].as_u64().unwrap());
    }
}

#[test]
fn test_events_appear_in_destruction_order() {
    let tracer = Arc::new(Tracer::new());
    on_registered_thread(&tracer, "worker", || {
        let outer = microtrace::span("outer");
        {
            let _inner = microtrace::span("inner");
        }
        drop(outer);
        let _after = microtrace::span("after");
    });

    let records = common::dump_records(&tracer);
    let begins: Vec<&str> = common::event_records(&records)
        .iter()
        .filter(|r| r["ph"] == "B")
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(begins, ["inner", "outer", "after"]);
}

#[test]
fn test_zero_length_span_is_recorded() {
    let tracer = Arc::new(Tracer::new());
    on_registered_thread(&tracer, "worker", || {
        drop(microtrace::span("instant"));
    });

    let records = common::dump_records(&tracer);
    let events = common::event_records(&records);
    assert_eq!(events.len(), 2);
    assert!(events[1]["ts"].as_u64().unwrap() >= events[0]["ts"].as_u64().unwrap());
}

#[test]
fn test_awkward_names_survive_round_trip() {
    let tracer = Arc::new(Tracer::new());
    let name = "quote\" slash\\ newline\n tab\t done";
    on_registered_thread(&tracer, "worker", move || {
        let _span = microtrace::span(name.to_string());
    });

    let records = common::dump_records(&tracer);
    let events = common::event_records(&records);
    assert_eq!(events[0]["name"].as_str().unwrap(), name);
    assert_eq!(events[1]["name"].as_str().unwrap(), name);
}

#[test]
fn test_thread_names_are_escaped_too() {
    let tracer = Arc::new(Tracer::new());
    let tracer_ref = Arc::clone(&tracer);
    std::thread::scope(|scope| {
        scope.spawn(move || {
            tracer_ref.register_thread("io \"reader\"");
        });
    });

    let records = common::dump_records(&tracer);
    let metadata = common::metadata_records(&records);
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0]["args"]["name"], "io \"reader\"");
    assert_eq!(metadata[0]["name"], "thread_name");
    assert_eq!(metadata[0]["cat"], "P");
}
