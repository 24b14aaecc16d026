//! Shared helpers for integration tests.
//!
//! Dumps tracers to memory and parses the trace-event document with
//! serde_json, so tests assert on records rather than raw text.

#![allow(dead_code)]

use microtrace::Tracer;
use serde_json::Value;

/// Dump `tracer` to an in-memory buffer and return the document text.
pub fn dump_to_string(tracer: &Tracer) -> String {
    let mut buf = Vec::new();
    tracer.dump_to(&mut buf).expect("in-memory dump should succeed");
    String::from_utf8(buf).expect("trace output should be UTF-8")
}

/// Parse a trace document into its record objects, excluding the trailing
/// empty record.
pub fn parse_records(text: &str) -> Vec<Value> {
    let parsed: Value = serde_json::from_str(text).expect("trace should parse as JSON");
    let array = parsed.as_array().expect("trace should be a JSON array");
    let (last, records) = array.split_last().expect("trace array is never empty");
    assert_eq!(
        last,
        &serde_json::json!({}),
        "trace must end with the empty record"
    );
    records.to_vec()
}

/// Dump and parse in one step.
pub fn dump_records(tracer: &Tracer) -> Vec<Value> {
    parse_records(&dump_to_string(tracer))
}

/// The `ph:"M"` thread-metadata records, in document order.
pub fn metadata_records(records: &[Value]) -> Vec<&Value> {
    records.iter().filter(|r| r["ph"] == "M").collect()
}

/// The `ph:"B"`/`ph:"E"` event records, in document order.
pub fn event_records(records: &[Value]) -> Vec<&Value> {
    records
        .iter()
        .filter(|r| r["ph"] == "B" || r["ph"] == "E")
        .collect()
}

/// Registered thread name -> tid, taken from the metadata records.
pub fn tid_of(records: &[Value], thread_name: &str) -> u64 {
    metadata_records(records)
        .iter()
        .find(|r| r["args"]["name"] == thread_name)
        .unwrap_or_else(|| panic!("no metadata record for thread {thread_name:?}"))["tid"]
        .as_u64()
        .expect("tid should be an unsigned integer")
}
