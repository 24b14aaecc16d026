//! Scoped span guards -- the sole event-producing API.
//!
//! A [`SpanGuard`] stamps its begin time at construction and its end time when
//! it drops, then appends the completed event to the calling thread's log.
//! Recording never fails toward the caller: a span on a thread that never
//! registered is dropped, with a single process-wide warning the first time
//! it happens anywhere.

use std::borrow::Cow;

/// A span name; accepts `&'static str`, `String`, or `Cow<'static, str>`.
///
/// Static names are borrowed for the life of the trace; owned names are
/// copied once into the event and live until the tracer is dropped.
pub struct SpanName(pub(crate) Cow<'static, str>);

impl From<&'static str> for SpanName {
    fn from(name: &'static str) -> Self {
        SpanName(Cow::Borrowed(name))
    }
}

impl From<String> for SpanName {
    fn from(name: String) -> Self {
        SpanName(Cow::Owned(name))
    }
}

impl From<Cow<'static, str>> for SpanName {
    fn from(name: Cow<'static, str>) -> Self {
        SpanName(name)
    }
}

/// Open a span over the enclosing scope.
///
/// The returned guard records one duration event when it drops. Zero-length
/// spans are valid. Must not outlive the work it measures:
///
/// ```
/// let _guard = microtrace::span("parse_manifest");
/// // measured work...
/// ```
#[cfg(feature = "capture")]
pub fn span(name: impl Into<SpanName>) -> SpanGuard {
    SpanGuard {
        name: name.into().0,
        begin: crate::clock::now(),
    }
}

/// Guard that appends a completed event to the calling thread's log on drop.
#[cfg(feature = "capture")]
pub struct SpanGuard {
    name: Cow<'static, str>,
    begin: u32,
}

#[cfg(feature = "capture")]
impl Drop for SpanGuard {
    fn drop(&mut self) {
        let end = crate::clock::now();
        let name = std::mem::replace(&mut self.name, Cow::Borrowed(""));
        let recorded = crate::registry::record_local(crate::chunk::DurationEvent {
            name,
            begin: self.begin,
            end,
        });
        if !recorded {
            warn_unregistered();
        }
    }
}

#[cfg(feature = "capture")]
static UNREGISTERED_WARNING: std::sync::Once = std::sync::Once::new();

/// Warn exactly once per process, across all threads and all dropped events.
#[cfg(feature = "capture")]
fn warn_unregistered() {
    UNREGISTERED_WARNING.call_once(|| {
        tracing::warn!("span dropped: did you forget to call register_thread()?");
    });
}

/// Open a span (no-op when capture is disabled).
#[cfg(not(feature = "capture"))]
pub fn span(name: impl Into<SpanName>) -> SpanGuard {
    let _ = name.into();
    SpanGuard { _private: () }
}

/// No-op guard when capture is disabled.
#[cfg(not(feature = "capture"))]
pub struct SpanGuard {
    _private: (),
}

#[cfg(all(test, feature = "capture"))]
mod tests {
    use super::*;
    use crate::tracer::Tracer;

    #[test]
    fn test_span_records_on_registered_thread() {
        let tracer = std::sync::Arc::new(Tracer::new());
        let worker = std::sync::Arc::clone(&tracer);
        std::thread::spawn(move || {
            worker.register_thread("worker");
            {
                let _guard = span("outer");
                let _inner = span("inner");
            }
        })
        .join()
        .unwrap();

        let events = tracer.recorded_events();
        // Guards drop innermost-first.
        assert_eq!(events, ["inner", "outer"]);
    }

    #[test]
    fn test_owned_name_is_copied() {
        let tracer = std::sync::Arc::new(Tracer::new());
        let worker = std::sync::Arc::clone(&tracer);
        std::thread::spawn(move || {
            worker.register_thread("worker");
            let transient = format!("request-{}", 42);
            let _guard = span(transient);
        })
        .join()
        .unwrap();

        assert_eq!(tracer.recorded_events(), ["request-42"]);
    }

    #[test]
    fn test_unregistered_span_warns_once() {
        std::thread::spawn(|| {
            let _a = span("dropped");
            drop(_a);
            let _b = span("also_dropped");
        })
        .join()
        .unwrap();

        // Two drops, one warning; further drops anywhere reuse it.
        assert!(UNREGISTERED_WARNING.is_completed());
    }
}
