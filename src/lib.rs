//! microtrace - low-overhead in-process span tracer
//!
//! Records named duration events ("spans") from many threads with no locking
//! on the hot path, buffering them in per-thread chunk lists, and serializes
//! the complete timeline as a Chrome trace-event JSON file consumable by
//! `chrome://tracing` or <https://ui.perfetto.dev>.
//!
//! # Usage
//!
//! ```no_run
//! let _guard = microtrace::init(microtrace::TracerConfig::default());
//!
//! microtrace::register_thread("main");
//! {
//!     let _span = microtrace::span("load_config");
//!     // measured work...
//! }
//!
//! microtrace::dump("trace.json")?;
//! # Ok::<(), microtrace::DumpError>(())
//! ```
//!
//! Every thread that records spans must call [`register_thread`] once before
//! its first span; spans from unregistered threads are dropped with a single
//! process-wide warning. Dropping the [`TracerGuard`] returned by [`init`]
//! performs a final dump to the configured destination, so a trace survives
//! even without an explicit [`dump()`] call.
//!
//! # Usage contract
//!
//! Span recording is unsynchronized by design: each thread appends to its own
//! buffer, and `dump` walks those buffers from whatever thread calls it. A
//! dump that races live recording is safe (it observes a consistent prefix of
//! each thread's events), but a *complete* trace requires that all recording
//! has quiesced -- join or park your workers before the final dump.
//!
//! # Feature flags
//!
//! - `capture` (default): record and serialize events.
//! - Without it (`default-features = false`), every API compiles to a no-op
//!   with zero runtime overhead.
//!
//! # Limitations
//!
//! Timestamps are 32-bit microseconds from process start and wrap silently
//! after ~71 minutes; sessions are expected to be short. Buffered events are
//! never freed while the tracer is alive, and traces do not persist across
//! process restarts.

#[cfg(feature = "capture")]
mod chunk;
#[cfg(feature = "capture")]
mod clock;
#[cfg(feature = "capture")]
mod registry;

pub mod dump;
pub mod span;
pub mod tracer;

pub use dump::DumpError;
pub use span::{span, SpanGuard, SpanName};
pub use tracer::{dump, init, register_thread, Tracer, TracerConfig, TracerGuard};
