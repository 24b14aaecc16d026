//! Monotonic microsecond clock.
//!
//! All trace timestamps are microseconds relative to a process-start epoch,
//! captured exactly once at first use. The counter is 32 bits wide and wraps
//! silently after ~71 minutes -- an accepted limitation for short profiling
//! sessions, kept from the wire format rather than corrected here.

use once_cell::sync::Lazy;
use std::time::Instant;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Elapsed microseconds since the process-start epoch.
pub(crate) fn now() -> u32 {
    EPOCH.elapsed().as_micros() as u32
}

/// Pin the epoch without reading the clock.
///
/// Called during tracer init so the epoch reflects process start rather than
/// the first recorded span.
pub(crate) fn pin_epoch() {
    Lazy::force(&EPOCH);
}
