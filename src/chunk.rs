//! Per-thread event storage: fixed-capacity chunks on a singly-linked list.
//!
//! Each registered thread owns a [`ThreadLog`]: a chain of [`EventChunk`]s it
//! appends to without taking any lock. Appending is amortized allocation-free;
//! a new chunk is allocated only when the current one fills. Chunks are never
//! compacted or freed while the tracer is alive -- the whole chain is released
//! in bulk when the last handle to the log is dropped, so the hot path never
//! pays deallocation cost.
//!
//! Cross-thread visibility: the fill count of each chunk is published with a
//! release store and read with an acquire load, so a dumper that walks the
//! chain while the owner is still recording observes a consistent prefix of
//! fully written events. A complete trace still requires the documented
//! contract that recording has quiesced before the dump.

use std::borrow::Cow;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Events per chunk. At ~40 bytes per event a full chunk stays within a few
/// dozen kilobytes, one small allocation per rollover.
pub(crate) const CHUNK_CAPACITY: usize = 682;

/// A completed span: name plus begin/end timestamps in epoch microseconds.
///
/// `begin <= end` holds up to clock wraparound; both stamps are taken within
/// one guard's lifetime on one thread. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DurationEvent {
    pub name: Cow<'static, str>,
    pub begin: u32,
    pub end: u32,
}

impl Default for DurationEvent {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(""),
            begin: 0,
            end: 0,
        }
    }
}

/// A fixed-capacity slab of events plus a link to its successor.
pub(crate) struct EventChunk {
    slots: Box<[UnsafeCell<DurationEvent>]>,
    /// Number of published events. Stored with `Release` by the owning
    /// thread, loaded with `Acquire` by readers.
    len: AtomicUsize,
    /// Set at most once, by the owning thread, on rollover.
    next: OnceLock<Box<EventChunk>>,
}

// SAFETY: slots at indices >= len are touched only by the owning thread.
// Slots below len are written before len is release-published and never
// mutated again, so any thread that acquires len reads only fully
// initialized, immutable events.
unsafe impl Sync for EventChunk {}

impl EventChunk {
    pub(crate) fn new() -> Self {
        Self {
            slots: (0..CHUNK_CAPACITY)
                .map(|_| UnsafeCell::new(DurationEvent::default()))
                .collect(),
            len: AtomicUsize::new(0),
            next: OnceLock::new(),
        }
    }

    /// Number of events published in this chunk.
    pub(crate) fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// The successor chunk, if this one has rolled over.
    pub(crate) fn next(&self) -> Option<&EventChunk> {
        self.next.get().map(|boxed| &**boxed)
    }

    /// Append an event. Owner thread only.
    ///
    /// Returns the event back if the chunk is full so the caller can roll
    /// over to a fresh chunk.
    pub(crate) fn try_push(&self, event: DurationEvent) -> Result<(), DurationEvent> {
        // Only the owner advances len, so a relaxed load reads its own store.
        let index = self.len.load(Ordering::Relaxed);
        if index == CHUNK_CAPACITY {
            return Err(event);
        }
        // SAFETY: `index` is not yet published, so no reader touches this
        // slot, and only the owning thread writes slots at all.
        unsafe {
            *self.slots[index].get() = event;
        }
        self.len.store(index + 1, Ordering::Release);
        Ok(())
    }

    /// Link and return a successor chunk. Owner thread only.
    pub(crate) fn grow(&self) -> &EventChunk {
        self.next.get_or_init(|| Box::new(EventChunk::new()))
    }

    /// Iterate the published events of this chunk, in append order.
    pub(crate) fn events(&self) -> impl Iterator<Item = &DurationEvent> {
        let len = self.len();
        // SAFETY: slots below the acquired len are fully written and never
        // mutated again.
        self.slots[..len].iter().map(|slot| unsafe { &*slot.get() })
    }
}

/// A thread's append-only event log: the head of its chunk chain.
///
/// Shared between the owning thread (which appends through its thread-local
/// handle) and the registry (which hands it to the dumper for read-only
/// traversal).
pub(crate) struct ThreadLog {
    head: EventChunk,
}

impl ThreadLog {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            head: EventChunk::new(),
        })
    }

    pub(crate) fn head(&self) -> &EventChunk {
        &self.head
    }

    /// Iterate every published event across all chunks, in record order.
    pub(crate) fn events(&self) -> impl Iterator<Item = &DurationEvent> {
        ChunkIter {
            chunk: Some(&self.head),
        }
        .flat_map(|chunk| chunk.events())
    }
}

struct ChunkIter<'a> {
    chunk: Option<&'a EventChunk>,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = &'a EventChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.chunk?;
        self.chunk = current.next();
        Some(current)
    }
}
