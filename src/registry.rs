//! Process-wide thread registry and the per-thread recording slot.
//!
//! [`ThreadRegistry`] maps every registered thread to its identity and its
//! event log, in registration order, under a single mutex that is held only
//! during registration and dumping. The span hot path never touches it: once
//! registered, a thread records through a thread-local handle to its own log.

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use crate::chunk::{DurationEvent, EventChunk, ThreadLog};

/// Identity of a registered thread. Immutable after registration.
#[derive(Debug, Clone)]
pub(crate) struct ThreadInfo {
    /// Host OS thread id.
    pub tid: u64,
    /// Human-readable name, shown by trace viewers.
    pub name: String,
}

/// One registered thread: identity plus its event log.
#[derive(Clone)]
pub(crate) struct ThreadEntry {
    pub info: ThreadInfo,
    pub log: Arc<ThreadLog>,
}

/// Registration-order table of every thread that has called
/// [`register`](ThreadRegistry::register).
pub(crate) struct ThreadRegistry {
    threads: Mutex<Vec<ThreadEntry>>,
}

impl ThreadRegistry {
    pub(crate) fn new() -> Self {
        Self {
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Register the calling thread under `name`.
    ///
    /// Allocates the thread's log, appends the registry entry, and repoints
    /// the calling thread's recording slot -- one critical section, so the
    /// table never holds a half-registered thread. Calling this twice from
    /// one thread creates a second, shadow entry and orphans the first log's
    /// slot binding; that is the caller's responsibility, not validated here.
    pub(crate) fn register(&self, name: String) {
        let log = ThreadLog::new();
        let entry = ThreadEntry {
            info: ThreadInfo {
                tid: os_thread_id(),
                name,
            },
            log: Arc::clone(&log),
        };
        {
            let mut threads = self.threads.lock().expect("registry mutex poisoned");
            threads.push(entry);
        }
        bind_local(log);
    }

    /// Clone the entry table for traversal, in registration order.
    ///
    /// Taking the same mutex as `register` means a registration can never
    /// interleave with a dump; chunk contents are still read lock-free via
    /// each chunk's published fill count.
    pub(crate) fn snapshot(&self) -> Vec<ThreadEntry> {
        self.threads.lock().expect("registry mutex poisoned").clone()
    }
}

/// The calling thread's recording handle, set by registration.
struct LocalSlot {
    /// Keeps the chunk chain alive independently of the registry.
    log: Arc<ThreadLog>,
    /// Current tail chunk; appends go here until it fills.
    tail: *const EventChunk,
}

thread_local! {
    static LOCAL: RefCell<Option<LocalSlot>> = const { RefCell::new(None) };
}

fn bind_local(log: Arc<ThreadLog>) {
    let tail = log.head() as *const EventChunk;
    LOCAL.with(|slot| {
        *slot.borrow_mut() = Some(LocalSlot { log, tail });
    });
}

/// Append a completed event to the calling thread's log.
///
/// Returns `false` if the thread never registered (the event is dropped).
/// Lock-free: touches only thread-local state, except the one allocation on
/// chunk rollover.
pub(crate) fn record_local(event: DurationEvent) -> bool {
    LOCAL
        .try_with(|slot| {
            let mut slot = slot.borrow_mut();
            let Some(local) = slot.as_mut() else {
                return false;
            };
            // SAFETY: `tail` points into the chunk chain owned by
            // `local.log`, which the Arc keeps alive, and only the owning
            // thread mutates the chain.
            let tail = unsafe { &*local.tail };
            if let Err(event) = tail.try_push(event) {
                let next = tail.grow();
                // A freshly linked chunk is never full.
                let _ = next.try_push(event);
                local.tail = next as *const EventChunk;
            }
            true
        })
        // Thread-local storage is already gone during thread teardown;
        // treat it like an unregistered thread.
        .unwrap_or(false)
}

/// Whether the calling thread has a bound recording slot.
#[cfg(test)]
pub(crate) fn is_registered() -> bool {
    LOCAL
        .try_with(|slot| slot.borrow().is_some())
        .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn os_thread_id() -> u64 {
    // SAFETY: gettid has no preconditions and always succeeds.
    (unsafe { libc::gettid() }) as u64
}

/// Fallback for platforms without a stable numeric thread id syscall: a
/// process-unique logical id per thread.
#[cfg(not(target_os = "linux"))]
fn os_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_TID: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static TID: u64 = NEXT_TID.fetch_add(1, Ordering::Relaxed);
    }
    TID.with(|tid| *tid)
}
