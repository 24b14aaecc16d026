//! Tracer facade and process lifecycle.
//!
//! [`Tracer`] owns the thread registry for its lifetime; the process-wide
//! instance behind [`Tracer::global`] lives until process exit, and the free
//! functions at the crate root proxy to it. [`init`] returns a
//! [`TracerGuard`] whose drop performs the final dump -- the defined
//! teardown hook replacing reliance on static destruction order.

use std::path::PathBuf;

/// Configuration for the process-wide tracer lifecycle.
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Destination of the automatic dump performed when the guard drops.
    pub default_path: PathBuf,
    /// Whether dropping the guard performs that final dump.
    pub dump_on_teardown: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            default_path: PathBuf::from("trace.json"),
            dump_on_teardown: true,
        }
    }
}

#[cfg(feature = "capture")]
pub use enabled::{dump, init, register_thread, Tracer, TracerGuard};

#[cfg(feature = "capture")]
mod enabled {
    use super::TracerConfig;
    use crate::dump::DumpError;
    use crate::registry::ThreadRegistry;
    use crate::{clock, dump as dump_mod};
    use once_cell::sync::Lazy;
    use std::io::Write;
    use std::path::Path;

    static GLOBAL_TRACER: Lazy<Tracer> = Lazy::new(Tracer::new);

    /// Owns the thread registry and, transitively, every thread's chunk
    /// memory, for its own lifetime. The process-wide instance is never
    /// dropped; standalone instances (tests) release everything in bulk on
    /// drop.
    pub struct Tracer {
        registry: ThreadRegistry,
    }

    impl Tracer {
        pub fn new() -> Self {
            clock::pin_epoch();
            Self {
                registry: ThreadRegistry::new(),
            }
        }

        /// The process-wide tracer instance.
        pub fn global() -> &'static Tracer {
            &GLOBAL_TRACER
        }

        /// Register the calling thread under `name`.
        ///
        /// Must be called once per thread before it records spans; spans
        /// from unregistered threads are dropped with a one-time warning.
        pub fn register_thread(&self, name: impl Into<String>) {
            self.registry.register(name.into());
        }

        /// Serialize the accumulated trace to `path`. Callable repeatedly.
        pub fn dump(&self, path: impl AsRef<Path>) -> Result<(), DumpError> {
            let entries = self.registry.snapshot();
            dump_mod::write_trace_file(path.as_ref(), &entries)
        }

        /// Serialize the accumulated trace to an arbitrary writer.
        pub fn dump_to<W: Write>(&self, writer: &mut W) -> Result<(), DumpError> {
            let entries = self.registry.snapshot();
            dump_mod::write_trace(writer, &entries)
        }

        /// Names of every recorded event, registration order then record
        /// order. Test observability only.
        #[cfg(test)]
        pub(crate) fn recorded_events(&self) -> Vec<String> {
            self.registry
                .snapshot()
                .iter()
                .flat_map(|entry| {
                    entry
                        .log
                        .events()
                        .map(|event| event.name.to_string())
                        .collect::<Vec<_>>()
                })
                .collect()
        }
    }

    impl Default for Tracer {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Guard for the process tracer lifecycle.
    ///
    /// Dropping it performs the final dump to the configured destination, so
    /// a trace is captured even when no explicit [`dump`] call was made.
    pub struct TracerGuard {
        config: TracerConfig,
    }

    impl Drop for TracerGuard {
        fn drop(&mut self) {
            if !self.config.dump_on_teardown {
                return;
            }
            if let Err(e) = Tracer::global().dump(&self.config.default_path) {
                tracing::error!("teardown trace dump failed: {e}");
            }
        }
    }

    /// Install the process tracer lifecycle.
    ///
    /// Pins the clock epoch and returns the guard that dumps on drop. Keep
    /// the guard alive for the duration of the traced run:
    ///
    /// ```no_run
    /// let _guard = microtrace::init(microtrace::TracerConfig::default());
    /// microtrace::register_thread("main");
    /// // traced work...
    /// ```
    pub fn init(config: TracerConfig) -> TracerGuard {
        Lazy::force(&GLOBAL_TRACER);
        TracerGuard { config }
    }

    /// Register the calling thread with the process-wide tracer.
    pub fn register_thread(name: impl Into<String>) {
        Tracer::global().register_thread(name);
    }

    /// Dump the process-wide tracer's accumulated trace to `path`.
    pub fn dump(path: impl AsRef<Path>) -> Result<(), DumpError> {
        Tracer::global().dump(path)
    }
}

#[cfg(not(feature = "capture"))]
pub use disabled::{dump, init, register_thread, Tracer, TracerGuard};

#[cfg(not(feature = "capture"))]
mod disabled {
    use super::TracerConfig;
    use crate::dump::DumpError;
    use std::io::Write;
    use std::path::Path;

    /// No-op tracer when capture is disabled.
    pub struct Tracer {
        _private: (),
    }

    static GLOBAL_TRACER: Tracer = Tracer { _private: () };

    impl Tracer {
        pub fn new() -> Self {
            Self { _private: () }
        }

        pub fn global() -> &'static Tracer {
            &GLOBAL_TRACER
        }

        pub fn register_thread(&self, _name: impl Into<String>) {}

        pub fn dump(&self, _path: impl AsRef<Path>) -> Result<(), DumpError> {
            Ok(())
        }

        pub fn dump_to<W: Write>(&self, _writer: &mut W) -> Result<(), DumpError> {
            Ok(())
        }
    }

    impl Default for Tracer {
        fn default() -> Self {
            Self::new()
        }
    }

    /// No-op lifecycle guard when capture is disabled.
    pub struct TracerGuard {
        _private: (),
    }

    pub fn init(_config: TracerConfig) -> TracerGuard {
        TracerGuard { _private: () }
    }

    pub fn register_thread(_name: impl Into<String>) {}

    pub fn dump(_path: impl AsRef<Path>) -> Result<(), DumpError> {
        Ok(())
    }
}
