//! Trace serialization in the Chrome trace-event JSON array format.
//!
//! The output is line-oriented: one record object per line, each terminated
//! by a comma, with a trailing `{}` line so the final comma still yields a
//! syntactically valid array. Viewers (chrome://tracing, ui.perfetto.dev)
//! consume this shape directly. Per thread, one `ph:"M"` metadata record
//! names the thread, then every recorded span becomes a `ph:"B"`/`ph:"E"`
//! pair in per-thread chronological order, threads in registration order.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing a trace.
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("failed to create trace file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "capture")]
pub(crate) use enabled::{write_trace, write_trace_file};

#[cfg(feature = "capture")]
mod enabled {
    use super::DumpError;
    use crate::registry::ThreadEntry;
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::Path;

    /// Serialize `entries` as a complete trace document.
    ///
    /// The walk assumes no thread registers concurrently (the registry
    /// snapshot is taken under the registration mutex) and reads each
    /// chunk's published prefix; spans still in flight on a live thread are
    /// simply not yet visible. Valid output for zero threads and zero
    /// events.
    pub(crate) fn write_trace<W: Write>(
        writer: &mut W,
        entries: &[ThreadEntry],
    ) -> Result<(), DumpError> {
        let pid = std::process::id();

        writeln!(writer, "[")?;

        for entry in entries {
            write!(
                writer,
                "{{\"name\":\"thread_name\",\"cat\":\"P\",\"ph\":\"M\",\"pid\":{pid},\"tid\":{},\"args\":{{\"name\":",
                entry.info.tid
            )?;
            write_json_string(writer, &entry.info.name)?;
            writeln!(writer, "}}}},")?;
        }

        for entry in entries {
            let tid = entry.info.tid;
            for event in entry.log.events() {
                write!(writer, "{{\"name\":")?;
                write_json_string(writer, &event.name)?;
                writeln!(
                    writer,
                    ",\"cat\":\"P\",\"ph\":\"B\",\"pid\":{pid},\"tid\":{tid},\"ts\":{}}},",
                    event.begin
                )?;
                write!(writer, "{{\"name\":")?;
                write_json_string(writer, &event.name)?;
                writeln!(
                    writer,
                    ",\"cat\":\"P\",\"ph\":\"E\",\"pid\":{pid},\"tid\":{tid},\"ts\":{}}},",
                    event.end
                )?;
            }
        }

        // Empty record absorbs the trailing comma of the last real one.
        writeln!(writer, "{{}}")?;
        writeln!(writer, "]")?;
        Ok(())
    }

    /// Serialize `entries` to a file at `path`.
    pub(crate) fn write_trace_file(
        path: &Path,
        entries: &[ThreadEntry],
    ) -> Result<(), DumpError> {
        tracing::info!(path = %path.display(), "writing trace file");
        let file = File::create(path).map_err(|source| DumpError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        write_trace(&mut writer, entries)?;
        writer.flush()?;
        Ok(())
    }

    /// Write `s` as a JSON string literal, escaping as needed so arbitrary
    /// span and thread names keep the document parseable.
    fn write_json_string<W: Write>(writer: &mut W, s: &str) -> std::io::Result<()> {
        write!(writer, "\"")?;
        for ch in s.chars() {
            match ch {
                '"' => write!(writer, "\\\"")?,
                '\\' => write!(writer, "\\\\")?,
                '\n' => write!(writer, "\\n")?,
                '\r' => write!(writer, "\\r")?,
                '\t' => write!(writer, "\\t")?,
                c if c.is_control() => write!(writer, "\\u{:04x}", c as u32)?,
                c => write!(writer, "{c}")?,
            }
        }
        write!(writer, "\"")?;
        Ok(())
    }

}
