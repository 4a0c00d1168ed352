//! Checkpoint emission on stdout.
//!
//! The orchestrator reads the last stdout line as the state to resume
//! from. It is written in the rendering Singer taps and targets use:
//! `", "` / `": "` separators, non-ASCII escaped as `\uXXXX`, keys in
//! input order.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;

struct SingerFormatter;

impl Formatter for SingerFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Render `value` the way the state line is written.
///
/// # Errors
///
/// Propagates serializer failures as [`io::Error`].
pub fn to_state_line(value: &Value) -> io::Result<String> {
    let mut ser = serde_json::Serializer::with_formatter(Vec::new(), SingerFormatter);
    value.serialize(&mut ser).map_err(io::Error::from)?;
    String::from_utf8(ser.into_inner()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write the final checkpoint, if there is one, as a single line and flush.
///
/// # Errors
///
/// Returns any write or flush error from `writer`.
pub fn emit_state<W: Write>(writer: &mut W, state: Option<&Value>) -> io::Result<()> {
    let Some(state) = state else {
        return Ok(());
    };
    let line = to_state_line(state)?;
    tracing::debug!(state = %line, "Emitting state");
    writeln!(writer, "{line}")?;
    writer.flush()
}
