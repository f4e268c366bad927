use std::io::BufRead;

use gerrymander_types::Record;
use serde_json::Value;

use crate::Result;

/// Outcome of decoding one output line.
#[derive(Debug)]
pub enum Decoded {
    Record(Record),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    InvalidUtf8,
    InvalidJson(String),
    NotAnObject(&'static str),
}

/// Counters for one decoded stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub records: usize,
    pub skipped: usize,
}

pub fn decode_line(line: &[u8]) -> Decoded {
    let Ok(text) = std::str::from_utf8(line) else {
        return Decoded::Skip(SkipReason::InvalidUtf8);
    };
    let text = text.trim();
    if text.is_empty() {
        return Decoded::Skip(SkipReason::Blank);
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(record)) => Decoded::Record(record),
        Ok(other) => Decoded::Skip(SkipReason::NotAnObject(json_type_name(&other))),
        Err(err) => Decoded::Skip(SkipReason::InvalidJson(err.to_string())),
    }
}

/// Read `reader` line by line, handing each JSON object to `sink` before
/// the next line is read. Lines that are not JSON objects are logged and
/// dropped; an error from `sink` or from reading stops the stream.
pub fn decode_stream<R: BufRead>(
    mut reader: R,
    sink: &mut dyn FnMut(Record) -> Result<()>,
) -> Result<DecodeStats> {
    let mut stats = DecodeStats::default();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        match decode_line(&line) {
            Decoded::Record(record) => {
                stats.records += 1;
                sink(record)?;
            }
            Decoded::Skip(SkipReason::Blank) => {}
            Decoded::Skip(reason) => {
                stats.skipped += 1;
                tracing::warn!(
                    line = %String::from_utf8_lossy(&line).trim_end(),
                    reason = ?reason,
                    "skipping undecodable output line"
                );
            }
        }
    }

    Ok(stats)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
