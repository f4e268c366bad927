use serde_json::{Map, Value};

/// A single decoded JSON object from the server's output stream.
pub type Record = Map<String, Value>;

/// What a line of `gerrit query --format=JSON` output represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryLine<'a> {
    /// Trailing statistics row (`rowCount`, `runTimeMilliseconds`, ...)
    Stats { more_changes: bool },
    /// Server-side failure reported in-band
    Error { message: &'a str },
    /// A change
    Row,
}

/// Classify a decoded query record.
pub fn classify_query_line(record: &Record) -> QueryLine<'_> {
    if record.contains_key("rowCount") {
        let more_changes = record
            .get("moreChanges")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        return QueryLine::Stats { more_changes };
    }

    if record.get("type").and_then(Value::as_str) == Some("error") {
        let message = record
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown server error");
        return QueryLine::Error { message };
    }

    QueryLine::Row
}

/// Resume cursor carried by change rows on servers that paginate by sort key.
pub fn sort_key(record: &Record) -> Option<&str> {
    record.get("sortKey").and_then(Value::as_str)
}
