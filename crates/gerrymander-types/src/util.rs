use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Gerrit emits some numeric fields as strings (`"number": "12345"`,
/// approval `"value": "-1"`). Accept either form.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
