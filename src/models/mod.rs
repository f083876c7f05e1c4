pub mod chat;
pub mod common;
pub mod flight;
pub mod hotel;
pub mod travel;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleInt {
    Int(i64),
    Float(f64),
    String(String),
}

/// Integer argument that the model may send as a number, a float or a string.
pub(crate) fn deserialize_flexible_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match FlexibleInt::deserialize(deserializer)? {
        FlexibleInt::Int(i) => Ok(i),
        FlexibleInt::Float(f) => Ok(f as i64),
        FlexibleInt::String(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
    }
}

/// Optional flexible integer; `null` stays `None`.
pub(crate) fn deserialize_flexible_int_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlexibleInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FlexibleInt::Int(i)) => Ok(Some(i)),
        Some(FlexibleInt::Float(f)) => Ok(Some(f as i64)),
        Some(FlexibleInt::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Optional text argument that the model may send as a bare number (`4` for "4").
pub(crate) fn deserialize_flexible_string_opt<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}

/// Provider payload integer. Unparseable strings become `None` instead of
/// failing the whole response.
pub(crate) fn deserialize_lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlexibleInt>::deserialize(deserializer)? {
        None => None,
        Some(FlexibleInt::Int(i)) => Some(i),
        Some(FlexibleInt::Float(f)) => Some(f as i64),
        Some(FlexibleInt::String(s)) => s.trim().parse::<i64>().ok(),
    })
}
