//! Raw `data` parameter → typed payload.

use crate::schema::{Payload, PrebuiltNode, Record};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Why a payload could not be turned into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input absent or blank. Shown as a placeholder, not as an error.
    #[error("no data")]
    NoData,
    /// Input present but not a JSON array of objects.
    #[error("could not parse {raw:?}: {reason}")]
    ParseFailure { raw: String, reason: String },
}

impl ParseError {
    fn failure(raw: &str, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse the raw parameter value.
///
/// Flat employee rows are the normal shape. An array whose first object has
/// a `children` key, or a `name` key without `emailcollaborateur`, is taken
/// as an already-nested tree instead.
pub fn parse_payload(raw: Option<&str>) -> Result<Payload, ParseError> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Err(ParseError::NoData),
    };

    let parsed: Value =
        serde_json::from_str(raw).map_err(|e| ParseError::failure(raw, e.to_string()))?;

    let items = match parsed {
        Value::Array(items) => items,
        other => {
            return Err(ParseError::failure(
                raw,
                format!("expected a JSON array, found {}", kind(&other)),
            ))
        }
    };

    let mut objects = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => objects.push(map),
            other => {
                return Err(ParseError::failure(
                    raw,
                    format!("element {} is not an object (found {})", index, kind(&other)),
                ))
            }
        }
    }

    let payload = if objects.first().is_some_and(looks_prebuilt) {
        Payload::Prebuilt(convert::<PrebuiltNode>(raw, objects)?)
    } else {
        Payload::Records(convert::<Record>(raw, objects)?)
    };

    debug!("Parsed {} top-level elements", payload.len());
    Ok(payload)
}

fn looks_prebuilt(first: &Map<String, Value>) -> bool {
    first.contains_key("children")
        || (first.contains_key("name") && !first.contains_key("emailcollaborateur"))
}

fn convert<T>(raw: &str, objects: Vec<Map<String, Value>>) -> Result<Vec<T>, ParseError>
where
    T: serde::de::DeserializeOwned,
{
    objects
        .into_iter()
        .enumerate()
        .map(|(index, map)| {
            serde_json::from_value(Value::Object(map))
                .map_err(|e| ParseError::failure(raw, format!("element {}: {}", index, e)))
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
