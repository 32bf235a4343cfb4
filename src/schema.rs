//! Employee review record types as they arrive from the host.
//!
//! Field names on the wire are the ones the hosting form exposes
//! (`nom`, `emailresponsable`, ...). Every field is optional and lenient:
//! missing or null values become empty strings and choice columns arrive
//! either as a scalar or wrapped as `{ "Value": ... }`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One flat input row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "ID", default, deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(rename = "nom", default, deserialize_with = "lenient_text")]
    pub last_name: String,
    #[serde(rename = "prenom", default, deserialize_with = "lenient_text")]
    pub first_name: String,
    #[serde(rename = "nomresponsable", default, deserialize_with = "lenient_text")]
    pub manager_name: String,
    #[serde(
        rename = "responsabledelentretien",
        default,
        deserialize_with = "lenient_text"
    )]
    pub delegated_reviewer: String,
    #[serde(rename = "StatutEntretien", default, deserialize_with = "lenient_text")]
    pub review_status: String,
    #[serde(
        rename = "StatusEntretienManager",
        default,
        deserialize_with = "lenient_text"
    )]
    pub manager_review_status: String,
    #[serde(rename = "emailcollaborateur", default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(rename = "emailresponsable", default, deserialize_with = "lenient_text")]
    pub manager_email: String,
}

/// Element of the already-nested input variant: `{ "id", "name", "children" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrebuiltNode {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_children")]
    pub children: Vec<PrebuiltNode>,
}

/// What a raw payload turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Records(Vec<Record>),
    Prebuilt(Vec<PrebuiltNode>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::Prebuilt(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flatten a JSON value into display text.
///
/// Strings pass through, numbers and booleans are stringified, null and
/// arrays are empty, and objects are unwrapped through their `Value` key.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null | Value::Array(_) => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map.get("Value").map(value_text).unwrap_or_default(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    };
    Ok(id)
}

fn lenient_children<'de, D>(deserializer: D) -> Result<Vec<PrebuiltNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<PrebuiltNode>>::deserialize(deserializer)?.unwrap_or_default())
}
