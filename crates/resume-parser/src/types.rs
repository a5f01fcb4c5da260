//! Parsed resume types
//!
//! Model output is loosely shaped, so deserialization is lenient: lists accept
//! a single item or null, and scalar fields accept numbers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Structured fields extracted from a resume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_skills")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub experience: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub projects: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub education: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub courses: Vec<Value>,
    /// Platform name to profile URL; invalid URLs are null
    #[serde(default, deserialize_with = "lenient_object")]
    pub social_media: Map<String, Value>,
    /// Any other keys the model returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParsedResume {
    /// Build from the JSON object found in a model reply
    pub fn from_object(object: Map<String, Value>) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(object))
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

fn lenient_skills<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let to_text = |value: Value| match value {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    };

    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(to_text).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    })
}

fn lenient_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}
