//! Alumni record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Maximum length of an alumni name
pub const MAX_NAME_LEN: usize = 100;
/// Accepted graduation years
pub const GRADUATION_YEARS: std::ops::RangeInclusive<i32> = 1950..=2030;

/// A stored alumni record
///
/// `fields` is semi-structured: recognized keys (name, company, skills, ...)
/// live next to arbitrary extra keys supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlumniRecord {
    /// Store-assigned identifier
    pub id: String,
    /// Record fields
    pub fields: Map<String, Value>,
    /// Insertion time
    pub created_at: DateTime<Utc>,
    /// Last modification time, if the record was ever updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AlumniRecord {
    /// Timestamp used for freshness comparisons
    pub fn freshness(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Display name, if present
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

/// Body of `POST /alumni`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAlumni {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form fields merged into the top level of the stored record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Map<String, Value>>,
}

impl NewAlumni {
    /// Create a request with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check field lengths and numeric ranges
    pub fn validate(&self) -> Result<()> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_NAME_LEN {
            return Err(Error::validation(format!(
                "name must be between 1 and {} characters",
                MAX_NAME_LEN
            )));
        }
        if let Some(year) = self.graduation_year {
            if !GRADUATION_YEARS.contains(&year) {
                return Err(Error::validation(format!(
                    "graduation_year must be between {} and {}",
                    GRADUATION_YEARS.start(),
                    GRADUATION_YEARS.end()
                )));
            }
        }
        Ok(())
    }

    /// Flatten into stored fields: absent values are dropped and
    /// `additional_info` entries are merged into the top level (overwriting).
    pub fn into_fields(mut self) -> Result<Map<String, Value>> {
        let additional = self.additional_info.take();
        let mut fields = match serde_json::to_value(&self)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::internal(format!(
                    "alumni request serialized to {} instead of an object",
                    other
                )))
            }
        };
        if let Some(extra) = additional {
            fields.extend(extra);
        }
        Ok(fields)
    }
}
