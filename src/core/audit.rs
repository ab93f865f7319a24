use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Business-relevant attribute names every facility should carry
///
/// Independent of the full facility schema; bump `version` whenever the
/// field list changes so downstream consumers can tell audits apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSchema {
    pub version: u32,
    pub required: Vec<String>,
}

impl FilterSchema {
    pub fn new(version: u32, required: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            version,
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for FilterSchema {
    fn default() -> Self {
        Self::new(
            1,
            [
                "City",
                "State",
                "Zip",
                "Status",
                "Tier",
                "Hazmat",
                "Temp_Control",
                "Food_Grade",
                "Paper_Rolls",
                "Services",
                "Notes_Pricing",
                "Insurance",
            ],
        )
    }
}

/// Whether a value counts as absent: null, empty string, empty list or empty object
///
/// Numeric zero and `false` are real values.
#[inline]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Required fields that are absent from or empty in `fields`
pub fn audit(fields: &Map<String, Value>, schema: &FilterSchema) -> BTreeSet<String> {
    schema
        .required
        .iter()
        .filter(|name| fields.get(name.as_str()).map_or(true, is_empty_value))
        .cloned()
        .collect()
}
