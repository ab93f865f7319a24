use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Routed driving distance and duration between two coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub distance_miles: f64,
    pub duration_minutes: f64,
}

/// Facility record as provided by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFacility {
    pub id: String,
    #[serde(default)]
    pub fields: FacilityFields,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl CandidateFacility {
    /// Usable postal code for geocoding, if the record carries one
    pub fn postal_code(&self) -> Option<&str> {
        self.fields
            .zip
            .as_deref()
            .map(str::trim)
            .filter(|zip| !zip.is_empty())
    }
}

/// Attribute set of a facility
///
/// The fields the ranking engine reads are typed; everything else the
/// catalog returns is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacilityFields {
    #[serde(
        rename = "City",
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<String>,
    #[serde(
        rename = "State",
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub state: Option<String>,
    #[serde(
        rename = "Zip",
        default,
        deserialize_with = "deserialize_postal_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub zip: Option<String>,
    #[serde(
        rename = "Tier",
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tier: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FacilityFields {
    /// Flatten into a canonical-name attribute map
    ///
    /// Typed fields that are unset appear as `null`.
    pub fn to_attribute_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        let typed = [
            ("City", &self.city),
            ("State", &self.state),
            ("Zip", &self.zip),
            ("Tier", &self.tier),
        ];
        for (name, value) in typed {
            let value = value.clone().map(Value::String).unwrap_or(Value::Null);
            map.insert(name.to_string(), value);
        }
        map
    }
}

/// Accept the shapes a catalog text column can take
///
/// Lookup and multi-select columns arrive as arrays of strings and are
/// joined; numbers are rendered as text. Anything else reads as unset.
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    })
}

/// Catalogs frequently store zips as numbers; normalise to a 5-digit string
fn deserialize_postal_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => n.as_u64().map(|zip| format!("{:05}", zip)),
        Some(Value::Array(items)) => items.first().and_then(|zip| match zip {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n.as_u64().map(|zip| format!("{:05}", zip)),
            _ => None,
        }),
        _ => None,
    })
}

/// Facility that survived filtering, annotated with routing and audit data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub id: String,
    pub fields: FacilityFields,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<chrono::DateTime<chrono::Utc>>,
    pub distance_miles: f64,
    pub duration_minutes: f64,
    pub tier_rank: u32,
    pub missing_fields: BTreeSet<String>,
    pub has_missing_fields: bool,
}

impl RankedCandidate {
    /// Sort key: tier first, then driving time, then driving distance
    pub fn rank_key(&self) -> (u32, f64, f64) {
        (self.tier_rank, self.duration_minutes, self.distance_miles)
    }
}

/// Result of a nearby search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyResult {
    pub origin_zip: String,
    pub warehouses: Vec<RankedCandidate>,
    pub ai_analysis: String,
}
