use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identifier used by upstream to cross-reference lookup tables.
///
/// Kept as the raw JSON scalar so that `"1"` and `1` never compare equal.
/// A missing identifier is `null` and never resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rel(pub Value);

impl From<&str> for Rel {
    fn from(value: &str) -> Self {
        Rel(Value::String(value.to_string()))
    }
}

impl From<i64> for Rel {
    fn from(value: i64) -> Self {
        Rel(Value::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(default)]
    pub rel: Rel,
    #[serde(default)]
    pub name: Option<String>,
}

/// Lookup tables embedded in a measurements response. Any of them may be
/// missing or `null` upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub asset: Option<Vec<ReferenceEntry>>,
    #[serde(default)]
    pub metric: Option<Vec<ReferenceEntry>>,
    #[serde(default)]
    pub point: Option<Vec<ReferenceEntry>>,
    #[serde(default)]
    pub unit: Option<Vec<ReferenceEntry>>,
}

/// One upstream telemetry reading. Every field is optional upstream: an
/// offline sensor reports `"value": null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub metric: Rel,
    #[serde(default)]
    pub unit: Rel,
    #[serde(default)]
    pub asset: Rel,
    #[serde(default)]
    pub point: Rel,
    #[serde(default)]
    pub time: Value,
}

/// Raw body of `/api/v1/measurements/last`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementsPayload {
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default, deserialize_with = "nullable_links")]
    pub links: Links,
}

fn nullable_links<'de, D>(deserializer: D) -> std::result::Result<Links, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Links>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub value: Value,
    #[serde(rename = "nameMetric")]
    pub name_metric: Option<String>,
    pub unit: Option<String>,
}

/// Client-facing body of `/api/aranet/measurements`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReshapedMeasurements {
    pub data: Vec<MeasurementRecord>,
    pub asset: Option<String>,
    pub point: Option<String>,
    pub time: Value,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
