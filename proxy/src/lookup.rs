use crate::errors::{Error, Result};
use crate::model::{
    MeasurementRecord, MeasurementsPayload, Reading, ReferenceEntry, Rel, ReshapedMeasurements,
};
use tracing::warn;

/// Returns the name of the first entry in `table` whose `rel` matches.
///
/// A missing table is not an error: it simply resolves nothing. Neither does
/// a `null` identifier, nor a first match whose name is `null`.
pub fn resolve<'a>(table: Option<&'a [ReferenceEntry]>, rel: &Rel) -> Option<&'a str> {
    if rel.0.is_null() {
        return None;
    }
    table?
        .iter()
        .find(|entry| entry.rel == *rel)
        .and_then(|entry| entry.name.as_deref())
}

/// Counts readings after the first whose asset, point or time differ from it.
pub fn divergent_readings(readings: &[Reading]) -> usize {
    let Some((first, rest)) = readings.split_first() else {
        return 0;
    };
    rest.iter()
        .filter(|r| r.asset != first.asset || r.point != first.point || r.time != first.time)
        .count()
}

/// Replaces reading identifiers with names from `links` and hoists asset,
/// point and time into the envelope.
///
/// The envelope fields come from the first reading only. Batches returned by
/// `measurements/last` share one asset, point and time; anything else is
/// reported with a warning and flattened anyway.
pub fn reshape_measurements(raw: MeasurementsPayload) -> Result<ReshapedMeasurements> {
    let MeasurementsPayload { readings, links } = raw;
    let first = readings.first().ok_or(Error::EmptyReadings)?;

    let divergent = divergent_readings(&readings);
    if divergent > 0 {
        warn!(
            "{} of {} readings differ from the first in asset, point or time; keeping the first",
            divergent,
            readings.len()
        );
    }

    let data = readings
        .iter()
        .map(|reading| MeasurementRecord {
            value: reading.value.clone(),
            name_metric: resolve(links.metric.as_deref(), &reading.metric).map(str::to_string),
            unit: resolve(links.unit.as_deref(), &reading.unit).map(str::to_string),
        })
        .collect();

    Ok(ReshapedMeasurements {
        data,
        asset: resolve(links.asset.as_deref(), &first.asset).map(str::to_string),
        point: resolve(links.point.as_deref(), &first.point).map(str::to_string),
        time: first.time.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Links;
    use serde_json::{json, Value};

    fn entry(rel: &str, name: &str) -> ReferenceEntry {
        ReferenceEntry {
            rel: Rel::from(rel),
            name: Some(name.to_string()),
        }
    }

    fn reading(value: f64, metric: &str, asset: &str, point: &str, time: &str) -> Reading {
        Reading {
            value: json!(value),
            metric: Rel::from(metric),
            unit: Rel::from("u1"),
            asset: Rel::from(asset),
            point: Rel::from(point),
            time: Value::String(time.to_string()),
        }
    }

    fn links() -> Links {
        Links {
            asset: Some(vec![entry("a1", "Room 1"), entry("a2", "Room 2")]),
            metric: Some(vec![entry("m1", "Temperature"), entry("m2", "Humidity")]),
            point: Some(vec![entry("p1", "North"), entry("p2", "South")]),
            unit: Some(vec![entry("u1", "°C")]),
        }
    }

    #[test]
    fn test_resolve_absent_table() {
        assert_eq!(resolve(None, &Rel::from("m1")), None);
    }

    #[test]
    fn test_resolve_hit_and_miss() {
        let table = vec![entry("m1", "Temperature"), entry("m2", "Humidity")];

        assert_eq!(resolve(Some(table.as_slice()), &Rel::from("m2")), Some("Humidity"));
        assert_eq!(resolve(Some(table.as_slice()), &Rel::from("m3")), None);
        assert_eq!(resolve(Some(&[][..]), &Rel::from("m1")), None);
    }

    #[test]
    fn test_resolve_first_duplicate_wins() {
        let table = vec![entry("m1", "First"), entry("m1", "Second")];

        assert_eq!(resolve(Some(table.as_slice()), &Rel::from("m1")), Some("First"));
    }

    #[test]
    fn test_resolve_does_not_coerce_types() {
        let table = vec![ReferenceEntry {
            rel: Rel::from(7),
            name: Some("Seven".to_string()),
        }];

        assert_eq!(resolve(Some(table.as_slice()), &Rel::from("7")), None);
        assert_eq!(resolve(Some(table.as_slice()), &Rel::from(7)), Some("Seven"));
    }

    #[test]
    fn test_resolve_null_name_and_null_rel() {
        let table = vec![
            ReferenceEntry {
                rel: Rel::from("m1"),
                name: None,
            },
            entry("m1", "Shadowed"),
            ReferenceEntry {
                rel: Rel::default(),
                name: Some("Nameless".to_string()),
            },
        ];

        assert_eq!(resolve(Some(table.as_slice()), &Rel::from("m1")), None);
        assert_eq!(resolve(Some(table.as_slice()), &Rel::default()), None);
    }

    #[test]
    fn test_divergent_readings() {
        let same = reading(1.0, "m1", "a1", "p1", "2024-01-01T00:00:00Z");
        let readings = vec![
            same.clone(),
            same.clone(),
            reading(2.0, "m2", "a2", "p1", "2024-01-01T00:00:00Z"),
            reading(3.0, "m1", "a1", "p2", "2024-01-01T00:00:00Z"),
            reading(4.0, "m1", "a1", "p1", "2024-01-01T00:05:00Z"),
        ];

        assert_eq!(divergent_readings(&readings), 3);
        assert_eq!(divergent_readings(&readings[..2]), 0);
        assert_eq!(divergent_readings(&[]), 0);
    }

    #[test]
    fn test_reshape_keeps_offline_reading() {
        let payload: MeasurementsPayload = serde_json::from_value(json!({
            "readings": [
                { "value": 21.5, "metric": "m1", "unit": "u1",
                  "asset": "a1", "point": "p1", "time": "2024-01-01T00:00:00Z" },
                { "value": null, "metric": "m2", "unit": "u1",
                  "asset": "a1", "point": "p1", "time": "2024-01-01T00:00:00Z" }
            ],
            "links": {
                "metric": [{ "rel": "m1", "name": "Temperature" }, { "rel": "m2", "name": null }],
                "unit": [{ "rel": "u1", "name": "°C" }],
                "asset": [{ "rel": "a1", "name": "Room 1" }]
            }
        }))
        .unwrap();

        let reshaped = reshape_measurements(payload).unwrap();

        assert_eq!(
            serde_json::to_value(&reshaped).unwrap(),
            json!({
                "data": [
                    { "value": 21.5, "nameMetric": "Temperature", "unit": "°C" },
                    { "value": null, "nameMetric": null, "unit": "°C" }
                ],
                "asset": "Room 1",
                "point": null,
                "time": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_reshape_single_reading() {
        let payload: MeasurementsPayload = serde_json::from_value(json!({
            "readings": [{
                "value": 21.5, "metric": "m1", "unit": "u1",
                "asset": "a1", "point": "p1", "time": "2024-01-01T00:00:00Z"
            }],
            "links": {
                "metric": [{ "rel": "m1", "name": "Temperature" }],
                "unit": [{ "rel": "u1", "name": "°C" }],
                "asset": [{ "rel": "a1", "name": "Room 1" }],
                "point": [{ "rel": "p1", "name": "North" }]
            }
        }))
        .unwrap();

        let reshaped = reshape_measurements(payload).unwrap();

        assert_eq!(
            serde_json::to_value(&reshaped).unwrap(),
            json!({
                "data": [{ "value": 21.5, "nameMetric": "Temperature", "unit": "°C" }],
                "asset": "Room 1",
                "point": "North",
                "time": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_reshape_preserves_order_and_values() {
        let readings = vec![
            reading(21.5, "m1", "a1", "p1", "2024-01-01T00:00:00Z"),
            reading(40.0, "m2", "a1", "p1", "2024-01-01T00:00:00Z"),
            reading(-3.25, "m9", "a1", "p1", "2024-01-01T00:00:00Z"),
        ];
        let payload = MeasurementsPayload {
            readings: readings.clone(),
            links: links(),
        };

        let reshaped = reshape_measurements(payload).unwrap();

        assert_eq!(reshaped.data.len(), readings.len());
        for (record, reading) in reshaped.data.iter().zip(&readings) {
            assert_eq!(record.value, reading.value);
        }
        assert_eq!(reshaped.data[0].name_metric.as_deref(), Some("Temperature"));
        assert_eq!(reshaped.data[1].name_metric.as_deref(), Some("Humidity"));
        assert_eq!(reshaped.data[2].name_metric, None);
    }

    #[test]
    fn test_reshape_envelope_uses_first_reading() {
        let payload = MeasurementsPayload {
            readings: vec![
                reading(1.0, "m1", "a2", "p2", "2024-02-02T00:00:00Z"),
                reading(2.0, "m1", "a1", "p1", "2024-01-01T00:00:00Z"),
            ],
            links: links(),
        };

        let reshaped = reshape_measurements(payload).unwrap();

        assert_eq!(reshaped.asset.as_deref(), Some("Room 2"));
        assert_eq!(reshaped.point.as_deref(), Some("South"));
        assert_eq!(reshaped.time, json!("2024-02-02T00:00:00Z"));
    }

    #[test]
    fn test_reshape_absent_tables() {
        let payload = MeasurementsPayload {
            readings: vec![reading(5.0, "m1", "a1", "p1", "2024-01-01T00:00:00Z")],
            links: Links::default(),
        };

        let reshaped = reshape_measurements(payload).unwrap();

        assert_eq!(reshaped.asset, None);
        assert_eq!(reshaped.point, None);
        assert_eq!(reshaped.data[0].name_metric, None);
        assert_eq!(reshaped.data[0].unit, None);
    }

    #[test]
    fn test_reshape_empty_readings() {
        let payload = MeasurementsPayload {
            readings: Vec::new(),
            links: links(),
        };

        assert!(matches!(
            reshape_measurements(payload),
            Err(Error::EmptyReadings)
        ));
    }
}
