use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;

/// Metrics a fake sensor reports: (rel, name, unit rel, unit name, range)
const METRICS: [(&str, &str, &str, &str, (f64, f64)); 4] = [
    ("1", "Temperature", "1", "°C", (15.0, 35.0)),
    ("2", "Humidity", "2", "%", (30.0, 80.0)),
    ("3", "CO2", "3", "ppm", (400.0, 2000.0)),
    ("4", "Atmospheric Pressure", "4", "hPa", (980.0, 1040.0)),
];

#[derive(Debug, Clone, Serialize)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub sensor: String,
    pub metric: String,
    pub value: f64,
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alarm {
    pub sensor: String,
    pub metric: String,
    pub value: f64,
    pub severity: String,
    pub since: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub value: f64,
    pub metric: String,
    pub unit: String,
    pub asset: String,
    pub point: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub rel: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Links {
    pub asset: Vec<Link>,
    pub metric: Vec<Link>,
    pub point: Vec<Link>,
    pub unit: Vec<Link>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Measurements {
    pub readings: Vec<Reading>,
    pub links: Links,
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn link(rel: &str, name: &str) -> Link {
    Link {
        rel: rel.to_string(),
        name: name.to_string(),
    }
}

fn sample_value(rng: &mut impl Rng, (min, max): (f64, f64)) -> f64 {
    (rng.gen_range(min..max) * 10.0).round() / 10.0
}

pub fn sensors(count: usize) -> Vec<Sensor> {
    (0..count)
        .map(|i| Sensor {
            id: format!("{}", 1_000_000 + i),
            name: format!("Aranet4 Room {}", i + 1),
            model: "Aranet4".to_string(),
        })
        .collect()
}

/// One sample per sensor and metric, all stamped now.
pub fn telemetry_last(rng: &mut impl Rng, sensors: &[Sensor]) -> Vec<Sample> {
    let now = timestamp(Utc::now());
    sensors
        .iter()
        .flat_map(|sensor| {
            METRICS
                .iter()
                .map(move |(rel, _, _, _, range)| (sensor.id.clone(), *rel, *range))
        })
        .map(|(sensor, metric, range)| Sample {
            sensor,
            metric: metric.to_string(),
            value: sample_value(rng, range),
            time: now.clone(),
        })
        .collect()
}

/// Temperature series for one sensor, one point per `step_minutes`, oldest first.
pub fn telemetry_history(
    rng: &mut impl Rng,
    sensor: &str,
    points: usize,
    step_minutes: i64,
) -> Vec<Sample> {
    let (rel, _, _, _, range) = METRICS[0];
    let now = Utc::now();
    (0..points)
        .rev()
        .map(|i| Sample {
            sensor: sensor.to_string(),
            metric: rel.to_string(),
            value: sample_value(rng, range),
            time: timestamp(now - Duration::minutes(step_minutes * i as i64)),
        })
        .collect()
}

/// Roughly one sensor in four is in a CO2 alarm.
pub fn alarms(rng: &mut impl Rng, sensors: &[Sensor]) -> Vec<Alarm> {
    let since = timestamp(Utc::now() - Duration::minutes(rng.gen_range(1..120)));
    let mut alarms = Vec::new();
    for sensor in sensors {
        if !rng.gen_bool(0.25) {
            continue;
        }
        alarms.push(Alarm {
            sensor: sensor.id.clone(),
            metric: METRICS[2].0.to_string(),
            value: rng.gen_range(1400.0..2500.0_f64).round(),
            severity: "high".to_string(),
            since: since.clone(),
        });
    }
    alarms
}

/// Latest value of every metric for one sensor, in the cross-referenced
/// shape of `/api/v1/measurements/last`.
pub fn measurements_last(rng: &mut impl Rng, sensor: &Sensor) -> Measurements {
    let asset = sensor.id.clone();
    let point = format!("{}-1", sensor.id);
    let now = timestamp(Utc::now());

    let readings = METRICS
        .iter()
        .map(|(metric, _, unit, _, range)| Reading {
            value: sample_value(rng, *range),
            metric: metric.to_string(),
            unit: unit.to_string(),
            asset: asset.clone(),
            point: point.clone(),
            time: now.clone(),
        })
        .collect();

    let links = Links {
        asset: vec![link(&asset, &sensor.name)],
        metric: METRICS.iter().map(|(rel, name, _, _, _)| link(rel, name)).collect(),
        point: vec![link(&point, "Main point")],
        unit: METRICS.iter().map(|(_, _, rel, name, _)| link(rel, name)).collect(),
    };

    Measurements { readings, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensors_have_unique_ids() {
        let sensors = sensors(5);
        let mut ids: Vec<_> = sensors.iter().map(|s| s.id.clone()).collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_telemetry_last_covers_every_metric() {
        let mut rng = rand::thread_rng();
        let samples = telemetry_last(&mut rng, &sensors(3));

        assert_eq!(samples.len(), 3 * METRICS.len());
    }

    #[test]
    fn test_history_is_chronological() {
        let mut rng = rand::thread_rng();
        let samples = telemetry_history(&mut rng, "1000000", 10, 5);

        assert_eq!(samples.len(), 10);
        assert!(samples.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_measurements_reference_links() {
        let mut rng = rand::thread_rng();
        let fleet = sensors(1);
        let payload = measurements_last(&mut rng, &fleet[0]);

        assert_eq!(payload.readings.len(), METRICS.len());
        for reading in &payload.readings {
            assert!(payload.links.metric.iter().any(|l| l.rel == reading.metric));
            assert!(payload.links.unit.iter().any(|l| l.rel == reading.unit));
            assert!(payload.links.asset.iter().any(|l| l.rel == reading.asset));
            assert!(payload.links.point.iter().any(|l| l.rel == reading.point));
        }
    }

    #[test]
    fn test_values_within_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let value = sample_value(&mut rng, (15.0, 35.0));
            assert!((15.0..=35.0).contains(&value));
        }
    }
}
