//! National Center for Seismology (India) feed parser
//!
//! The NCS feed is GeoJSON-shaped but loose: origin time may be epoch
//! milliseconds or a timestamp string under one of several keys, magnitude
//! may be a string, and ids are often missing.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};

use super::{number, point, FeedEvent};

const TIME_KEYS: [&str; 4] = ["time", "originTime", "origin_time", "time_iso"];

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => Utc.timestamp_millis_opt(n.as_f64()? as i64).single(),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return Some(t.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|t| t.and_utc())
        }
        _ => None,
    }
}

fn first_present<'a>(props: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| props.get(*k)).find(|v| !v.is_null())
}

/// Parse an NCS feed body
pub fn parse_json(body: &Value) -> Vec<FeedEvent> {
    let Some(features) = body["features"].as_array() else {
        return Vec::new();
    };
    let empty = Map::new();

    features
        .iter()
        .map(|feature| {
            let props = feature["properties"].as_object().unwrap_or(&empty);
            let raw_time = first_present(props, &TIME_KEYS);
            let time = raw_time.and_then(parse_time);
            let (longitude, latitude, depth_km) = point(feature);

            let id = match props.get("id") {
                Some(Value::String(id)) if !id.is_empty() => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => {
                    let stamp = match (time, raw_time) {
                        (Some(t), _) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
                        (None, Some(Value::String(s))) => s.clone(),
                        _ => String::new(),
                    };
                    format!(
                        "ncs_{}_{}_{}",
                        stamp,
                        latitude.map(|v| v.to_string()).unwrap_or_default(),
                        longitude.map(|v| v.to_string()).unwrap_or_default()
                    )
                }
            };

            let place = first_present(props, &["place", "region"])
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            FeedEvent {
                id,
                time,
                magnitude: first_present(props, &["mag", "magnitude"]).and_then(number),
                latitude,
                longitude,
                depth_km,
                place,
                source: "NCS".to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_epoch_time_and_given_id() {
        let body = json!({"features": [{
            "properties": {"id": "ncs-1", "time": 1736899200000_i64, "mag": 3.4, "region": "Assam"},
            "geometry": {"coordinates": [92.1, 26.4, 10.0]}
        }]});
        let events = parse_json(&body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "ncs-1");
        assert_eq!(events[0].place, "Assam");
        assert_eq!(events[0].time.unwrap().timestamp_millis(), 1_736_899_200_000);
        assert_eq!(events[0].source, "NCS");
    }

    #[test]
    fn test_string_fields_and_synthesized_id() {
        let body = json!({"features": [{
            "properties": {"originTime": "2025-01-15T00:00:00Z", "magnitude": "4.1"},
            "geometry": {"coordinates": [77.2, 28.6, 5.0]}
        }]});
        let event = &parse_json(&body)[0];
        assert_eq!(event.magnitude, Some(4.1));
        assert_eq!(event.id, "ncs_2025-01-15T00:00:00Z_28.6_77.2");
        assert!(event.to_event().is_some());
    }

    #[test]
    fn test_plain_datetime_and_key_precedence() {
        let body = json!({"features": [{
            "properties": {"time": null, "origin_time": "2025-01-15 06:30:00", "mag": 2.9},
            "geometry": {"coordinates": [77.2, 28.6]}
        }]});
        let event = &parse_json(&body)[0];
        let expected = Utc.with_ymd_and_hms(2025, 1, 15, 6, 30, 0).unwrap();
        assert_eq!(event.time, Some(expected));
        assert_eq!(event.depth_km, None);
    }

    #[test]
    fn test_unparseable_time_is_invalid() {
        let body = json!({"features": [{
            "properties": {"time": "yesterday", "mag": 3.0},
            "geometry": {"coordinates": [77.2, 28.6, 5.0]}
        }]});
        let event = &parse_json(&body)[0];
        assert_eq!(event.time, None);
        assert_eq!(event.id, "ncs_yesterday_28.6_77.2");
        assert!(event.to_event().is_none());
    }
}
