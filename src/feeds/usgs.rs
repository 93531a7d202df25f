//! USGS GeoJSON summary feed parser

use chrono::{TimeZone, Utc};
use serde_json::Value;

use super::{number, point, FeedEvent};

/// Parse a GeoJSON `FeatureCollection`; features without an id or time are dropped
pub fn parse_geojson(body: &Value) -> Vec<FeedEvent> {
    let Some(features) = body["features"].as_array() else {
        return Vec::new();
    };

    features
        .iter()
        .filter_map(|feature| {
            let id = feature["id"].as_str()?;
            let props = &feature["properties"];
            let time = props["time"].as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single())?;
            let (longitude, latitude, depth_km) = point(feature);

            Some(FeedEvent {
                id: id.to_string(),
                time: Some(time),
                magnitude: number(&props["mag"]),
                latitude,
                longitude,
                depth_km,
                place: props["place"].as_str().unwrap_or_default().to_string(),
                source: "USGS".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "us7000abcd",
                "properties": {"mag": 4.6, "place": "12 km SSE of Hualien City, Taiwan", "time": 1736899200000},
                "geometry": {"type": "Point", "coordinates": [121.65, 23.87, 18.2]}
            },
            {
                "type": "Feature",
                "id": "ak0251xyz",
                "properties": {"mag": null, "place": "Alaska", "time": 1736899300000},
                "geometry": {"type": "Point", "coordinates": [-150.1, 61.2]}
            },
            {
                "type": "Feature",
                "id": "no-time",
                "properties": {"mag": 3.0},
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0, 5.0]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample_feed() {
        let body: Value = serde_json::from_str(SAMPLE).unwrap();
        let events = parse_geojson(&body);
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.id, "us7000abcd");
        assert_eq!(first.latitude, Some(23.87));
        assert_eq!(first.longitude, Some(121.65));
        assert_eq!(first.depth_km, Some(18.2));
        assert_eq!(first.time.unwrap().timestamp_millis(), 1_736_899_200_000);
        assert!(first.to_event().is_some());

        // kept raw, rejected on validation
        assert_eq!(events[1].depth_km, None);
        assert!(events[1].to_event().is_none());
    }

    #[test]
    fn test_not_a_collection() {
        assert!(parse_geojson(&serde_json::json!({"error": "rate limited"})).is_empty());
    }
}
