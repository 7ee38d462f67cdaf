use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    coordinate::Coordinate,
    place::{OsmId, RawElement},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OverpassResponse {
    pub elements: Vec<OverpassElement>,
    #[serde(default)]
    pub remark: Option<String>,
}

impl OverpassResponse {
    /// Overpass reports query failures (timeouts, memory limits) as a `remark`
    /// on an otherwise successful response.
    pub fn runtime_error(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .filter(|remark| remark.contains("runtime error"))
    }

    pub fn into_raw_elements(self) -> Vec<RawElement> {
        self.elements
            .into_iter()
            .filter_map(OverpassElement::into_raw)
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub center: Option<OverpassCoord>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct OverpassCoord {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    /// Nodes carry `lat`/`lon`; ways and relations carry a `center`.
    /// Elements with neither, or of an unknown type, are dropped.
    pub fn into_raw(self) -> Option<RawElement> {
        let position = match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => Some((lat, lon)),
            (_, _, Some(center)) => Some((center.lat, center.lon)),
            _ => None,
        };
        let Some(coordinate) = position.and_then(|(lat, lon)| Coordinate::new(lat, lon)) else {
            debug!(
                element = %self.element_type,
                id = self.id,
                "skipping element without coordinates"
            );
            return None;
        };
        let Ok(kind) = self.element_type.parse() else {
            debug!(element = %self.element_type, id = self.id, "skipping unknown element type");
            return None;
        };
        Some(RawElement {
            osm_id: OsmId::new(kind, self.id),
            coordinate,
            tags: self.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_center_for_ways_and_skips_unlocated_elements() {
        let response: OverpassResponse = serde_json::from_str(
            r#"{
                "elements": [
                    {"type": "node", "id": 1, "lat": 32.7, "lon": -117.1,
                     "tags": {"amenity": "school"}},
                    {"type": "way", "id": 2, "center": {"lat": 32.8, "lon": -117.2}},
                    {"type": "relation", "id": 3, "tags": {"amenity": "school"}}
                ]
            }"#,
        )
        .unwrap();
        let raw = response.into_raw_elements();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].osm_id.to_string(), "node/1");
        assert_eq!(raw[1].osm_id.to_string(), "way/2");
        assert_eq!(raw[1].coordinate.latitude, 32.8);
        assert!(raw[1].tags.is_empty());
    }

    #[test]
    fn detects_runtime_error_remark() {
        let response: OverpassResponse = serde_json::from_str(
            r#"{"elements": [], "remark": "runtime error: Query timed out in \"query\""}"#,
        )
        .unwrap();
        assert!(response.runtime_error().is_some());
    }

    #[test]
    fn missing_elements_is_not_a_valid_result_set() {
        assert!(serde_json::from_str::<OverpassResponse>(r#"{"error": "busy"}"#).is_err());
    }
}
