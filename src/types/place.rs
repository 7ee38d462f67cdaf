use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::{category::Category, coordinate::Coordinate};

/// OSM element kind. Ordering is node < way < relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl FromStr for ElementKind {
    type Err = InvalidOsmId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(ElementKind::Node),
            "way" => Ok(ElementKind::Way),
            "relation" => Ok(ElementKind::Relation),
            other => Err(InvalidOsmId(other.to_owned())),
        }
    }
}

/// Stable identifier of an OSM element, rendered as `type/id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OsmId {
    pub kind: ElementKind,
    pub id: i64,
}

impl OsmId {
    pub fn new(kind: ElementKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for OsmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid osm id: {0}")]
pub struct InvalidOsmId(pub String);

impl FromStr for OsmId {
    type Err = InvalidOsmId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.split_once('/').ok_or_else(|| InvalidOsmId(s.to_owned()))?;
        Ok(Self {
            kind: kind.parse()?,
            id: id.parse().map_err(|_| InvalidOsmId(s.to_owned()))?,
        })
    }
}

impl Serialize for OsmId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Tag bag of one Overpass element, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub osm_id: OsmId,
    pub coordinate: Coordinate,
    pub tags: BTreeMap<String, String>,
}

/// A normalised point of interest.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Place {
    pub osm_id: OsmId,
    pub category: Category,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub raw_tags: BTreeMap<String, String>,
}

impl Place {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osm_ids_order_by_kind_then_numeric_id() {
        let mut ids: Vec<OsmId> = ["way/1", "node/10", "node/2", "relation/1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["node/2", "node/10", "way/1", "relation/1"]);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("area/1".parse::<OsmId>().is_err());
        assert!("node".parse::<OsmId>().is_err());
        assert!("node/x".parse::<OsmId>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let id = OsmId::new(ElementKind::Way, 42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"way/42\"");
    }
}
