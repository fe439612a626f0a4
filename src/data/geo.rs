// src/data/geo.rs
//! Country features from a world-atlas TopoJSON topology or a GeoJSON
//! FeatureCollection. Only the id, the display name and the geometry kind
//! are kept; the renderer draws shapes from its own copy of the atlas and
//! joins on feature id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::LoadError;
use crate::keys::{AliasTable, CountryKey};

pub const DEFAULT_OBJECT: &str = "countries";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    Polygon,
    MultiPolygon,
    Other,
}

impl GeometryKind {
    fn from_type(t: Option<&str>) -> Self {
        match t {
            Some("Polygon") => Self::Polygon,
            Some("MultiPolygon") => Self::MultiPolygon,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub kind: GeometryKind,
}

/// One country polygon/multipolygon with its display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFeature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub geometry: Geometry,
}

impl GeoFeature {
    /// Feature with an empty polygon; handy for fixtures.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            geometry: Geometry {
                kind: GeometryKind::Polygon,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeoDocument {
    Topology {
        #[serde(default)]
        objects: HashMap<String, TopoObject>,
    },
    FeatureCollection {
        #[serde(default)]
        features: Vec<GeoJsonFeature>,
    },
}

#[derive(Deserialize)]
struct TopoObject {
    #[serde(default)]
    geometries: Vec<TopoGeometry>,
}

#[derive(Deserialize)]
struct TopoGeometry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Deserialize)]
struct GeoJsonFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Properties>,
    #[serde(default)]
    geometry: Option<GeoJsonGeometry>,
}

#[derive(Deserialize)]
struct GeoJsonGeometry {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize, Default)]
struct Properties {
    #[serde(default)]
    name: Option<String>,
}

fn id_string(v: Option<Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn name_of(p: Option<Properties>) -> String {
    p.and_then(|p| p.name).unwrap_or_default()
}

/// Parse a geographic document. `object` selects the topology object
/// (ignored for GeoJSON).
pub fn parse_features(origin: &str, text: &str, object: &str) -> Result<Vec<GeoFeature>, LoadError> {
    let doc: GeoDocument = serde_json::from_str(text).map_err(|e| LoadError::parse(origin, e))?;
    match doc {
        GeoDocument::Topology { mut objects } => {
            let obj = objects.remove(object).ok_or_else(|| {
                LoadError::parse(origin, format!("topology has no object `{object}`"))
            })?;
            Ok(obj
                .geometries
                .into_iter()
                .map(|g| GeoFeature {
                    id: id_string(g.id),
                    name: name_of(g.properties),
                    geometry: Geometry {
                        kind: GeometryKind::from_type(g.kind.as_deref()),
                    },
                })
                .collect())
        }
        GeoDocument::FeatureCollection { features } => Ok(features
            .into_iter()
            .map(|f| {
                let kind = match f.geometry {
                    Some(g) => GeometryKind::from_type(Some(&g.kind)),
                    None => GeometryKind::Other,
                };
                GeoFeature {
                    id: id_string(f.id),
                    name: name_of(f.properties),
                    geometry: Geometry { kind },
                }
            })
            .collect()),
    }
}

/// Canonical key of every feature, plus first-match lookup by key.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    keys: Vec<CountryKey>,
    first: HashMap<CountryKey, usize>,
}

impl FeatureIndex {
    pub fn build(features: &[GeoFeature], aliases: &AliasTable) -> Self {
        let keys: Vec<CountryKey> = features.iter().map(|f| aliases.key(&f.name)).collect();
        let mut first = HashMap::with_capacity(keys.len());
        for (i, k) in keys.iter().enumerate() {
            first.entry(k.clone()).or_insert(i);
        }
        Self { keys, first }
    }

    /// Position of the first feature whose key matches.
    pub fn position(&self, key: &CountryKey) -> Option<usize> {
        self.first.get(key).copied()
    }

    pub fn contains(&self, key: &CountryKey) -> bool {
        self.first.contains_key(key)
    }

    /// Key of the feature at `i` (same order as the feature list).
    pub fn key_at(&self, i: usize) -> Option<&CountryKey> {
        self.keys.get(i)
    }
}
