// GeoJSON subset used by the neighborhood map: Polygon / MultiPolygon features.
//
// Parsing walks serde_json::Value directly so every shape problem surfaces as
// a typed GeometryError instead of a generic deserialization failure.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::error::GeometryError;
use crate::models::LngLat;

/// Closed (by convention) sequence of points. Algorithms never rely on the
/// closing point being present.
pub type Ring = Vec<LngLat>;

/// First ring is the outer boundary, the rest are holes.
pub type Polygon = Vec<Ring>;

pub type MultiPolygon = Vec<Polygon>;

pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Outer ring of every polygon part. Holes are skipped.
    pub fn outer_rings(&self) -> Vec<&Ring> {
        match self {
            Geometry::Polygon(rings) => rings.first().into_iter().collect(),
            Geometry::MultiPolygon(polygons) => {
                polygons.iter().filter_map(|rings| rings.first()).collect()
            }
        }
    }

    /// Applies `f` to every coordinate of every ring, keeping the structure.
    pub fn map_coords(&self, f: impl Fn(LngLat) -> LngLat) -> Geometry {
        let map_polygon = |rings: &Polygon| -> Polygon {
            rings
                .iter()
                .map(|ring| ring.iter().map(|p| f(*p)).collect())
                .collect()
        };
        match self {
            Geometry::Polygon(rings) => Geometry::Polygon(map_polygon(rings)),
            Geometry::MultiPolygon(polygons) => {
                Geometry::MultiPolygon(polygons.iter().map(|rings| map_polygon(rings)).collect())
            }
        }
    }

    /// False when any coordinate is NaN or infinite. JSON has no encoding
    /// for those, so such a geometry must not be serialized.
    pub fn is_finite(&self) -> bool {
        let finite_polygon = |rings: &Polygon| {
            rings
                .iter()
                .all(|ring| ring.iter().all(|p| p.lng.is_finite() && p.lat.is_finite()))
        };
        match self {
            Geometry::Polygon(rings) => finite_polygon(rings),
            Geometry::MultiPolygon(polygons) => polygons.iter().all(|rings| finite_polygon(rings)),
        }
    }

    pub fn from_value(value: &Value) -> Result<Geometry, GeometryError> {
        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => return Err(GeometryError::unsupported(other.to_string())),
            None if value.is_null() => return Err(GeometryError::unsupported("null")),
            None => return Err(GeometryError::malformed("geometry has no 'type' member")),
        };

        match kind {
            "Polygon" => {
                let coords = coordinates_array(value, kind)?;
                Ok(Geometry::Polygon(parse_polygon(coords)?))
            }
            "MultiPolygon" => {
                let coords = coordinates_array(value, kind)?;
                let polygons = coords
                    .iter()
                    .enumerate()
                    .map(|(i, part)| {
                        let rings = part.as_array().ok_or_else(|| {
                            GeometryError::malformed(format!("MultiPolygon part {} is not an array", i))
                        })?;
                        parse_polygon(rings)
                    })
                    .collect::<Result<MultiPolygon, _>>()?;
                Ok(Geometry::MultiPolygon(polygons))
            }
            other => Err(GeometryError::unsupported(other)),
        }
    }

    pub fn to_value(&self) -> Value {
        let polygon_coords = |rings: &Polygon| -> Vec<Vec<[f64; 2]>> {
            rings
                .iter()
                .map(|ring| ring.iter().map(|p| p.to_position()).collect())
                .collect()
        };
        match self {
            Geometry::Polygon(rings) => json!({
                "type": "Polygon",
                "coordinates": polygon_coords(rings),
            }),
            Geometry::MultiPolygon(polygons) => json!({
                "type": "MultiPolygon",
                "coordinates": polygons.iter().map(|rings| polygon_coords(rings)).collect::<Vec<_>>(),
            }),
        }
    }
}

// Helper function to pull a non-empty coordinates array out of a geometry object
fn coordinates_array<'a>(value: &'a Value, kind: &str) -> Result<&'a Vec<Value>, GeometryError> {
    let coords = value
        .get("coordinates")
        .ok_or_else(|| GeometryError::malformed(format!("{} has no coordinates", kind)))?
        .as_array()
        .ok_or_else(|| GeometryError::malformed(format!("{} coordinates is not an array", kind)))?;
    if coords.is_empty() {
        return Err(GeometryError::malformed(format!("{} coordinates is empty", kind)));
    }
    Ok(coords)
}

fn parse_polygon(rings: &[Value]) -> Result<Polygon, GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::malformed("polygon has no rings"));
    }
    let polygon = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            let positions = ring
                .as_array()
                .ok_or_else(|| GeometryError::malformed(format!("ring {} is not an array", i)))?;
            positions.iter().map(parse_position).collect::<Result<Ring, _>>()
        })
        .collect::<Result<Polygon, _>>()?;
    if polygon[0].is_empty() {
        return Err(GeometryError::malformed("outer ring is empty"));
    }
    Ok(polygon)
}

// GeoJSON position: [lng, lat] with optional trailing values (altitude) ignored
fn parse_position(value: &Value) -> Result<LngLat, GeometryError> {
    let pair = value
        .as_array()
        .filter(|pair| pair.len() >= 2)
        .ok_or_else(|| GeometryError::malformed(format!("invalid position {}", value)))?;
    match (pair[0].as_f64(), pair[1].as_f64()) {
        (Some(lng), Some(lat)) => Ok(LngLat::from_position([lng, lat])),
        _ => Err(GeometryError::malformed(format!("non-numeric position {}", value))),
    }
}

/// A neighborhood (or region) boundary with its opaque properties.
///
/// `properties` is shared: geometry operations hand the same `Arc` to their
/// output and never write through it.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<Value>,
    pub geometry: Geometry,
    pub properties: Arc<Properties>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Feature {
            id: None,
            geometry,
            properties: Arc::new(properties),
        }
    }

    pub fn from_value(value: &Value) -> Result<Feature, GeometryError> {
        let geometry = Geometry::from_value(value.get("geometry").unwrap_or(&Value::Null))?;
        let properties = match value.get("properties") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        Ok(Feature {
            id: value.get("id").cloned(),
            geometry,
            properties: Arc::new(properties),
        })
    }

    /// GeoJSON form of the feature. Not a byte-for-byte round trip: null
    /// properties come back as `{}` and foreign members (`bbox`, ...) are
    /// not carried.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String("Feature".to_string()));
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), id.clone());
        }
        obj.insert("geometry".to_string(), self.geometry.to_value());
        obj.insert("properties".to_string(), Value::Object((*self.properties).clone()));
        Value::Object(obj)
    }

    /// Identifier used in diagnostics: the feature id, else a `name`-like
    /// property, else "<unnamed>".
    pub fn label(&self) -> String {
        label_of(self.id.as_ref(), Some(&self.properties))
    }
}

// Helper function shared by parsed features and raw values that failed to parse
fn label_of(id: Option<&Value>, properties: Option<&Properties>) -> String {
    if let Some(id) = id {
        return match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    properties
        .and_then(|props| {
            ["name", "NOM", "nom", "id"]
                .iter()
                .find_map(|key| props.get(*key))
        })
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Label for a raw feature value, usable even when the geometry is bad.
pub fn raw_feature_label(value: &Value) -> String {
    label_of(
        value.get("id"),
        value.get("properties").and_then(|p| p.as_object()),
    )
}

/// Geometry `type` of a raw feature value, for diagnostics.
pub fn raw_geometry_kind(value: &Value) -> String {
    value
        .get("geometry")
        .and_then(|g| g.get("type"))
        .and_then(|t| t.as_str())
        .unwrap_or("null")
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// A feature that was left out of a leniently parsed collection.
#[derive(Debug)]
pub struct SkippedFeature {
    pub index: usize,
    pub label: String,
    pub kind: String,
    pub error: GeometryError,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection { features }
    }

    pub fn features_array(value: &Value) -> Result<&Vec<Value>, GeometryError> {
        value
            .get("features")
            .and_then(|f| f.as_array())
            .ok_or_else(|| GeometryError::malformed("FeatureCollection has no 'features' array"))
    }

    /// Strict parse: the first bad feature fails the whole collection.
    pub fn from_value(value: &Value) -> Result<FeatureCollection, GeometryError> {
        let features = Self::features_array(value)?
            .iter()
            .map(Feature::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureCollection { features })
    }

    /// Lenient parse: bad features are returned separately so the caller can
    /// log them and keep rendering the rest.
    pub fn from_value_lenient(
        value: &Value,
    ) -> Result<(FeatureCollection, Vec<SkippedFeature>), GeometryError> {
        let mut features = Vec::new();
        let mut skipped = Vec::new();
        for (index, raw) in Self::features_array(value)?.iter().enumerate() {
            match Feature::from_value(raw) {
                Ok(feature) => features.push(feature),
                Err(error) => skipped.push(SkippedFeature {
                    index,
                    label: raw_feature_label(raw),
                    kind: raw_geometry_kind(raw),
                    error,
                }),
            }
        }
        Ok((FeatureCollection { features }, skipped))
    }

    /// Only `type` and `features` are written; collection-level foreign
    /// members are dropped.
    pub fn to_value(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features.iter().map(Feature::to_value).collect::<Vec<_>>(),
        })
    }
}

// serde glue so these types can sit inside other serde structs

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Geometry::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Feature::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FeatureCollection::from_value(&value).map_err(serde::de::Error::custom)
    }
}
