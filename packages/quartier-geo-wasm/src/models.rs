// This is the models module containing shared data structures
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Internal point representation, always (longitude, latitude).
///
/// GeoJSON positions and every algorithm in this crate use this order. The
/// UI speaks `{lat, lng}` ([`LatLng`]) and POI fixtures speak `{lat, lon}`
/// ([`Poi`]); both convert here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        LngLat { lng, lat }
    }

    /// Builds a point from a GeoJSON position `[lng, lat, ...]`.
    pub fn from_position(position: [f64; 2]) -> Self {
        LngLat {
            lng: position[0],
            lat: position[1],
        }
    }

    pub fn to_position(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Point as the map UI passes it around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }
}

impl From<LatLng> for LngLat {
    fn from(p: LatLng) -> Self {
        LngLat {
            lng: p.lng,
            lat: p.lat,
        }
    }
}

impl From<LngLat> for LatLng {
    fn from(p: LngLat) -> Self {
        LatLng {
            lat: p.lat,
            lng: p.lng,
        }
    }
}

impl From<LngLat> for geo_types::Coord<f64> {
    fn from(p: LngLat) -> Self {
        geo_types::Coord { x: p.lng, y: p.lat }
    }
}

/// Point of interest as shipped by the POI fixtures (parks, schools, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub lat: f64,
    pub lon: f64,
    // Category-specific tags, opaque to the geometry core
    #[serde(flatten)]
    pub tags: serde_json::Map<String, serde_json::Value>,
}

impl Poi {
    pub fn new(lat: f64, lon: f64) -> Self {
        Poi {
            lat,
            lon,
            tags: serde_json::Map::new(),
        }
    }

    pub fn position(&self) -> LngLat {
        LngLat {
            lng: self.lon,
            lat: self.lat,
        }
    }
}

/// POI lists keyed by category name.
pub type PoisByCategory = BTreeMap<String, Vec<Poi>>;

/// Number of POIs inside a neighborhood, per category.
pub type CategoryCounts = BTreeMap<String, u32>;

/// Counts for one feature of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCounts {
    pub index: usize,
    pub id: Option<serde_json::Value>,
    pub counts: CategoryCounts,
}

/// Axis-aligned box over (lng, lat), inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Bounding box of a point sequence, `None` when empty.
    pub fn of_points(points: &[LngLat]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_lng: first.lng,
            min_lat: first.lat,
            max_lng: first.lng,
            max_lat: first.lat,
        };
        for p in &points[1..] {
            bbox.extend(*p);
        }
        Some(bbox)
    }

    pub fn extend(&mut self, p: LngLat) {
        self.min_lng = self.min_lng.min(p.lng);
        self.min_lat = self.min_lat.min(p.lat);
        self.max_lng = self.max_lng.max(p.lng);
        self.max_lat = self.max_lat.max(p.lat);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lng: self.min_lng.min(other.min_lng),
            min_lat: self.min_lat.min(other.min_lat),
            max_lng: self.max_lng.max(other.max_lng),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    // Function to check if a point is inside the bounding box
    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.min_lng && p.lng <= self.max_lng && p.lat >= self.min_lat && p.lat <= self.max_lat
    }
}

/// Response of the `feature_measurements` export.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    pub bbox: Option<BoundingBox>,
    pub area_m2: f64,
}
