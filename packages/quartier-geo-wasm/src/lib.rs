use wasm_bindgen::prelude::*;
use js_sys::Float64Array;
use serde_wasm_bindgen::to_value;

// Create a console module for logging
pub mod console;
// Typed errors shared by every module
pub mod error;
// Shared data structures (points, POIs, counts)
pub mod models;
// GeoJSON Polygon / MultiPolygon features
pub mod geojson_features;
// Tilted-map rotation and scaling
pub mod geo_transform;
// Ray-casting containment
pub mod polygon_containment;
// POI counts per neighborhood
pub mod aggregation;
// Bounding boxes and areas
pub mod measurements;

use error::GeometryError;
use geo_transform::TransformParameters;
use geojson_features::{Feature, FeatureCollection, Geometry};
use models::{LatLng, LngLat, PoisByCategory};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macros from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => (crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("Geometry module initialized");
    });
}

fn parse_params(params_json: &str) -> Result<TransformParameters, GeometryError> {
    let params: TransformParameters = serde_json::from_str(params_json)?;
    params.validate()?;
    Ok(params)
}

/// Rotates a GeoJSON FeatureCollection for the tilted map.
///
/// Features that are not Polygon/MultiPolygon, whose coordinates are
/// malformed, or that overflow to non-finite coordinates under `params` are
/// logged and left out; the rest are transformed.
///
/// The output is rebuilt from the parsed features, so it is not a verbatim
/// copy of the input: `"properties": null` becomes `{}`, and foreign members
/// (`bbox` on features or the collection, other top-level keys) are dropped.
/// A `bbox` would be stale after rotation anyway.
pub fn rotate_and_scale_json(collection_json: &str, params_json: &str) -> Result<String, GeometryError> {
    let params = parse_params(params_json)?;
    let value: serde_json::Value = serde_json::from_str(collection_json)?;
    let (collection, skipped) = FeatureCollection::from_value_lenient(&value)?;
    for skip in &skipped {
        console_warn!(
            "Skipping feature #{} ({}) of type {}: {}",
            skip.index,
            skip.label,
            skip.kind,
            skip.error
        );
    }
    let mut features = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        match geo_transform::rotate_feature(feature, &params) {
            Ok(rotated) => features.push(rotated),
            Err(err) => console_warn!("Skipping feature {}: {}", feature.label(), err),
        }
    }
    Ok(serde_json::to_string(&FeatureCollection::new(features))?)
}

pub fn rotate_point_json(lat: f64, lng: f64, params_json: &str) -> Result<LatLng, GeometryError> {
    let params = parse_params(params_json)?;
    let rotated = geo_transform::rotate_point(LatLng::new(lat, lng).into(), &params);
    Ok(geo_transform::ensure_finite(rotated)?.into())
}

/// Landmarks as a flat `[lng, lat, lng, lat, ...]` list.
pub fn rotate_points_flat_json(coordinates: &[f64], params_json: &str) -> Result<Vec<f64>, GeometryError> {
    if coordinates.len() % 2 != 0 {
        return Err(GeometryError::malformed(format!(
            "flat coordinate list has odd length {}",
            coordinates.len()
        )));
    }
    let params = parse_params(params_json)?;
    let points: Vec<LngLat> = coordinates
        .chunks_exact(2)
        .map(|chunk| LngLat::new(chunk[0], chunk[1]))
        .collect();
    let rotated = geo_transform::rotate_points(&points, &params)
        .into_iter()
        .map(geo_transform::ensure_finite)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rotated.into_iter().flat_map(|p| p.to_position()).collect())
}

/// Accepts either a bare geometry or a whole Feature.
fn parse_geometry(geometry_json: &str) -> Result<Geometry, GeometryError> {
    let value: serde_json::Value = serde_json::from_str(geometry_json)?;
    match value.get("type").and_then(|t| t.as_str()) {
        Some("Feature") => Ok(Feature::from_value(&value)?.geometry),
        _ => Geometry::from_value(&value),
    }
}

pub fn contains_point_json(lat: f64, lng: f64, geometry_json: &str) -> Result<bool, GeometryError> {
    let geometry = parse_geometry(geometry_json)?;
    Ok(polygon_containment::contains(LatLng::new(lat, lng), &geometry))
}

/// Counts for the hovered neighborhood. A broken feature yields zero counts;
/// only an unreadable POI payload is an error.
pub fn count_by_category_json(feature_json: &str, pois_json: &str) -> Result<String, GeometryError> {
    let pois: PoisByCategory = serde_json::from_str(pois_json)?;
    let counts = match serde_json::from_str::<serde_json::Value>(feature_json) {
        Ok(feature) => aggregation::count_by_category_or_zero(&feature, &pois),
        Err(err) => {
            console_warn!("Unreadable feature JSON, counting as empty: {}", err);
            aggregation::zero_counts(&pois)
        }
    };
    Ok(serde_json::to_string(&counts)?)
}

/// One row per input feature, `index` matching its position in `features`.
/// Broken features are logged and reported with zero counts.
pub fn count_collection_json(collection_json: &str, pois_json: &str) -> Result<String, GeometryError> {
    let pois: PoisByCategory = serde_json::from_str(pois_json)?;
    let value: serde_json::Value = serde_json::from_str(collection_json)?;
    let counts = aggregation::count_collection_value(&value, &pois)?;
    console_log!(
        "Counted {} categories for {} features",
        pois.len(),
        counts.len()
    );
    Ok(serde_json::to_string(&counts)?)
}

pub fn measurements_json(feature_json: &str) -> Result<String, GeometryError> {
    let geometry = parse_geometry(feature_json)?;
    Ok(serde_json::to_string(&measurements::measure(&geometry))?)
}

#[wasm_bindgen]
pub fn rotate_and_scale_geojson(collection_json: &str, params_json: &str) -> Result<String, JsValue> {
    Ok(rotate_and_scale_json(collection_json, params_json)?)
}

#[wasm_bindgen]
pub fn rotate_point_js(lat: f64, lng: f64, params_json: &str) -> Result<JsValue, JsValue> {
    let rotated = rotate_point_json(lat, lng, params_json)?;
    Ok(to_value(&rotated)?)
}

#[wasm_bindgen]
pub fn rotate_points_flat(coordinates: &[f64], params_json: &str) -> Result<Float64Array, JsValue> {
    let rotated = rotate_points_flat_json(coordinates, params_json)?;
    Ok(Float64Array::from(rotated.as_slice()))
}

#[wasm_bindgen]
pub fn contains_point(lat: f64, lng: f64, geometry_json: &str) -> Result<bool, JsValue> {
    Ok(contains_point_json(lat, lng, geometry_json)?)
}

#[wasm_bindgen]
pub fn count_pois_by_category(feature_json: &str, pois_json: &str) -> Result<String, JsValue> {
    Ok(count_by_category_json(feature_json, pois_json)?)
}

#[wasm_bindgen]
pub fn count_pois_for_collection(collection_json: &str, pois_json: &str) -> Result<String, JsValue> {
    Ok(count_collection_json(collection_json, pois_json)?)
}

#[wasm_bindgen]
pub fn feature_measurements(feature_json: &str) -> Result<String, JsValue> {
    Ok(measurements_json(feature_json)?)
}

// Get information about WASM module capabilities
#[wasm_bindgen]
pub fn get_wasm_info() -> String {
    serde_json::to_string(&serde_json::json!({
        "geometry_types": ["Polygon", "MultiPolygon"],
        "containment": "outer ring ray casting",
        "rotation": "planar, viewport-scale only",
        "parallel_processing": cfg!(not(target_arch = "wasm32")),
    }))
    .unwrap_or_else(|_| "{}".to_string())
}
