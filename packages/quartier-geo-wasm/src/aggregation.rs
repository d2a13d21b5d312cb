// POI counts per neighborhood, for the hover/click badges.
//
// Always run against the unrotated boundary: POI coordinates are real-world
// coordinates and never go through the tilted-map transform.
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::console_warn;
use crate::error::GeometryError;
use crate::geojson_features::{raw_feature_label, raw_geometry_kind, Feature, FeatureCollection, Properties};
use crate::models::{CategoryCounts, FeatureCounts, PoisByCategory};
use crate::polygon_containment::PreparedGeometry;

fn count_prepared(prepared: &PreparedGeometry, pois_by_category: &PoisByCategory) -> CategoryCounts {
    pois_by_category
        .iter()
        .map(|(category, pois)| {
            let count = pois
                .iter()
                .filter(|poi| prepared.contains_lng_lat(poi.position()))
                .count() as u32;
            (category.clone(), count)
        })
        .collect()
}

/// Number of POIs of each category inside `feature`. Every requested
/// category is present in the result, with 0 when nothing matched.
pub fn count_by_category(feature: &Feature, pois_by_category: &PoisByCategory) -> CategoryCounts {
    let prepared = PreparedGeometry::new(&feature.geometry);
    count_prepared(&prepared, pois_by_category)
}

/// Same as [`count_by_category`] for a feature still in raw GeoJSON form.
pub fn count_by_category_value(
    feature: &Value,
    pois_by_category: &PoisByCategory,
) -> Result<CategoryCounts, GeometryError> {
    let feature = Feature::from_value(feature)?;
    Ok(count_by_category(&feature, pois_by_category))
}

pub fn zero_counts(pois_by_category: &PoisByCategory) -> CategoryCounts {
    pois_by_category.keys().map(|category| (category.clone(), 0)).collect()
}

/// UI boundary: a broken feature is logged and shown with zero counts.
pub fn count_by_category_or_zero(feature: &Value, pois_by_category: &PoisByCategory) -> CategoryCounts {
    match count_by_category_value(feature, pois_by_category) {
        Ok(counts) => counts,
        Err(err) => {
            console_warn!(
                "Counting POIs for feature {} (geometry type {}) failed: {}",
                raw_feature_label(feature),
                raw_geometry_kind(feature),
                err
            );
            zero_counts(pois_by_category)
        }
    }
}

/// Counts for every feature of a collection, in feature order.
pub fn count_collection(collection: &FeatureCollection, pois_by_category: &PoisByCategory) -> Vec<FeatureCounts> {
    collection
        .features
        .par_iter()
        .enumerate()
        .map(|(index, feature)| FeatureCounts {
            index,
            id: feature.id.clone(),
            counts: count_by_category(feature, pois_by_category),
        })
        .collect()
}

/// Counts for every entry of a raw GeoJSON `features` array.
///
/// Rows line up one-to-one with the input: `index` is the position in the
/// input array, and a feature that fails to parse gets zero counts (and is
/// logged) instead of being dropped.
pub fn count_collection_value(
    collection: &Value,
    pois_by_category: &PoisByCategory,
) -> Result<Vec<FeatureCounts>, GeometryError> {
    let features = FeatureCollection::features_array(collection)?;
    Ok(features
        .par_iter()
        .enumerate()
        .map(|(index, raw)| FeatureCounts {
            index,
            id: raw.get("id").cloned(),
            counts: count_by_category_or_zero(raw, pois_by_category),
        })
        .collect())
}

/// New feature whose properties are the original ones overlaid with
/// `derived`. The input feature and its properties are left untouched.
pub fn with_derived_properties(feature: &Feature, derived: Properties) -> Feature {
    let mut merged: Properties = (*feature.properties).clone();
    merged.extend(derived);
    Feature {
        id: feature.id.clone(),
        geometry: feature.geometry.clone(),
        properties: Arc::new(merged),
    }
}

/// Attaches `count_<category>` properties for display.
pub fn annotate_counts(feature: &Feature, counts: &CategoryCounts) -> Feature {
    let derived: Map<String, Value> = counts
        .iter()
        .map(|(category, count)| (format!("count_{}", category), Value::from(*count)))
        .collect();
    with_derived_properties(feature, derived)
}
