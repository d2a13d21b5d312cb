//! Rotation and anisotropic scaling of GeoJSON boundaries for the tilted map.
//!
//! The rotation treats longitude/latitude as a flat Cartesian plane. It is a
//! visual styling transform, not a geodesic one, and is only meaningful for
//! viewport-sized areas such as a single city. Do not use it on regions where
//! Earth's curvature matters.
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geojson_features::{Feature, FeatureCollection};
use crate::models::{LatLng, LngLat};

fn default_scale() -> f64 {
    1.0
}

/// Parameters of one rendering context (e.g. the currently selected part of
/// the city). Immutable, passed by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformParameters {
    /// Counter-clockwise, any real value.
    pub angle_degrees: f64,
    pub center: LatLng,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
}

impl TransformParameters {
    pub fn new(angle_degrees: f64, center: LatLng) -> Self {
        TransformParameters {
            angle_degrees,
            center,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        let values = [
            ("angleDegrees", self.angle_degrees),
            ("center.lat", self.center.lat),
            ("center.lng", self.center.lng),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(GeometryError::InvalidTransform {
                    reason: format!("{} is not finite ({})", name, value),
                });
            }
        }
        Ok(())
    }

    /// Parameters mapping tilted-map coordinates back to real ones.
    ///
    /// The forward transform scales after rotating, so the inverse rotates by
    /// -θ after un-scaling; that is not expressible as a single
    /// rotate-then-scale unless the scales are equal. Use
    /// [`unrotate_point`] for the general case.
    pub fn inverse(&self) -> Result<TransformParameters, GeometryError> {
        self.validate()?;
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return Err(GeometryError::InvalidTransform {
                reason: "zero scale is not invertible".to_string(),
            });
        }
        if self.scale_x != self.scale_y {
            return Err(GeometryError::InvalidTransform {
                reason: "anisotropic scale has no rotate-then-scale inverse".to_string(),
            });
        }
        Ok(TransformParameters {
            angle_degrees: -self.angle_degrees,
            center: self.center,
            scale_x: 1.0 / self.scale_x,
            scale_y: 1.0 / self.scale_y,
        })
    }
}

/// Translate to the center, rotate, scale, translate back.
pub fn rotate_point(point: LngLat, params: &TransformParameters) -> LngLat {
    let theta = params.angle_degrees.to_radians();
    let (sin, cos) = theta.sin_cos();

    let d_lng = point.lng - params.center.lng;
    let d_lat = point.lat - params.center.lat;

    let rotated_lng = d_lng * cos - d_lat * sin;
    let rotated_lat = d_lng * sin + d_lat * cos;

    LngLat {
        lng: rotated_lng * params.scale_x + params.center.lng,
        lat: rotated_lat * params.scale_y + params.center.lat,
    }
}

/// Exact inverse of [`rotate_point`], including anisotropic scale.
pub fn unrotate_point(point: LngLat, params: &TransformParameters) -> Result<LngLat, GeometryError> {
    if params.scale_x == 0.0 || params.scale_y == 0.0 {
        return Err(GeometryError::InvalidTransform {
            reason: "zero scale is not invertible".to_string(),
        });
    }
    let theta = params.angle_degrees.to_radians();
    let (sin, cos) = theta.sin_cos();

    let d_lng = (point.lng - params.center.lng) / params.scale_x;
    let d_lat = (point.lat - params.center.lat) / params.scale_y;

    Ok(LngLat {
        lng: d_lng * cos + d_lat * sin + params.center.lng,
        lat: -d_lng * sin + d_lat * cos + params.center.lat,
    })
}

/// Landmark markers and other loose point lists.
pub fn rotate_points(points: &[LngLat], params: &TransformParameters) -> Vec<LngLat> {
    points.iter().map(|p| rotate_point(*p, params)).collect()
}

/// Rejects a transformed point that overflowed to infinity or NaN.
pub fn ensure_finite(point: LngLat) -> Result<LngLat, GeometryError> {
    if point.lng.is_finite() && point.lat.is_finite() {
        Ok(point)
    } else {
        Err(GeometryError::InvalidTransform {
            reason: format!("transformed coordinate is not finite ({}, {})", point.lng, point.lat),
        })
    }
}

/// Rotated copy of one feature. Fails when the parameters push any
/// coordinate out of the finite range.
pub fn rotate_feature(feature: &Feature, params: &TransformParameters) -> Result<Feature, GeometryError> {
    let geometry = feature.geometry.map_coords(|p| rotate_point(p, params));
    if !geometry.is_finite() {
        return Err(GeometryError::InvalidTransform {
            reason: format!("feature {} overflows under these parameters", feature.label()),
        });
    }
    Ok(Feature {
        id: feature.id.clone(),
        geometry,
        // Same properties object, never cloned or written
        properties: feature.properties.clone(),
    })
}

/// Rotated copy of `collection`: same features in the same order, same ring
/// and point counts, only coordinates change.
pub fn rotate_and_scale(
    collection: &FeatureCollection,
    params: &TransformParameters,
) -> Result<FeatureCollection, GeometryError> {
    params.validate()?;
    let features = collection
        .features
        .iter()
        .map(|feature| rotate_feature(feature, params))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureCollection { features })
}
