use geo::ChamberlainDuquetteArea;
use geo_types::{LineString, MultiPolygon, Polygon};

use crate::geojson_features::Geometry;
use crate::models::{BoundingBox, Measurements};

/// Bounding box over the outer rings, `None` when every ring is empty.
pub fn bounding_box(geometry: &Geometry) -> Option<BoundingBox> {
    geometry
        .outer_rings()
        .into_iter()
        .filter_map(|ring| BoundingBox::of_points(ring))
        .reduce(|a, b| a.union(&b))
}

// Outer rings only, consistent with containment
fn to_geo_outer(geometry: &Geometry) -> MultiPolygon<f64> {
    MultiPolygon::new(
        geometry
            .outer_rings()
            .into_iter()
            .map(|ring| {
                let exterior: LineString<f64> = ring.iter().map(|p| geo_types::Coord::from(*p)).collect();
                Polygon::new(exterior, vec![])
            })
            .collect(),
    )
}

/// Spherical area of the outer rings in square metres.
pub fn geodesic_area_m2(geometry: &Geometry) -> f64 {
    to_geo_outer(geometry).chamberlain_duquette_unsigned_area()
}

pub fn measure(geometry: &Geometry) -> Measurements {
    Measurements {
        bbox: bounding_box(geometry),
        area_m2: geodesic_area_m2(geometry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LngLat;

    fn square(lng: f64, lat: f64, size: f64) -> Vec<LngLat> {
        vec![
            LngLat::new(lng, lat),
            LngLat::new(lng + size, lat),
            LngLat::new(lng + size, lat + size),
            LngLat::new(lng, lat + size),
            LngLat::new(lng, lat),
        ]
    }

    #[test]
    fn one_degree_cell_at_equator() {
        // Roughly 111.2 km x 111.2 km on the reference sphere
        let area = geodesic_area_m2(&Geometry::Polygon(vec![square(0.0, 0.0, 1.0)]));
        assert!((area - 1.2375e10).abs() / 1.2375e10 < 0.01, "area {}", area);
    }

    #[test]
    fn multipolygon_parts_add_up_and_holes_are_ignored() {
        let part = geodesic_area_m2(&Geometry::Polygon(vec![square(-73.6, 45.5, 0.01)]));
        let other = geodesic_area_m2(&Geometry::Polygon(vec![square(-73.5, 45.4, 0.01)]));
        let both = geodesic_area_m2(&Geometry::MultiPolygon(vec![
            vec![square(-73.6, 45.5, 0.01), square(-73.597, 45.503, 0.002)],
            vec![square(-73.5, 45.4, 0.01)],
        ]));
        assert!((both - (part + other)).abs() < 1e-3 * both);
    }

    #[test]
    fn bounding_box_spans_all_parts() {
        let measurements = measure(&Geometry::MultiPolygon(vec![
            vec![square(0.0, 0.0, 1.0)],
            vec![square(5.0, -2.0, 1.0)],
        ]));
        let bbox = measurements.bbox.unwrap();
        assert_eq!(bbox, BoundingBox { min_lng: 0.0, min_lat: -2.0, max_lng: 6.0, max_lat: 1.0 });
        assert!(measurements.area_m2 > 0.0);
    }
}
