// Point-in-polygon tests used to count POIs per neighborhood.
//
// Only outer rings are consulted: a point inside a hole is reported as inside
// the polygon. Points exactly on an edge get whatever the ray cast yields;
// the answer is deterministic for a given input but not otherwise specified.
use crate::geojson_features::{Geometry, Ring};
use crate::models::{BoundingBox, LatLng, LngLat};

/// One containment test: a UI point against a neighborhood geometry.
#[derive(Debug, Clone, Copy)]
pub struct ContainmentQuery<'a> {
    pub point: LatLng,
    pub geometry: &'a Geometry,
}

impl ContainmentQuery<'_> {
    pub fn evaluate(&self) -> bool {
        contains(self.point, self.geometry)
    }
}

// Helper function to check if a point is inside a ring using the ray casting algorithm
pub fn ring_contains(ring: &[LngLat], point: LngLat) -> bool {
    let n = ring.len();
    if n == 0 {
        return false;
    }
    let x = point.lng;
    let y = point.lat;
    let mut inside = false;

    // j trails i by one, wrapping, so an unclosed ring still gets its closing edge
    let mut j = n - 1;
    for i in 0..n {
        let xi = ring[i].lng;
        let yi = ring[i].lat;
        let xj = ring[j].lng;
        let yj = ring[j].lat;

        if (yi > y) != (yj > y) {
            let x_intersect = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Is `point` inside the outer ring of the polygon, or of any part of a
/// multipolygon?
pub fn contains(point: LatLng, geometry: &Geometry) -> bool {
    let p: LngLat = point.into();
    geometry
        .outer_rings()
        .into_iter()
        .any(|ring| ring_contains(ring, p))
}

/// Outer rings of a geometry copied once, each with its bounding box, for
/// testing many points against the same neighborhood.
#[derive(Debug, Clone)]
pub struct PreparedGeometry {
    rings: Vec<(BoundingBox, Ring)>,
    bbox: Option<BoundingBox>,
}

impl PreparedGeometry {
    pub fn new(geometry: &Geometry) -> Self {
        let rings: Vec<(BoundingBox, Ring)> = geometry
            .outer_rings()
            .into_iter()
            .filter_map(|ring| BoundingBox::of_points(ring).map(|bbox| (bbox, ring.clone())))
            .collect();
        let bbox = rings
            .iter()
            .map(|(bbox, _)| *bbox)
            .reduce(|a, b| a.union(&b));
        PreparedGeometry { rings, bbox }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    /// Same answer as [`contains`], with a bounding box rejection first.
    pub fn contains_lng_lat(&self, point: LngLat) -> bool {
        match self.bbox {
            Some(bbox) if bbox.contains(point) => self
                .rings
                .iter()
                .any(|(ring_bbox, ring)| ring_bbox.contains(point) && ring_contains(ring, point)),
            _ => false,
        }
    }

    pub fn contains(&self, point: LatLng) -> bool {
        self.contains_lng_lat(point.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_transform::{rotate_point, TransformParameters};

    fn ring(points: &[(f64, f64)]) -> Ring {
        points.iter().map(|&(lng, lat)| LngLat::new(lng, lat)).collect()
    }

    fn unit_square() -> Geometry {
        Geometry::Polygon(vec![ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])])
    }

    fn two_islands() -> Geometry {
        Geometry::MultiPolygon(vec![
            vec![ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])],
            vec![ring(&[(10.0, 10.0), (10.0, 11.0), (11.0, 11.0), (11.0, 10.0)])],
        ])
    }

    #[test]
    fn unit_square_inside_and_outside() {
        let square = unit_square();
        assert!(contains(LatLng::new(0.5, 0.5), &square));
        assert!(!contains(LatLng::new(2.0, 2.0), &square));
    }

    #[test]
    fn multipolygon_is_or_over_parts() {
        let islands = two_islands();
        assert!(contains(LatLng::new(0.5, 0.5), &islands));
        assert!(contains(LatLng::new(10.5, 10.5), &islands));
        assert!(!contains(LatLng::new(5.0, 5.0), &islands));
    }

    #[test]
    fn axis_order_is_lat_lng_at_the_boundary() {
        // Tall thin rectangle: lng in [0, 1], lat in [0, 10]
        let rect = Geometry::Polygon(vec![ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 10.0), (0.0, 10.0)])]);
        assert!(contains(LatLng { lat: 5.0, lng: 0.5 }, &rect));
        assert!(!contains(LatLng { lat: 0.5, lng: 5.0 }, &rect));

        let prepared = PreparedGeometry::new(&rect);
        assert!(prepared.contains(LatLng { lat: 5.0, lng: 0.5 }));
        assert!(!prepared.contains(LatLng { lat: 0.5, lng: 5.0 }));
    }

    #[test]
    fn closed_and_open_rings_agree() {
        let open = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let mut closed = open.clone();
        closed.push(open[0]);
        for &(lng, lat) in &[(1.0, 1.0), (3.9, 3.9), (5.0, 1.0), (-1.0, 2.0), (2.0, 4.5)] {
            let p = LngLat::new(lng, lat);
            assert_eq!(ring_contains(&open, p), ring_contains(&closed, p));
        }
    }

    #[test]
    fn concave_ring() {
        // U shape opening upward
        let u = Geometry::Polygon(vec![ring(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ])]);
        assert!(contains(LatLng::new(0.5, 2.0), &u));
        assert!(!contains(LatLng::new(1.5, 1.5), &u));
        assert!(contains(LatLng::new(2.5, 2.5), &u));
        assert!(contains(LatLng::new(2.5, 0.5), &u));
    }

    #[test]
    fn holes_are_ignored() {
        let with_hole = Geometry::Polygon(vec![
            ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            ring(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)]),
        ]);
        assert!(contains(LatLng::new(5.0, 5.0), &with_hole));
    }

    #[test]
    fn boundary_points_are_deterministic() {
        let square = unit_square();
        let prepared = PreparedGeometry::new(&square);
        for point in [
            LatLng::new(0.0, 0.5),
            LatLng::new(1.0, 0.5),
            LatLng::new(0.5, 0.0),
            LatLng::new(0.5, 1.0),
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
        ] {
            let first = contains(point, &square);
            for _ in 0..10 {
                assert_eq!(contains(point, &square), first);
            }
            assert_eq!(prepared.contains(point), first, "{:?}", point);
        }
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        assert!(!ring_contains(&[], LngLat::new(0.0, 0.0)));
        assert!(!ring_contains(&ring(&[(0.0, 0.0)]), LngLat::new(0.0, 0.0)));
        // Horizontal segment: every edge fails the straddle test
        assert!(!ring_contains(&ring(&[(0.0, 1.0), (5.0, 1.0)]), LngLat::new(2.0, 1.0)));
    }

    #[test]
    fn prepared_matches_direct() {
        let islands = two_islands();
        let prepared = PreparedGeometry::new(&islands);
        for i in -2..14 {
            for k in -2..14 {
                let p = LatLng::new(i as f64 * 0.9, k as f64 * 0.9);
                assert_eq!(prepared.contains(p), contains(p, &islands), "{:?}", p);
            }
        }
        let bbox = prepared.bbox().unwrap();
        assert_eq!((bbox.min_lng, bbox.max_lat), (0.0, 11.0));
    }

    #[test]
    fn containment_survives_rotation() {
        let islands = two_islands();
        let params = TransformParameters::new(37.0, LatLng::new(5.0, 5.0)).with_scale(1.5, 0.75);
        let rotated = islands.map_coords(|p| rotate_point(p, &params));
        for i in -2..14 {
            for k in -2..14 {
                // Offsets keep the grid off the ring vertices and edges
                let p = LngLat::new(i as f64 * 0.93 + 0.01, k as f64 * 0.87 + 0.02);
                let image = rotate_point(p, &params);
                assert_eq!(
                    contains(p.into(), &islands),
                    contains(image.into(), &rotated),
                    "{:?}",
                    p
                );
            }
        }
    }

    #[test]
    fn query_evaluates_like_contains() {
        let square = unit_square();
        let query = ContainmentQuery {
            point: LatLng::new(0.25, 0.75),
            geometry: &square,
        };
        assert!(query.evaluate());
    }
}
