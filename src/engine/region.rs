//! Circular search region around a point.

use std::f64::consts::PI;

use geo::{BoundingRect, Coord, Geometry, Intersects, LineString, Point, Polygon};
use rstar::AABB;

use crate::models::GeoPoint;

/// Meters per degree used to turn a radius into angular units.
///
/// Fixed at the equatorial value for every latitude and direction, so radii
/// get progressively less accurate away from the equator.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Segments in the polygonal approximation of the circle
pub const CIRCLE_SEGMENTS: usize = 64;

/// Region tested against record geometries
#[derive(Debug, Clone)]
pub struct SearchRegion {
    shape: Geometry<f64>,
    envelope: AABB<[f64; 2]>,
}

impl SearchRegion {
    /// Circle of `radius_meters` around `center`, in planar lon/lat
    pub fn circle(center: GeoPoint, radius_meters: f64) -> Self {
        let radius = radius_degrees(radius_meters);
        let origin = Point::new(center.lon, center.lat);

        let shape = if radius > 0.0 {
            let ring: Vec<Coord<f64>> = (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let angle = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
                    Coord {
                        x: center.lon + radius * angle.cos(),
                        y: center.lat + radius * angle.sin(),
                    }
                })
                .collect();
            // Polygon::new closes the ring
            Geometry::Polygon(Polygon::new(LineString::new(ring), vec![]))
        } else {
            Geometry::Point(origin)
        };

        let envelope = match shape.bounding_rect() {
            Some(rect) => {
                AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
            }
            None => AABB::from_point([center.lon, center.lat]),
        };

        Self { shape, envelope }
    }

    /// Envelope used to pull candidates from the spatial index
    pub fn envelope(&self) -> &AABB<[f64; 2]> {
        &self.envelope
    }

    /// Planar intersection test (boundary contact counts)
    pub fn intersects(&self, geometry: &Geometry<f64>) -> bool {
        geometry.intersects(&self.shape)
    }
}

/// Convert a radius in meters to degrees
pub fn radius_degrees(radius_meters: f64) -> f64 {
    radius_meters / METERS_PER_DEGREE
}
