//! Reprojection between coordinate reference systems

use std::f64::consts::PI;

use log::debug;

use super::crs::Crs;
use super::point::Point;
use super::polygon::Geometry;
use super::space::Geo;
use crate::errors::{GeoLabelError, Result};

/// Transformer for converting geometry between coordinate systems
///
/// Supports the identity and spherical Web Mercator <-> WGS 84.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Earth radius in meters
    const EARTH_RADIUS: f64 = 6378137.0;
    /// Latitude limit of the Web Mercator square
    const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

    pub fn new() -> Self {
        CoordinateTransformer
    }

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.clamp(-Self::MAX_MERCATOR_LAT, Self::MAX_MERCATOR_LAT);
        let x = lon.to_radians() * Self::EARTH_RADIUS;
        let y = ((90.0 + lat) * PI / 360.0).tan().ln() * Self::EARTH_RADIUS;
        (x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / Self::EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / Self::EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }

    /// Whether `from -> to` can be handled
    pub fn supports(&self, from: &Crs, to: &Crs) -> bool {
        from == to
            || matches!(
                (from, to),
                (Crs::Epsg(4326), Crs::Epsg(3857)) | (Crs::Epsg(3857), Crs::Epsg(4326))
            )
    }

    /// Transform a point between coordinate systems, keeping any Z value
    pub fn transform_point(&self, point: &Point<Geo>, from: &Crs, to: &Crs) -> Result<Point<Geo>> {
        if from == to {
            return Ok(*point);
        }

        let (x, y) = match (from, to) {
            (Crs::Epsg(4326), Crs::Epsg(3857)) => self.wgs84_to_web_mercator(point.x, point.y),
            (Crs::Epsg(3857), Crs::Epsg(4326)) => self.web_mercator_to_wgs84(point.x, point.y),
            _ => {
                return Err(GeoLabelError::Reprojection {
                    from: *from,
                    to: *to,
                })
            }
        };

        Ok(match point.z {
            Some(z) => Point::new_3d(x, y, z),
            None => Point::new(x, y),
        })
    }

    /// Reproject every vertex of a geometry
    pub fn transform_geometry(
        &self,
        geometry: &Geometry<Geo>,
        from: &Crs,
        to: &Crs,
    ) -> Result<Geometry<Geo>> {
        if from == to {
            return Ok(geometry.clone());
        }
        if !self.supports(from, to) {
            return Err(GeoLabelError::Reprojection {
                from: *from,
                to: *to,
            });
        }
        debug!("Reprojecting geometry from {} to {}", from, to);
        geometry.try_map_points(|p| self.transform_point(p, from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{BoundingBox, Polygon};

    #[test]
    fn mercator_round_trip() {
        let t = CoordinateTransformer::new();
        let (x, y) = t.wgs84_to_web_mercator(13.4, 52.5);
        assert!((x - 1_491_681.0).abs() < 10.0);
        assert!((y - 6_891_041.0).abs() < 10.0);

        let (lon, lat) = t.web_mercator_to_wgs84(x, y);
        assert!((lon - 13.4).abs() < 1e-9);
        assert!((lat - 52.5).abs() < 1e-9);
    }

    #[test]
    fn same_crs_is_identity_even_when_unknown() {
        let t = CoordinateTransformer::new();
        let p = Point::<Geo>::new_3d(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point(&p, &Crs::Unknown, &Crs::Unknown).unwrap(), p);
    }

    #[test]
    fn unsupported_pairs_fail() {
        let t = CoordinateTransformer::new();
        let poly: Geometry<Geo> = Polygon::rectangle(&BoundingBox::new(0.0, 0.0, 1.0, 1.0)).into();
        let err = t
            .transform_geometry(&poly, &Crs::Epsg(32633), &Crs::WGS84)
            .unwrap_err();
        assert!(matches!(err, GeoLabelError::Reprojection { .. }));
    }

    #[test]
    fn geometry_is_reprojected_vertexwise() {
        let t = CoordinateTransformer::new();
        let poly: Geometry<Geo> = Polygon::rectangle(&BoundingBox::new(0.0, 0.0, 1.0, 1.0)).into();
        let merc = t.transform_geometry(&poly, &Crs::WGS84, &Crs::WEB_MERCATOR).unwrap();
        let bounds = merc.bounds().unwrap();
        assert!((bounds.max_x - 111_319.49).abs() < 0.01);
        assert!(bounds.min_y.abs() < 1e-6);
    }
}
