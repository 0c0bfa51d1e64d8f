//! Coordinate handling for geospatial data
//!
//! Pixel-space and geographic-space geometry are distinguished at the type
//! level through the [`Pixel`] and [`Geo`] markers.

mod affine;
mod bbox;
mod crs;
mod point;
mod polygon;
mod space;
mod transform;

// Re-export key types
pub use self::affine::AffineTransform;
pub use self::bbox::BoundingBox;
pub use self::crs::Crs;
pub use self::point::Point;
pub use self::polygon::{Geometry, Polygon};
pub use self::space::{Geo, Pixel};
pub use self::transform::CoordinateTransformer;
