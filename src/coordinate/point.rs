//! Point structure for representing coordinates

use std::fmt;
use std::marker::PhantomData;

/// A point in coordinate space `S`
#[derive(Clone, Copy, PartialEq)]
pub struct Point<S> {
    /// X coordinate (column in pixel space, easting/longitude in geo space)
    pub x: f64,
    /// Y coordinate (row in pixel space, northing/latitude in geo space)
    pub y: f64,
    /// Z coordinate (elevation, optional)
    pub z: Option<f64>,
    _space: PhantomData<S>,
}

impl<S> Point<S> {
    /// Create a new 2D point
    pub fn new(x: f64, y: f64) -> Self {
        Point {
            x,
            y,
            z: None,
            _space: PhantomData,
        }
    }

    /// Create a new 3D point
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Point {
            x,
            y,
            z: Some(z),
            _space: PhantomData,
        }
    }

    /// Check if this point has a Z coordinate
    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    /// Drop the Z coordinate
    pub fn to_2d(self) -> Self {
        Point::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<S> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "Point({}, {}, {})", self.x, self.y, z),
            None => write!(f, "Point({}, {})", self.x, self.y),
        }
    }
}
