//! Bounding box structure for defining regions

use std::fmt;
use std::marker::PhantomData;

use super::point::Point;

/// An axis-aligned bounding box in coordinate space `S`
#[derive(Clone, Copy, PartialEq)]
pub struct BoundingBox<S> {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
    _space: PhantomData<S>,
}

impl<S> BoundingBox<S> {
    /// Create a new bounding box from its min/max coordinates
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
            _space: PhantomData,
        }
    }

    /// Create a bounding box from two opposite corners given in any order
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        BoundingBox::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
    }

    /// Smallest box covering every point, or `None` for an empty iterator
    pub fn from_points<'p, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'p Point<S>>,
        S: 'p,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = BoundingBox::new(first.x, first.y, first.x, first.y);
        for p in iter {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    /// Parse a bounding box from a string (format: "minx,miny,maxx,maxy")
    pub fn from_string(bbox_str: &str) -> Result<Self, String> {
        let parts: Vec<&str> = bbox_str.split(',').collect();
        if parts.len() != 4 {
            return Err("Bounding box must have 4 comma-separated values".to_string());
        }

        let mut values = [0.0f64; 4];
        for (slot, (part, name)) in values
            .iter_mut()
            .zip(parts.iter().zip(["min_x", "min_y", "max_x", "max_y"]))
        {
            *slot = part
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid {} value: '{}'", name, part.trim()))?;
        }

        Ok(BoundingBox::from_corners(values[0], values[1], values[2], values[3]))
    }

    /// Get the width of the bounding box
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounding box
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Get the center point of the bounding box
    pub fn center(&self) -> Point<S> {
        Point::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    /// The four corners, counter-clockwise from (min_x, min_y)
    pub fn corners(&self) -> [Point<S>; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// Check if a point is inside the bounding box (edges inclusive)
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check if two boxes share any area or boundary
    pub fn intersects(&self, other: &BoundingBox<S>) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Smallest box covering both boxes
    pub fn union(&self, other: &BoundingBox<S>) -> BoundingBox<S> {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Compare with another box, allowing `tolerance` on every edge
    pub fn approx_eq(&self, other: &BoundingBox<S>, tolerance: f64) -> bool {
        (self.min_x - other.min_x).abs() <= tolerance
            && (self.min_y - other.min_y).abs() <= tolerance
            && (self.max_x - other.max_x).abs() <= tolerance
            && (self.max_y - other.max_y).abs() <= tolerance
    }
}

impl<S> fmt::Debug for BoundingBox<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BoundingBox([{}, {}]-[{}, {}])",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl<S> fmt::Display for BoundingBox<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]-[{}, {}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
