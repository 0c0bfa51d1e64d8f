//! Affine pixel <-> geographic transform
//!
//! A raster's geo-referencing is the six coefficients `(a, b, c, d, e, f)`:
//!
//! ```text
//! x = a * col + b * row + c
//! y = d * col + e * row + f
//! ```
//!
//! The inverse is computed once at construction, so a constructed
//! [`AffineTransform`] is always invertible and `inverse` cannot fail.

use std::fmt;

use crate::coordinate::{BoundingBox, Geo, Pixel, Point};
use crate::errors::{GeoLabelError, Result};

/// Invertible affine map between pixel and geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    // Coefficients of the inverse map, same layout.
    inv: [f64; 6],
}

impl AffineTransform {
    /// Build a transform, rejecting a singular or non-finite linear part.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<Self> {
        let determinant = a * e - b * d;
        if determinant == 0.0 || !determinant.is_finite() {
            return Err(GeoLabelError::SingularTransform {
                a,
                b,
                d,
                e,
                determinant,
            });
        }
        if !c.is_finite() || !f.is_finite() {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "affine translation must be finite, got ({}, {})",
                c, f
            )));
        }

        let ia = e / determinant;
        let ib = -b / determinant;
        let id = -d / determinant;
        let ie = a / determinant;
        let ic = -(ia * c + ib * f);
        let if_ = -(id * c + ie * f);

        Ok(AffineTransform {
            a,
            b,
            c,
            d,
            e,
            f,
            inv: [ia, ib, ic, id, ie, if_],
        })
    }

    /// Pixel units equal geographic units, no offset.
    pub fn identity() -> Self {
        AffineTransform {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 1.0,
            f: 0.0,
            inv: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        }
    }

    /// Build from a GDAL-ordered geotransform `[c, a, b, f, d, e]`.
    pub fn from_gdal(gt: [f64; 6]) -> Result<Self> {
        AffineTransform::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// GDAL-ordered geotransform `[c, a, b, f, d, e]`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Coefficients `(a, b, c, d, e, f)`.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Pixel (col, row) to geographic (x, y).
    pub fn forward(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Geographic (x, y) to pixel (col, row).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let [ia, ib, ic, id, ie, if_] = self.inv;
        (ia * x + ib * y + ic, id * x + ie * y + if_)
    }

    pub fn forward_point(&self, p: &Point<Pixel>) -> Point<Geo> {
        let (x, y) = self.forward(p.x, p.y);
        Point::new(x, y)
    }

    pub fn inverse_point(&self, p: &Point<Geo>) -> Point<Pixel> {
        let (col, row) = self.inverse(p.x, p.y);
        Point::new(col, row)
    }

    /// Pixel-space bounding box of a geographic box.
    ///
    /// All four corners are mapped, so rotated or skewed transforms yield
    /// the axis-aligned hull of the mapped quadrilateral.
    pub fn geo_box_to_pixel(&self, bbox: &BoundingBox<Geo>) -> BoundingBox<Pixel> {
        let mapped = bbox.corners().map(|c| self.inverse_point(&c));
        hull(&mapped)
    }

    /// Geographic bounding box of a pixel box, mapping all four corners.
    pub fn pixel_box_to_geo(&self, bbox: &BoundingBox<Pixel>) -> BoundingBox<Geo> {
        let mapped = bbox.corners().map(|c| self.forward_point(&c));
        hull(&mapped)
    }

    /// The same linear part with pixel `(col, row)` moved to the origin.
    ///
    /// Used for crops and tiles: pixel (0, 0) of the result maps to the
    /// same geographic point as pixel `(col, row)` of `self`.
    pub fn translated(&self, col: f64, row: f64) -> AffineTransform {
        let (c, f) = self.forward(col, row);
        let [ia, ib, _, id, ie, _] = self.inv;
        AffineTransform {
            c,
            f,
            inv: [ia, ib, -(ia * c + ib * f), id, ie, -(id * c + ie * f)],
            ..*self
        }
    }

    /// True when the transform has no rotation or skew terms.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Cell size along x and y (signed, as stored).
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.a, self.e)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        AffineTransform::identity()
    }
}

impl fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "| {:.6} {:.6} {:.6} |\n| {:.6} {:.6} {:.6} |",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

fn hull<S>(points: &[Point<S>; 4]) -> BoundingBox<S> {
    let mut bbox = BoundingBox::new(points[0].x, points[0].y, points[0].x, points[0].y);
    for p in &points[1..] {
        bbox.min_x = bbox.min_x.min(p.x);
        bbox.min_y = bbox.min_y.min(p.y);
        bbox.max_x = bbox.max_x.max(p.x);
        bbox.max_y = bbox.max_y.max(p.y);
    }
    bbox
}
