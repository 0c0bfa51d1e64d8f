//! Polygon and multi-polygon geometry
//!
//! Rings are stored closed (first vertex repeated at the end). Point
//! containment uses the even-odd rule over the exterior and all holes.

use super::bbox::BoundingBox;
use super::point::Point;
use crate::errors::{GeoLabelError, Result};

/// A polygon with one exterior ring and optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon<S> {
    exterior: Vec<Point<S>>,
    holes: Vec<Vec<Point<S>>>,
}

impl<S: Copy> Polygon<S> {
    /// Build a polygon, closing any ring that is not already closed.
    pub fn new(exterior: Vec<Point<S>>, holes: Vec<Vec<Point<S>>>) -> Result<Self> {
        let exterior = close_ring(exterior, "exterior")?;
        let holes = holes
            .into_iter()
            .map(|ring| close_ring(ring, "hole"))
            .collect::<Result<Vec<_>>>()?;
        Ok(Polygon { exterior, holes })
    }

    /// Rectangle covering `bbox`, counter-clockwise.
    pub fn rectangle(bbox: &BoundingBox<S>) -> Self {
        let corners = bbox.corners();
        let mut exterior = corners.to_vec();
        exterior.push(corners[0]);
        Polygon {
            exterior,
            holes: Vec::new(),
        }
    }

    pub fn exterior(&self) -> &[Point<S>] {
        &self.exterior
    }

    pub fn holes(&self) -> &[Vec<Point<S>>] {
        &self.holes
    }

    /// Every ring, exterior first.
    pub fn rings(&self) -> impl Iterator<Item = &[Point<S>]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Bounding box of the exterior ring.
    pub fn bounds(&self) -> BoundingBox<S> {
        let first = self.exterior[0];
        let mut bbox = BoundingBox::new(first.x, first.y, first.x, first.y);
        for p in &self.exterior[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        bbox
    }

    /// Even-odd point containment; points inside a hole are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.rings()
            .fold(false, |inside, ring| inside ^ ring_contains(ring, x, y))
    }

    /// Strip elevation from every vertex.
    pub fn to_2d(&self) -> Polygon<S> {
        Polygon {
            exterior: self.exterior.iter().map(|p| p.to_2d()).collect(),
            holes: self
                .holes
                .iter()
                .map(|ring| ring.iter().map(|p| p.to_2d()).collect())
                .collect(),
        }
    }

    /// True when any vertex carries a Z coordinate.
    pub fn has_z(&self) -> bool {
        self.rings().flatten().any(|p| p.has_z())
    }

    /// Apply a fallible point mapping to every vertex.
    pub fn try_map_points<F>(&self, mut f: F) -> Result<Polygon<S>>
    where
        F: FnMut(&Point<S>) -> Result<Point<S>>,
    {
        let exterior = self.exterior.iter().map(&mut f).collect::<Result<Vec<_>>>()?;
        let mut holes = Vec::with_capacity(self.holes.len());
        for ring in &self.holes {
            holes.push(ring.iter().map(&mut f).collect::<Result<Vec<_>>>()?);
        }
        Ok(Polygon { exterior, holes })
    }

    /// Area-or-boundary intersection test between two polygons.
    pub fn intersects(&self, other: &Polygon<S>) -> bool {
        if !self.bounds().intersects(&other.bounds()) {
            return false;
        }

        for ring_a in self.rings() {
            for ring_b in other.rings() {
                if rings_cross(ring_a, ring_b) {
                    return true;
                }
            }
        }

        // No boundary crossings: either one lies inside the other or they
        // are disjoint.
        let a = self.exterior[0];
        let b = other.exterior[0];
        other.contains(a.x, a.y) || self.contains(b.x, b.y)
    }
}

/// A polygonal geometry in coordinate space `S`
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry<S> {
    Polygon(Polygon<S>),
    MultiPolygon(Vec<Polygon<S>>),
}

impl<S: Copy> Geometry<S> {
    /// Member polygons (one for a plain polygon).
    pub fn polygons(&self) -> &[Polygon<S>] {
        match self {
            Geometry::Polygon(p) => std::slice::from_ref(p),
            Geometry::MultiPolygon(parts) => parts,
        }
    }

    /// Bounding box over all member polygons; `None` for an empty
    /// multi-polygon.
    pub fn bounds(&self) -> Option<BoundingBox<S>> {
        self.polygons()
            .iter()
            .map(|p| p.bounds())
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygons().iter().any(|p| p.contains(x, y))
    }

    pub fn intersects_polygon(&self, polygon: &Polygon<S>) -> bool {
        self.polygons().iter().any(|p| p.intersects(polygon))
    }

    pub fn intersects(&self, other: &Geometry<S>) -> bool {
        other
            .polygons()
            .iter()
            .any(|p| self.intersects_polygon(p))
    }

    pub fn to_2d(&self) -> Geometry<S> {
        match self {
            Geometry::Polygon(p) => Geometry::Polygon(p.to_2d()),
            Geometry::MultiPolygon(parts) => {
                Geometry::MultiPolygon(parts.iter().map(|p| p.to_2d()).collect())
            }
        }
    }

    pub fn try_map_points<F>(&self, mut f: F) -> Result<Geometry<S>>
    where
        F: FnMut(&Point<S>) -> Result<Point<S>>,
    {
        Ok(match self {
            Geometry::Polygon(p) => Geometry::Polygon(p.try_map_points(&mut f)?),
            Geometry::MultiPolygon(parts) => Geometry::MultiPolygon(
                parts
                    .iter()
                    .map(|p| p.try_map_points(&mut f))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }
}

impl<S> From<Polygon<S>> for Geometry<S> {
    fn from(polygon: Polygon<S>) -> Self {
        Geometry::Polygon(polygon)
    }
}

fn close_ring<S: Copy>(mut ring: Vec<Point<S>>, role: &str) -> Result<Vec<Point<S>>> {
    if let Some(bad) = ring.iter().find(|p| !p.is_finite()) {
        return Err(GeoLabelError::InvalidGeometry(format!(
            "{} ring has a non-finite vertex ({}, {})",
            role, bad.x, bad.y
        )));
    }
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first.x != last.x || first.y != last.y {
            ring.push(first);
        }
    }
    if ring.len() < 4 {
        return Err(GeoLabelError::InvalidGeometry(format!(
            "{} ring needs at least 3 distinct vertices, got {}",
            role,
            ring.len().saturating_sub(1)
        )));
    }
    Ok(ring)
}

fn ring_contains<S>(ring: &[Point<S>], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (pi, pj) = (&ring[i], &ring[j]);
        if (pi.y > y) != (pj.y > y) && x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn rings_cross<S>(a: &[Point<S>], b: &[Point<S>]) -> bool {
    a.windows(2).any(|ea| {
        b.windows(2)
            .any(|eb| segments_intersect(&ea[0], &ea[1], &eb[0], &eb[1]))
    })
}

fn orientation<S>(p: &Point<S>, q: &Point<S>, r: &Point<S>) -> f64 {
    (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
}

fn on_segment<S>(p: &Point<S>, q: &Point<S>, r: &Point<S>) -> bool {
    r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
}

fn segments_intersect<S>(p1: &Point<S>, p2: &Point<S>, q1: &Point<S>, q2: &Point<S>) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
