//! Coordinate space marker types.
//!
//! Uninhabited enums used as type parameters so that pixel-space and
//! geographic-space geometry cannot be mixed by accident.

use std::fmt;

/// Raster grid space: `x` is the column, `y` the row, origin at the
/// top-left corner of the top-left cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Geographic (map) space of some coordinate reference system.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geo {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Geo {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
