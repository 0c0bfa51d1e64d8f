//! Raster datasets and the operations on them
//!
//! - [`RasterGrid`]: immutable geo-referenced multi-band raster
//! - [`RadiometricNormalizer`]: percentile stretch to an 8-bit RGB image
//! - [`RasterClipper`]: crop and mask to a polygon
//! - [`TileCutter`]: fixed-size square tiles

pub mod clip;
pub mod grid;
pub mod normalize;
pub mod tiles;

pub use self::clip::{ClipResult, RasterClipper};
pub use self::grid::{PixelWindow, RasterGrid};
pub use self::normalize::RadiometricNormalizer;
pub use self::tiles::{Tile, TileCutter};
