//! GeoTIFF reading and writing
//!
//! [`TiffReader`] parses the TIFF/BigTIFF container, [`RasterReader`]
//! decodes the first image into a [`RasterGrid`](crate::raster::RasterGrid)
//! and [`RasterWriter`] writes one back out.

pub(crate) mod constants;
pub mod decoder;
pub mod errors;
pub mod geokeys;
pub mod ifd;
pub mod reader;
pub mod samples;
pub mod writer;

#[cfg(test)]
mod tests;

pub use decoder::{ImageLayout, RasterReader};
pub use errors::{TiffError, TiffResult};
pub use geokeys::GeoReference;
pub use ifd::{IFDEntry, TagValue, IFD};
pub use reader::TiffReader;
pub use samples::SampleType;
pub use writer::RasterWriter;
