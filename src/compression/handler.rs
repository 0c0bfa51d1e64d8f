//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for one compression scheme
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip or tile
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Compress one strip or tile
    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Human-readable name of this compression method
    fn name(&self) -> &'static str;
}
