//! Handler for Deflate (zlib) compressed chunks

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression as Level;

use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// Adobe Deflate handler (compression codes 8 and 32946)
pub struct DeflateHandler {
    level: Level,
}

impl DeflateHandler {
    /// Handler compressing at `level` (0-9)
    pub fn with_level(level: u32) -> Self {
        DeflateHandler {
            level: Level::new(level.min(9)),
        }
    }
}

impl Default for DeflateHandler {
    fn default() -> Self {
        DeflateHandler {
            level: Level::default(),
        }
    }
}

impl CompressionHandler for DeflateHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| TiffError::Codec(format!("deflate: {}", e)))?;
        Ok(out)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn name(&self) -> &'static str {
        "Adobe Deflate"
    }
}
