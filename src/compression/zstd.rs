//! Handler for ZSTD compressed chunks

use log::debug;

use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// ZSTD compression handler (compression code 14)
pub struct ZstdHandler {
    /// Compression level (1-22)
    compression_level: i32,
}

impl ZstdHandler {
    /// Create a handler with the given level, clamped to 1-22
    pub fn with_level(level: i32) -> Self {
        ZstdHandler {
            compression_level: level.clamp(1, 22),
        }
    }
}

impl Default for ZstdHandler {
    fn default() -> Self {
        ZstdHandler::with_level(3)
    }
}

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let out = zstd::decode_all(data).map_err(|e| TiffError::Codec(format!("zstd: {}", e)))?;
        debug!("ZSTD decompressed {} -> {} bytes", data.len(), out.len());
        Ok(out)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        zstd::encode_all(data, self.compression_level)
            .map_err(|e| TiffError::Codec(format!("zstd: {}", e)))
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }
}
