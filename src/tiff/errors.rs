//! Error types for GeoTIFF decoding and encoding

use std::fmt;
use std::io;

/// GeoTIFF codec error types
#[derive(Debug)]
pub enum TiffError {
    /// I/O error
    IoError(io::Error),
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Header magic is neither 42 nor 43
    UnsupportedVersion(u16),
    /// BigTIFF header with an unexpected offset size
    InvalidBigTiffHeader,
    /// File contains no image directory
    NoImage,
    /// Required tag missing from the first IFD
    TagNotFound(u16),
    /// Tag value of an unexpected type or length
    InvalidTagValue { tag: u16, reason: String },
    /// Unsupported compression method
    UnsupportedCompression(u16),
    /// Unsupported predictor for the given sample type
    UnsupportedPredictor(u16),
    /// Unsupported sample format / bit depth combination
    UnsupportedSampleType { format: u16, bits: u16 },
    /// Decompressed chunk shorter than its declared geometry
    TruncatedChunk { index: usize, expected: usize, actual: usize },
    /// Compression codec failure
    Codec(String),
    /// Structurally broken file (offsets outside the file, loops, ...)
    Corrupt(String),
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::IoError(e) => write!(f, "I/O error: {}", e),
            TiffError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            TiffError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            TiffError::InvalidBigTiffHeader => write!(f, "Invalid BigTIFF header"),
            TiffError::NoImage => write!(f, "TIFF file contains no image directory"),
            TiffError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            TiffError::InvalidTagValue { tag, reason } => {
                write!(f, "Invalid value for tag {}: {}", tag, reason)
            }
            TiffError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            TiffError::UnsupportedPredictor(p) => write!(f, "Unsupported predictor: {}", p),
            TiffError::UnsupportedSampleType { format, bits } => write!(
                f,
                "Unsupported sample type: format {} with {} bits per sample",
                format, bits
            ),
            TiffError::TruncatedChunk { index, expected, actual } => write!(
                f,
                "Chunk {} decoded to {} bytes, expected at least {}",
                index, actual, expected
            ),
            TiffError::Codec(msg) => write!(f, "Compression error: {}", msg),
            TiffError::Corrupt(msg) => write!(f, "Corrupt TIFF: {}", msg),
        }
    }
}

impl std::error::Error for TiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TiffError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(error: io::Error) -> Self {
        TiffError::IoError(error)
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;
