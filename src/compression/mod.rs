//! Compression handling for TIFF image chunks
//!
//! Each supported TIFF compression code maps to a [`CompressionHandler`]
//! strategy; [`Compression`] is the code-level enum used by the decoder
//! and writer to pick one.

mod deflate;
mod handler;
mod uncompressed;
mod zstd;

pub use self::deflate::DeflateHandler;
pub use self::handler::CompressionHandler;
pub use self::uncompressed::UncompressedHandler;
pub use self::zstd::ZstdHandler;

use std::fmt;
use std::str::FromStr;

use crate::tiff::constants::compression as codes;
use crate::tiff::errors::{TiffError, TiffResult};

/// Compression schemes understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Deflate,
    Zstd,
}

impl Compression {
    /// Map a TIFF compression tag value
    pub fn from_code(code: u16) -> TiffResult<Self> {
        match code {
            codes::NONE => Ok(Compression::None),
            codes::DEFLATE | codes::DEFLATE_LEGACY => Ok(Compression::Deflate),
            codes::ZSTD => Ok(Compression::Zstd),
            other => Err(TiffError::UnsupportedCompression(other)),
        }
    }

    /// TIFF compression tag value written for this scheme
    pub fn code(&self) -> u16 {
        match self {
            Compression::None => codes::NONE,
            Compression::Deflate => codes::DEFLATE,
            Compression::Zstd => codes::ZSTD,
        }
    }

    /// Strategy object implementing this scheme
    pub fn handler(&self) -> Box<dyn CompressionHandler> {
        match self {
            Compression::None => Box::new(UncompressedHandler),
            Compression::Deflate => Box::new(DeflateHandler::default()),
            Compression::Zstd => Box::new(ZstdHandler::default()),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.handler().name())
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Compression::None),
            "deflate" | "zip" | "adobe deflate" => Ok(Compression::Deflate),
            "zstd" => Ok(Compression::Zstd),
            other => Err(format!("Unknown compression type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_both_ways() {
        assert_eq!(Compression::from_code(8).unwrap(), Compression::Deflate);
        assert_eq!(Compression::from_code(32946).unwrap(), Compression::Deflate);
        assert_eq!(Compression::Zstd.code(), 14);
        assert!(matches!(
            Compression::from_code(5),
            Err(TiffError::UnsupportedCompression(5))
        ));
    }

    #[test]
    fn every_scheme_round_trips_a_chunk() {
        let chunk: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        for scheme in [Compression::None, Compression::Deflate, Compression::Zstd] {
            let handler = scheme.handler();
            let packed = handler.compress(&chunk).unwrap();
            assert_eq!(handler.decompress(&packed).unwrap(), chunk, "{}", scheme);
        }
    }

    #[test]
    fn names_parse() {
        assert_eq!("ZIP".parse::<Compression>().unwrap(), Compression::Deflate);
        assert!("lzw".parse::<Compression>().is_err());
    }
}
