//! Byte order handling for TIFF files
//!
//! TIFF data can be stored little-endian ("II") or big-endian ("MM"). The
//! byte order is detected from the header and then used both for stream
//! reads (header, IFD entries) and for decoding in-memory buffers (tag
//! value arrays, decompressed sample blocks).

use byteorder::{BigEndian, ByteOrder as _, LittleEndian, ReadBytesExt};
use std::io::Result;

use crate::io::SeekableReader;
use crate::tiff::errors::{TiffError, TiffResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the first two header bytes
    pub fn detect(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        let marker = reader.read_u16::<LittleEndian>()?;
        match marker {
            0x4949 => Ok(ByteOrder::LittleEndian), // "II" (Intel)
            0x4D4D => Ok(ByteOrder::BigEndian),    // "MM" (Motorola)
            _ => Err(TiffError::InvalidByteOrder(marker)),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    pub fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        match self {
            ByteOrder::LittleEndian => reader.read_u16::<LittleEndian>(),
            ByteOrder::BigEndian => reader.read_u16::<BigEndian>(),
        }
    }

    pub fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        match self {
            ByteOrder::LittleEndian => reader.read_u32::<LittleEndian>(),
            ByteOrder::BigEndian => reader.read_u32::<BigEndian>(),
        }
    }

    pub fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        match self {
            ByteOrder::LittleEndian => reader.read_u64::<LittleEndian>(),
            ByteOrder::BigEndian => reader.read_u64::<BigEndian>(),
        }
    }

    /// Decode a u16 from the first two bytes of `buf`
    pub fn u16_from(&self, buf: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => LittleEndian::read_u16(buf),
            ByteOrder::BigEndian => BigEndian::read_u16(buf),
        }
    }

    pub fn u32_from(&self, buf: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => LittleEndian::read_u32(buf),
            ByteOrder::BigEndian => BigEndian::read_u32(buf),
        }
    }

    pub fn u64_from(&self, buf: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => LittleEndian::read_u64(buf),
            ByteOrder::BigEndian => BigEndian::read_u64(buf),
        }
    }

    pub fn f32_from(&self, buf: &[u8]) -> f32 {
        f32::from_bits(self.u32_from(buf))
    }

    pub fn f64_from(&self, buf: &[u8]) -> f64 {
        f64::from_bits(self.u64_from(buf))
    }

    /// Encode a u16 into the first two bytes of `buf`
    pub fn write_u16_into(&self, buf: &mut [u8], value: u16) {
        match self {
            ByteOrder::LittleEndian => LittleEndian::write_u16(buf, value),
            ByteOrder::BigEndian => BigEndian::write_u16(buf, value),
        }
    }

    pub fn write_u32_into(&self, buf: &mut [u8], value: u32) {
        match self {
            ByteOrder::LittleEndian => LittleEndian::write_u32(buf, value),
            ByteOrder::BigEndian => BigEndian::write_u32(buf, value),
        }
    }

    pub fn write_u64_into(&self, buf: &mut [u8], value: u64) {
        match self {
            ByteOrder::LittleEndian => LittleEndian::write_u64(buf, value),
            ByteOrder::BigEndian => BigEndian::write_u64(buf, value),
        }
    }
}
