//! Sample data types and the horizontal differencing predictor

use std::fmt;

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::sample_format;
use crate::tiff::errors::{TiffError, TiffResult};

/// Numeric type of one raster sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl SampleType {
    /// Resolve from SampleFormat and BitsPerSample tag values
    pub fn from_tiff(format: u16, bits: u16) -> TiffResult<Self> {
        let sample_type = match (format, bits) {
            (sample_format::UNSIGNED, 8) => SampleType::U8,
            (sample_format::UNSIGNED, 16) => SampleType::U16,
            (sample_format::UNSIGNED, 32) => SampleType::U32,
            (sample_format::SIGNED, 8) => SampleType::I8,
            (sample_format::SIGNED, 16) => SampleType::I16,
            (sample_format::SIGNED, 32) => SampleType::I32,
            (sample_format::IEEEFP, 32) => SampleType::F32,
            (sample_format::IEEEFP, 64) => SampleType::F64,
            _ => return Err(TiffError::UnsupportedSampleType { format, bits }),
        };
        Ok(sample_type)
    }

    pub fn bits(&self) -> u16 {
        self.size() as u16 * 8
    }

    /// Bytes per sample
    pub fn size(&self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }

    /// SampleFormat tag value
    pub fn format_code(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::U16 | SampleType::U32 => sample_format::UNSIGNED,
            SampleType::I8 | SampleType::I16 | SampleType::I32 => sample_format::SIGNED,
            SampleType::F32 | SampleType::F64 => sample_format::IEEEFP,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    /// Decode one sample from the start of `buf`
    pub fn decode(&self, buf: &[u8], order: ByteOrder) -> f64 {
        match self {
            SampleType::U8 => buf[0] as f64,
            SampleType::I8 => buf[0] as i8 as f64,
            SampleType::U16 => order.u16_from(buf) as f64,
            SampleType::I16 => order.u16_from(buf) as i16 as f64,
            SampleType::U32 => order.u32_from(buf) as f64,
            SampleType::I32 => order.u32_from(buf) as i32 as f64,
            SampleType::F32 => order.f32_from(buf) as f64,
            SampleType::F64 => order.f64_from(buf),
        }
    }

    /// Append one little-endian sample; integer types round and saturate
    pub fn encode_le(&self, value: f64, out: &mut Vec<u8>) {
        match self {
            SampleType::U8 => out.push(value.round() as u8),
            SampleType::I8 => out.push(value.round() as i8 as u8),
            SampleType::U16 => out.extend_from_slice(&(value.round() as u16).to_le_bytes()),
            SampleType::I16 => out.extend_from_slice(&(value.round() as i16).to_le_bytes()),
            SampleType::U32 => out.extend_from_slice(&(value.round() as u32).to_le_bytes()),
            SampleType::I32 => out.extend_from_slice(&(value.round() as i32).to_le_bytes()),
            SampleType::F32 => out.extend_from_slice(&(value as f32).to_le_bytes()),
            SampleType::F64 => out.extend_from_slice(&value.to_le_bytes()),
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "uint8",
            SampleType::U16 => "uint16",
            SampleType::U32 => "uint32",
            SampleType::I8 => "int8",
            SampleType::I16 => "int16",
            SampleType::I32 => "int32",
            SampleType::F32 => "float32",
            SampleType::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// Undo horizontal differencing (predictor 2) in place
///
/// `buf` holds `rows` rows of `row_pixels` pixels, each with
/// `samples_per_pixel` integer samples of `sample_size` bytes.
pub fn undo_horizontal_predictor(
    buf: &mut [u8],
    order: ByteOrder,
    sample_size: usize,
    samples_per_pixel: usize,
    row_pixels: usize,
) {
    let row_samples = row_pixels * samples_per_pixel;
    let row_bytes = row_samples * sample_size;
    if row_bytes == 0 {
        return;
    }

    for row in buf.chunks_exact_mut(row_bytes) {
        for i in samples_per_pixel..row_samples {
            let cur = i * sample_size;
            let prev = (i - samples_per_pixel) * sample_size;
            match sample_size {
                1 => row[cur] = row[cur].wrapping_add(row[prev]),
                2 => {
                    let v = order.u16_from(&row[cur..]).wrapping_add(order.u16_from(&row[prev..]));
                    order.write_u16_into(&mut row[cur..], v);
                }
                4 => {
                    let v = order.u32_from(&row[cur..]).wrapping_add(order.u32_from(&row[prev..]));
                    order.write_u32_into(&mut row[cur..], v);
                }
                _ => {
                    let v = order.u64_from(&row[cur..]).wrapping_add(order.u64_from(&row[prev..]));
                    order.write_u64_into(&mut row[cur..], v);
                }
            }
        }
    }
}
