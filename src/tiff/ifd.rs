//! Image File Directory (IFD) structures
//!
//! An IFD is a list of tag entries describing one image. Each entry either
//! holds its value inline (when it fits the 4/8-byte value field) or an
//! offset to the value array elsewhere in the file.

use std::collections::HashMap;

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::field_types;
use crate::tiff::errors::{TiffError, TiffResult};

/// Represents an entry in an Image File Directory
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Raw value field as stored in the file (4 bytes used for classic
    /// TIFF, 8 for BigTIFF)
    pub value_field: [u8; 8],
}

impl IFDEntry {
    pub fn new(tag: u16, field_type: u16, count: u64, value_field: [u8; 8]) -> Self {
        IFDEntry {
            tag,
            field_type,
            count,
            value_field,
        }
    }

    /// Total size of the value array in bytes, `None` for unknown types
    pub fn value_size(&self) -> Option<u64> {
        field_types::size_of(self.field_type).map(|size| size as u64 * self.count)
    }

    /// Whether the value array lives in the entry itself
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        self.value_size().map_or(false, |size| size <= inline_size)
    }

    /// Interpret the value field as an offset into the file
    pub fn value_offset(&self, byte_order: ByteOrder, is_big_tiff: bool) -> u64 {
        if is_big_tiff {
            byte_order.u64_from(&self.value_field)
        } else {
            byte_order.u32_from(&self.value_field) as u64
        }
    }
}

/// A decoded tag value array
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Unsigned(Vec<u64>),
    Signed(Vec<i64>),
    Float(Vec<f64>),
    Ascii(String),
    Bytes(Vec<u8>),
}

impl TagValue {
    /// Decode `raw` (exactly the value array bytes) according to `field_type`
    pub fn decode(tag: u16, field_type: u16, raw: &[u8], byte_order: ByteOrder) -> TiffResult<Self> {
        let value = match field_type {
            field_types::BYTE => TagValue::Unsigned(raw.iter().map(|&b| b as u64).collect()),
            field_types::SBYTE => TagValue::Signed(raw.iter().map(|&b| b as i8 as i64).collect()),
            field_types::UNDEFINED => TagValue::Bytes(raw.to_vec()),
            field_types::ASCII => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                TagValue::Ascii(String::from_utf8_lossy(&raw[..end]).into_owned())
            }
            field_types::SHORT => TagValue::Unsigned(
                raw.chunks_exact(2).map(|c| byte_order.u16_from(c) as u64).collect(),
            ),
            field_types::SSHORT => TagValue::Signed(
                raw.chunks_exact(2)
                    .map(|c| byte_order.u16_from(c) as i16 as i64)
                    .collect(),
            ),
            field_types::LONG => {
                TagValue::Unsigned(raw.chunks_exact(4).map(|c| byte_order.u32_from(c) as u64).collect())
            }
            field_types::SLONG => TagValue::Signed(
                raw.chunks_exact(4)
                    .map(|c| byte_order.u32_from(c) as i32 as i64)
                    .collect(),
            ),
            field_types::LONG8 | field_types::IFD8 => {
                TagValue::Unsigned(raw.chunks_exact(8).map(|c| byte_order.u64_from(c)).collect())
            }
            field_types::SLONG8 => TagValue::Signed(
                raw.chunks_exact(8).map(|c| byte_order.u64_from(c) as i64).collect(),
            ),
            field_types::FLOAT => TagValue::Float(
                raw.chunks_exact(4).map(|c| byte_order.f32_from(c) as f64).collect(),
            ),
            field_types::DOUBLE => {
                TagValue::Float(raw.chunks_exact(8).map(|c| byte_order.f64_from(c)).collect())
            }
            field_types::RATIONAL => TagValue::Float(
                raw.chunks_exact(8)
                    .map(|c| {
                        let num = byte_order.u32_from(&c[..4]) as f64;
                        let den = byte_order.u32_from(&c[4..]) as f64;
                        num / den
                    })
                    .collect(),
            ),
            field_types::SRATIONAL => TagValue::Float(
                raw.chunks_exact(8)
                    .map(|c| {
                        let num = byte_order.u32_from(&c[..4]) as i32 as f64;
                        let den = byte_order.u32_from(&c[4..]) as i32 as f64;
                        num / den
                    })
                    .collect(),
            ),
            other => {
                return Err(TiffError::InvalidTagValue {
                    tag,
                    reason: format!("unknown field type {}", other),
                })
            }
        };
        Ok(value)
    }

    /// Values as unsigned integers; negative or fractional values fail
    pub fn as_u64s(&self, tag: u16) -> TiffResult<Vec<u64>> {
        match self {
            TagValue::Unsigned(v) => Ok(v.clone()),
            TagValue::Signed(v) => v
                .iter()
                .map(|&x| {
                    u64::try_from(x).map_err(|_| TiffError::InvalidTagValue {
                        tag,
                        reason: format!("negative value {}", x),
                    })
                })
                .collect(),
            _ => Err(TiffError::InvalidTagValue {
                tag,
                reason: "expected integer values".to_string(),
            }),
        }
    }

    /// Values widened to f64
    pub fn as_f64s(&self, tag: u16) -> TiffResult<Vec<f64>> {
        match self {
            TagValue::Unsigned(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            TagValue::Signed(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            TagValue::Float(v) => Ok(v.clone()),
            _ => Err(TiffError::InvalidTagValue {
                tag,
                reason: "expected numeric values".to_string(),
            }),
        }
    }

    /// First value as u64
    pub fn first_u64(&self, tag: u16) -> TiffResult<u64> {
        self.as_u64s(tag)?
            .first()
            .copied()
            .ok_or_else(|| TiffError::InvalidTagValue {
                tag,
                reason: "empty value array".to_string(),
            })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }
}

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in this IFD, in file order
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    tag_map: HashMap<u16, usize>,
}

impl IFD {
    pub fn new(number: usize, offset: u64) -> Self {
        IFD {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry; a repeated tag replaces the earlier lookup target
    pub fn add_entry(&mut self, entry: IFDEntry) {
        self.tag_map.insert(entry.tag, self.entries.len());
        self.entries.push(entry);
    }

    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&i| &self.entries[i])
    }

    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorts_decode_in_both_byte_orders() {
        let le = TagValue::decode(258, field_types::SHORT, &[8, 0, 16, 0], ByteOrder::LittleEndian).unwrap();
        assert_eq!(le, TagValue::Unsigned(vec![8, 16]));

        let be = TagValue::decode(258, field_types::SHORT, &[0, 8, 0, 16], ByteOrder::BigEndian).unwrap();
        assert_eq!(be, TagValue::Unsigned(vec![8, 16]));
    }

    #[test]
    fn ascii_stops_at_nul() {
        let v = TagValue::decode(42113, field_types::ASCII, b"-9999\0\0", ByteOrder::LittleEndian).unwrap();
        assert_eq!(v.as_str(), Some("-9999"));
    }

    #[test]
    fn doubles_decode() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&0.5f64.to_le_bytes());
        raw.extend_from_slice(&(-2.25f64).to_le_bytes());
        let v = TagValue::decode(33550, field_types::DOUBLE, &raw, ByteOrder::LittleEndian).unwrap();
        assert_eq!(v.as_f64s(33550).unwrap(), vec![0.5, -2.25]);
        assert!(v.as_u64s(33550).is_err());
    }

    #[test]
    fn inline_detection_depends_on_format() {
        let entry = IFDEntry::new(33550, field_types::LONG, 2, [0; 8]);
        assert!(!entry.is_value_inline(false));
        assert!(entry.is_value_inline(true));
    }

    #[test]
    fn lookup_by_tag() {
        let mut ifd = IFD::new(0, 8);
        ifd.add_entry(IFDEntry::new(256, field_types::SHORT, 1, [10, 0, 0, 0, 0, 0, 0, 0]));
        assert!(ifd.has_tag(256));
        assert!(!ifd.has_tag(257));
        assert_eq!(ifd.get_entry(256).map(|e| e.count), Some(1));
    }
}
