//! TIFF file reader implementation
//!
//! Parses the TIFF/BigTIFF header and the IFD chain, and gives access to
//! tag value arrays and raw image chunks. Pixel decoding lives in
//! [`crate::tiff::decoder`].

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::io::byte_order::ByteOrder;
use crate::io::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFDEntry, TagValue, IFD};

/// Reader for TIFF and BigTIFF files
pub struct TiffReader<R> {
    reader: R,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    first_ifd_offset: u64,
    file_size: u64,
}

impl TiffReader<BufReader<File>> {
    /// Opens a TIFF file and parses its header
    pub fn open(path: &Path) -> TiffResult<Self> {
        info!("Loading TIFF file: {}", path.display());
        let file = File::open(path)?;
        TiffReader::new(BufReader::with_capacity(1024 * 1024, file))
    }
}

impl<R: SeekableReader> TiffReader<R> {
    /// Wraps a reader positioned anywhere; the header is read from offset 0
    pub fn new(mut reader: R) -> TiffResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(&mut reader)?;
        let version = byte_order.read_u16(&mut reader)?;

        let (is_big_tiff, first_ifd_offset) = match version {
            header::TIFF_VERSION => (false, byte_order.read_u32(&mut reader)? as u64),
            header::BIG_TIFF_VERSION => {
                let offset_size = byte_order.read_u16(&mut reader)?;
                let _reserved = byte_order.read_u16(&mut reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE {
                    return Err(TiffError::InvalidBigTiffHeader);
                }
                (true, byte_order.read_u64(&mut reader)?)
            }
            other => return Err(TiffError::UnsupportedVersion(other)),
        };

        debug!(
            "TIFF header: {}, {}, first IFD at {}",
            byte_order.name(),
            if is_big_tiff { "BigTIFF" } else { "classic TIFF" },
            first_ifd_offset
        );

        Ok(TiffReader {
            reader,
            byte_order,
            is_big_tiff,
            first_ifd_offset,
            file_size,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Reads every IFD in the chain
    ///
    /// Stops at a zero next-offset, at an offset already visited, or at
    /// the first offset pointing outside the file.
    pub fn read_directories(&mut self) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = self.first_ifd_offset;

        while offset != 0 && ifds.len() < header::MAX_IFDS {
            if offset >= self.file_size {
                if ifds.is_empty() {
                    return Err(TiffError::Corrupt(format!(
                        "first IFD offset {} exceeds file size {}",
                        offset, self.file_size
                    )));
                }
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", offset, self.file_size);
                break;
            }
            if !visited.insert(offset) {
                warn!("IFD chain loops back to offset {}, stopping", offset);
                break;
            }

            let (ifd, next) = self.read_ifd(offset, ifds.len())?;
            debug!("Read IFD {} with {} entries", ifd.number, ifd.entries.len());
            ifds.push(ifd);
            offset = next;
        }

        if ifds.is_empty() {
            return Err(TiffError::NoImage);
        }
        Ok(ifds)
    }

    /// Reads one IFD and returns it with the offset of the next one
    fn read_ifd(&mut self, offset: u64, number: usize) -> TiffResult<(IFD, u64)> {
        self.reader.seek(SeekFrom::Start(offset))?;

        let (entry_count, entry_size) = if self.is_big_tiff {
            (self.byte_order.read_u64(&mut self.reader)?, 20u64)
        } else {
            (self.byte_order.read_u16(&mut self.reader)? as u64, 12u64)
        };

        if offset.saturating_add(entry_count.saturating_mul(entry_size)) > self.file_size {
            return Err(TiffError::Corrupt(format!(
                "IFD at {} declares {} entries, more than the file holds",
                offset, entry_count
            )));
        }

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            let entry = self.read_ifd_entry()?;
            ifd.add_entry(entry);
        }

        let next = if self.is_big_tiff {
            self.byte_order.read_u64(&mut self.reader)?
        } else {
            self.byte_order.read_u32(&mut self.reader)? as u64
        };

        Ok((ifd, next))
    }

    fn read_ifd_entry(&mut self) -> TiffResult<IFDEntry> {
        let tag = self.byte_order.read_u16(&mut self.reader)?;
        let field_type = self.byte_order.read_u16(&mut self.reader)?;

        let mut value_field = [0u8; 8];
        let count = if self.is_big_tiff {
            let count = self.byte_order.read_u64(&mut self.reader)?;
            self.reader.read_exact(&mut value_field)?;
            count
        } else {
            let count = self.byte_order.read_u32(&mut self.reader)? as u64;
            self.reader.read_exact(&mut value_field[..4])?;
            count
        };

        Ok(IFDEntry::new(tag, field_type, count, value_field))
    }

    /// Decodes the full value array of an entry
    pub fn read_values(&mut self, entry: &IFDEntry) -> TiffResult<TagValue> {
        let size = entry.value_size().ok_or_else(|| TiffError::InvalidTagValue {
            tag: entry.tag,
            reason: format!("unknown field type {}", entry.field_type),
        })?;

        let raw = if entry.is_value_inline(self.is_big_tiff) {
            entry.value_field[..size as usize].to_vec()
        } else {
            let offset = entry.value_offset(self.byte_order, self.is_big_tiff);
            self.read_chunk(offset, size)?
        };

        TagValue::decode(entry.tag, entry.field_type, &raw, self.byte_order)
    }

    /// Decodes the value array of `tag`, if present
    pub fn tag(&mut self, ifd: &IFD, tag: u16) -> TiffResult<Option<TagValue>> {
        match ifd.get_entry(tag) {
            Some(entry) => {
                let entry = entry.clone();
                self.read_values(&entry).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Decodes the value array of `tag`, failing when it is missing
    pub fn require_tag(&mut self, ifd: &IFD, tag: u16) -> TiffResult<TagValue> {
        self.tag(ifd, tag)?.ok_or(TiffError::TagNotFound(tag))
    }

    /// Reads `len` bytes starting at `offset`
    pub fn read_chunk(&mut self, offset: u64, len: u64) -> TiffResult<Vec<u8>> {
        if offset.saturating_add(len) > self.file_size {
            return Err(TiffError::Corrupt(format!(
                "{} bytes at offset {} run past the end of the file ({} bytes)",
                len, offset, self.file_size
            )));
        }
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len as usize];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}
