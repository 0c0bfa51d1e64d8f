//! GeoTIFF writing
//!
//! Output is always little-endian classic TIFF with the whole image in a
//! single chunky strip. File layout:
//!
//! ```text
//! header (8) | strip data | external tag data | IFD
//! ```
//!
//! Tag data of four bytes or less lives inline in the IFD entry.

use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::compression::Compression;
use crate::coordinate::{AffineTransform, Crs};
use crate::errors::{GeoLabelError, Result};
use crate::raster::RasterGrid;
use crate::tiff::constants::{
    field_types, geo_keys, header, model_type, photometric, planar_config, raster_type, tags,
};
use crate::tiff::samples::SampleType;

const LITTLE_ENDIAN_MARKER: [u8; 2] = *b"II";
const HEADER_SIZE: u64 = 8;

/// One IFD entry awaiting layout
#[derive(Debug, Clone)]
struct PendingEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    payload: Vec<u8>,
}

impl PendingEntry {
    fn shorts(tag: u16, values: &[u16]) -> Self {
        PendingEntry {
            tag,
            field_type: field_types::SHORT,
            count: values.len() as u32,
            payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        PendingEntry {
            tag,
            field_type: field_types::LONG,
            count: 1,
            payload: value.to_le_bytes().to_vec(),
        }
    }

    fn doubles(tag: u16, values: &[f64]) -> Self {
        PendingEntry {
            tag,
            field_type: field_types::DOUBLE,
            count: values.len() as u32,
            payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn ascii(tag: u16, text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        PendingEntry {
            tag,
            field_type: field_types::ASCII,
            count: payload.len() as u32,
            payload,
        }
    }
}

/// Writes [`RasterGrid`] values as GeoTIFF
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterWriter {
    compression: Compression,
}

impl RasterWriter {
    pub fn new(compression: Compression) -> Self {
        RasterWriter { compression }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Write `grid` to `path`, replacing any existing file
    pub fn write(&self, grid: &RasterGrid, path: &Path) -> Result<()> {
        let bytes = self.encode(grid)?;
        let file = File::create(path).map_err(|e| GeoLabelError::io_at(path, e))?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);
        writer
            .write_all(&bytes)
            .and_then(|_| writer.flush())
            .map_err(|e| GeoLabelError::io_at(path, e))?;

        info!(
            "Wrote {}x{} {}-band GeoTIFF ({}, {}) to {}",
            grid.width(),
            grid.height(),
            grid.band_count(),
            grid.sample_type(),
            self.compression,
            path.display()
        );
        Ok(())
    }

    /// Encode `grid` as a complete GeoTIFF byte stream
    pub fn encode(&self, grid: &RasterGrid) -> Result<Vec<u8>> {
        let strip = self.encode_strip(grid)?;
        let entries = build_entries(grid, self.compression, strip.len() as u32);
        layout_file(strip, entries)
    }

    /// Interleave bands pixel by pixel and compress the result
    fn encode_strip(&self, grid: &RasterGrid) -> Result<Vec<u8>> {
        let sample_type = grid.sample_type();
        let pixels = grid.width() * grid.height();
        let mut raw = Vec::with_capacity(pixels * grid.band_count() * sample_type.size());
        for i in 0..pixels {
            for band in grid.bands() {
                sample_type.encode_le(band[i], &mut raw);
            }
        }

        let packed = self.compression.handler().compress(&raw)?;
        debug!(
            "Strip: {} raw bytes, {} after {}",
            raw.len(),
            packed.len(),
            self.compression
        );
        Ok(packed)
    }
}

/// Every IFD entry for `grid`; the strip offset is patched during layout
fn build_entries(grid: &RasterGrid, compression: Compression, strip_len: u32) -> Vec<PendingEntry> {
    let spp = grid.band_count() as u16;
    let sample_type = grid.sample_type();
    let photometric = if spp == 3 && sample_type == SampleType::U8 {
        photometric::RGB
    } else {
        photometric::BLACK_IS_ZERO
    };

    let mut entries = vec![
        PendingEntry::long(tags::IMAGE_WIDTH, grid.width() as u32),
        PendingEntry::long(tags::IMAGE_LENGTH, grid.height() as u32),
        PendingEntry::shorts(tags::BITS_PER_SAMPLE, &vec![sample_type.bits(); spp as usize]),
        PendingEntry::shorts(tags::COMPRESSION, &[compression.code()]),
        PendingEntry::shorts(tags::PHOTOMETRIC_INTERPRETATION, &[photometric]),
        PendingEntry::long(tags::STRIP_OFFSETS, HEADER_SIZE as u32),
        PendingEntry::shorts(tags::SAMPLES_PER_PIXEL, &[spp]),
        PendingEntry::long(tags::ROWS_PER_STRIP, grid.height() as u32),
        PendingEntry::long(tags::STRIP_BYTE_COUNTS, strip_len),
        PendingEntry::shorts(tags::PLANAR_CONFIGURATION, &[planar_config::CHUNKY]),
        PendingEntry::shorts(tags::SAMPLE_FORMAT, &vec![sample_type.format_code(); spp as usize]),
    ];

    entries.extend(model_entries(grid.transform()));
    entries.push(PendingEntry::shorts(tags::GEO_KEY_DIRECTORY_TAG, &geo_key_directory(grid.crs())));

    if let Some(nodata) = grid.nodata() {
        entries.push(PendingEntry::ascii(tags::GDAL_NODATA, &format_nodata(nodata)));
    }

    entries.sort_by_key(|e| e.tag);
    entries
}

/// Scale + tiepoint for north-up grids, the full matrix otherwise
fn model_entries(transform: &AffineTransform) -> Vec<PendingEntry> {
    let [a, b, c, d, e, f] = transform.coefficients();
    if transform.is_rectilinear() && a > 0.0 && e < 0.0 {
        vec![
            PendingEntry::doubles(tags::MODEL_PIXEL_SCALE_TAG, &[a, -e, 0.0]),
            PendingEntry::doubles(tags::MODEL_TIEPOINT_TAG, &[0.0, 0.0, 0.0, c, f, 0.0]),
        ]
    } else {
        let matrix = [
            a, b, 0.0, c, //
            d, e, 0.0, f, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        vec![PendingEntry::doubles(tags::MODEL_TRANSFORMATION_TAG, &matrix)]
    }
}

/// GeoKey directory: model type, PixelIsArea and the EPSG code
fn geo_key_directory(crs: Crs) -> Vec<u16> {
    let mut keys: Vec<[u16; 4]> = Vec::new();
    match crs.epsg_code() {
        Some(code) if crs.is_geographic() => {
            keys.push([geo_keys::GT_MODEL_TYPE, 0, 1, model_type::GEOGRAPHIC]);
            keys.push([geo_keys::GT_RASTER_TYPE, 0, 1, raster_type::PIXEL_IS_AREA]);
            keys.push([geo_keys::GEOGRAPHIC_TYPE, 0, 1, code as u16]);
        }
        Some(code) => {
            keys.push([geo_keys::GT_MODEL_TYPE, 0, 1, model_type::PROJECTED]);
            keys.push([geo_keys::GT_RASTER_TYPE, 0, 1, raster_type::PIXEL_IS_AREA]);
            keys.push([geo_keys::PROJECTED_CS_TYPE, 0, 1, code as u16]);
        }
        None => {
            keys.push([geo_keys::GT_RASTER_TYPE, 0, 1, raster_type::PIXEL_IS_AREA]);
        }
    }

    let mut directory = vec![1, 1, 0, keys.len() as u16];
    directory.extend(keys.iter().flatten());
    directory
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", value)
    }
}

/// Place strip, external tag data and IFD, and serialize the file
fn layout_file(strip: Vec<u8>, mut entries: Vec<PendingEntry>) -> Result<Vec<u8>> {
    let mut external: Vec<u8> = Vec::new();
    let mut external_start = HEADER_SIZE + strip.len() as u64;
    // Word alignment for everything after the strip
    let strip_pad = (external_start % 2) as usize;
    external_start += strip_pad as u64;

    let mut value_fields: Vec<[u8; 4]> = Vec::with_capacity(entries.len());
    for entry in entries.iter_mut() {
        let mut field = [0u8; 4];
        if entry.payload.len() <= 4 {
            field[..entry.payload.len()].copy_from_slice(&entry.payload);
        } else {
            let offset = external_start + external.len() as u64;
            field = to_u32(offset)?.to_le_bytes();
            external.extend_from_slice(&entry.payload);
            if external.len() % 2 == 1 {
                external.push(0);
            }
        }
        value_fields.push(field);
    }

    let ifd_offset = external_start + external.len() as u64;
    let total = ifd_offset + 2 + 12 * entries.len() as u64 + 4;
    to_u32(total)?;

    let mut out = Vec::with_capacity(total as usize);
    out.extend_from_slice(&LITTLE_ENDIAN_MARKER);
    out.extend_from_slice(&header::TIFF_VERSION.to_le_bytes());
    out.extend_from_slice(&(ifd_offset as u32).to_le_bytes());
    out.extend_from_slice(&strip);
    out.resize(out.len() + strip_pad, 0);
    out.extend_from_slice(&external);

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (entry, field) in entries.iter().zip(&value_fields) {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.field_type.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        out.extend_from_slice(field);
    }
    out.extend_from_slice(&0u32.to_le_bytes());

    debug!(
        "Laid out TIFF: {} entries, IFD at {}, {} bytes total",
        entries.len(),
        ifd_offset,
        out.len()
    );
    Ok(out)
}

fn to_u32(offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| {
        GeoLabelError::PreconditionViolation(format!(
            "output of {} bytes exceeds the classic TIFF 4 GiB limit",
            offset
        ))
    })
}
