//! GeoTIFF pixel decoding into a [`RasterGrid`]
//!
//! Handles strips and tiles, chunky and planar layouts, the supported
//! compression schemes and the horizontal predictor. Only the first IFD
//! (the full-resolution image) is decoded.

use log::{debug, info, warn};
use std::path::Path;

use crate::compression::Compression;
use crate::coordinate::{AffineTransform, Crs};
use crate::errors::Result;
use crate::io::{ByteOrder, SeekableReader};
use crate::raster::RasterGrid;
use crate::tiff::constants::{planar_config, predictor, sample_format, tags};
use crate::tiff::errors::TiffError;
use crate::tiff::geokeys::{read_geo_reference, GeoReference};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::samples::{undo_horizontal_predictor, SampleType};

/// Image structure of one IFD
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayout {
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: usize,
    pub sample_type: SampleType,
    pub compression: Compression,
    pub predictor: u16,
    pub planar: bool,
    /// Chunk size in pixels (tile size, or full width x rows-per-strip)
    pub chunk_width: usize,
    pub chunk_height: usize,
    pub tiled: bool,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl ImageLayout {
    fn chunks_across(&self) -> usize {
        (self.width + self.chunk_width - 1) / self.chunk_width
    }

    fn chunks_down(&self) -> usize {
        (self.height + self.chunk_height - 1) / self.chunk_height
    }

    fn chunks_per_plane(&self) -> usize {
        self.chunks_across() * self.chunks_down()
    }

    fn samples_per_chunk_pixel(&self) -> usize {
        if self.planar {
            1
        } else {
            self.samples_per_pixel
        }
    }
}

/// Reads GeoTIFF files into [`RasterGrid`] values
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterReader;

impl RasterReader {
    pub fn new() -> Self {
        RasterReader
    }

    /// Read the first image of the GeoTIFF at `path`
    pub fn read(&self, path: &Path) -> Result<RasterGrid> {
        let mut reader = TiffReader::open(path)?;
        let grid = self.read_from(&mut reader)?;
        info!(
            "Read raster {}: {}x{}, {} band(s) of {}, {}",
            path.display(),
            grid.width(),
            grid.height(),
            grid.band_count(),
            grid.sample_type(),
            grid.crs()
        );
        Ok(grid)
    }

    /// Read the first image from an already opened TIFF
    pub fn read_from<R: SeekableReader>(&self, reader: &mut TiffReader<R>) -> Result<RasterGrid> {
        let ifds = reader.read_directories()?;
        let ifd = &ifds[0];
        if ifds.len() > 1 {
            debug!("Ignoring {} additional IFD(s) (overviews or masks)", ifds.len() - 1);
        }

        let layout = read_layout(reader, ifd)?;
        let geo = read_geo_reference(reader, ifd)?;
        let bands = decode_bands(reader, &layout)?;

        let GeoReference {
            crs,
            transform,
            nodata,
        } = geo;
        let transform = match transform {
            Some(t) => t,
            None => {
                warn!("Raster has no geo-referencing tags, using the identity transform");
                AffineTransform::identity()
            }
        };
        if crs == Crs::Unknown {
            warn!("Raster CRS could not be determined from its GeoKeys");
        }

        RasterGrid::new(
            layout.width,
            layout.height,
            crs,
            transform,
            nodata,
            layout.sample_type,
            bands,
        )
    }
}

/// Collect the structural tags of `ifd`
pub fn read_layout<R: SeekableReader>(reader: &mut TiffReader<R>, ifd: &IFD) -> Result<ImageLayout> {
    let width = reader.require_tag(ifd, tags::IMAGE_WIDTH)?.first_u64(tags::IMAGE_WIDTH)? as usize;
    let height = reader.require_tag(ifd, tags::IMAGE_LENGTH)?.first_u64(tags::IMAGE_LENGTH)? as usize;

    let samples_per_pixel = optional_u64(reader, ifd, tags::SAMPLES_PER_PIXEL, 1)? as usize;

    let bits = match reader.tag(ifd, tags::BITS_PER_SAMPLE)? {
        Some(v) => v.as_u64s(tags::BITS_PER_SAMPLE)?,
        None => vec![1],
    };
    let formats = match reader.tag(ifd, tags::SAMPLE_FORMAT)? {
        Some(v) => v.as_u64s(tags::SAMPLE_FORMAT)?,
        None => vec![sample_format::UNSIGNED as u64],
    };
    if bits.iter().any(|&b| b != bits[0]) || formats.iter().any(|&f| f != formats[0]) {
        return Err(TiffError::InvalidTagValue {
            tag: tags::BITS_PER_SAMPLE,
            reason: "mixed sample types across bands are not supported".to_string(),
        }
        .into());
    }
    let sample_type = SampleType::from_tiff(formats[0] as u16, bits[0] as u16)?;

    let compression = Compression::from_code(optional_u64(reader, ifd, tags::COMPRESSION, 1)? as u16)?;

    let predictor = optional_u64(reader, ifd, tags::PREDICTOR, predictor::NONE as u64)? as u16;
    match predictor {
        predictor::NONE => {}
        predictor::HORIZONTAL_DIFFERENCING if !sample_type.is_float() => {}
        other => return Err(TiffError::UnsupportedPredictor(other).into()),
    }

    let planar = optional_u64(reader, ifd, tags::PLANAR_CONFIGURATION, planar_config::CHUNKY as u64)?
        == planar_config::PLANAR as u64;

    let tiled = ifd.has_tag(tags::TILE_WIDTH);
    let (chunk_width, chunk_height, offsets_tag, counts_tag) = if tiled {
        let tw = reader.require_tag(ifd, tags::TILE_WIDTH)?.first_u64(tags::TILE_WIDTH)? as usize;
        let th = reader.require_tag(ifd, tags::TILE_LENGTH)?.first_u64(tags::TILE_LENGTH)? as usize;
        (tw, th, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
    } else {
        let rps = optional_u64(reader, ifd, tags::ROWS_PER_STRIP, height as u64)? as usize;
        (width, rps.min(height).max(1), tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
    };
    if chunk_width == 0 || chunk_height == 0 {
        return Err(TiffError::Corrupt(format!(
            "chunk size {}x{} is empty",
            chunk_width, chunk_height
        ))
        .into());
    }

    let offsets = reader.require_tag(ifd, offsets_tag)?.as_u64s(offsets_tag)?;
    let byte_counts = reader.require_tag(ifd, counts_tag)?.as_u64s(counts_tag)?;

    let layout = ImageLayout {
        width,
        height,
        samples_per_pixel,
        sample_type,
        compression,
        predictor,
        planar,
        chunk_width,
        chunk_height,
        tiled,
        offsets,
        byte_counts,
    };

    let planes = if planar { samples_per_pixel } else { 1 };
    let expected = layout.chunks_per_plane() * planes;
    if layout.offsets.len() < expected || layout.byte_counts.len() < expected {
        return Err(TiffError::Corrupt(format!(
            "expected {} chunks, found {} offsets and {} byte counts",
            expected,
            layout.offsets.len(),
            layout.byte_counts.len()
        ))
        .into());
    }

    debug!("Image layout: {:?}", layout);
    Ok(layout)
}

fn optional_u64<R: SeekableReader>(
    reader: &mut TiffReader<R>,
    ifd: &IFD,
    tag: u16,
    default: u64,
) -> Result<u64> {
    match reader.tag(ifd, tag)? {
        Some(v) => Ok(v.first_u64(tag)?),
        None => Ok(default),
    }
}

/// Decode every chunk and scatter its samples into per-band arrays
fn decode_bands<R: SeekableReader>(
    reader: &mut TiffReader<R>,
    layout: &ImageLayout,
) -> Result<Vec<Vec<f64>>> {
    let order: ByteOrder = reader.byte_order();
    let handler = layout.compression.handler();
    let sample_size = layout.sample_type.size();
    let spp_chunk = layout.samples_per_chunk_pixel();
    let planes = if layout.planar { layout.samples_per_pixel } else { 1 };

    let mut bands = vec![vec![0.0f64; layout.width * layout.height]; layout.samples_per_pixel];

    for plane in 0..planes {
        for chunk_row in 0..layout.chunks_down() {
            for chunk_col in 0..layout.chunks_across() {
                let index = plane * layout.chunks_per_plane() + chunk_row * layout.chunks_across() + chunk_col;

                let row0 = chunk_row * layout.chunk_height;
                let col0 = chunk_col * layout.chunk_width;
                // Strips at the bottom may be short; tiles are always full size
                let rows_stored = if layout.tiled {
                    layout.chunk_height
                } else {
                    layout.chunk_height.min(layout.height - row0)
                };
                let rows_used = layout.chunk_height.min(layout.height - row0);
                let cols_used = layout.chunk_width.min(layout.width - col0);

                let raw = reader.read_chunk(layout.offsets[index], layout.byte_counts[index])?;
                let mut data = handler.decompress(&raw)?;

                let row_bytes = layout.chunk_width * spp_chunk * sample_size;
                let needed = row_bytes * rows_used;
                if data.len() < needed {
                    return Err(TiffError::TruncatedChunk {
                        index,
                        expected: needed,
                        actual: data.len(),
                    }
                    .into());
                }
                data.truncate(row_bytes * rows_stored.min(data.len() / row_bytes));

                if layout.predictor == predictor::HORIZONTAL_DIFFERENCING {
                    undo_horizontal_predictor(&mut data, order, sample_size, spp_chunk, layout.chunk_width);
                }

                for r in 0..rows_used {
                    let dst_row = (row0 + r) * layout.width + col0;
                    for c in 0..cols_used {
                        let pixel = r * row_bytes + c * spp_chunk * sample_size;
                        for s in 0..spp_chunk {
                            let band = if layout.planar { plane } else { s };
                            let at = pixel + s * sample_size;
                            bands[band][dst_row + c] = layout.sample_type.decode(&data[at..], order);
                        }
                    }
                }
            }
        }
    }

    Ok(bands)
}
