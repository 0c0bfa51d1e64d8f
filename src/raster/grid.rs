//! In-memory raster dataset

use crate::coordinate::{AffineTransform, BoundingBox, Crs, Geo, Pixel, Polygon};
use crate::errors::{GeoLabelError, Result};
use crate::tiff::SampleType;

/// Rectangular pixel window `[col_off, col_off + width) x [row_off, row_off + height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn end_col(&self) -> usize {
        self.col_off + self.width
    }

    pub fn end_row(&self) -> usize {
        self.row_off + self.height
    }

    pub fn to_bbox(&self) -> BoundingBox<Pixel> {
        BoundingBox::new(
            self.col_off as f64,
            self.row_off as f64,
            self.end_col() as f64,
            self.end_row() as f64,
        )
    }
}

/// A geo-referenced multi-band raster
///
/// Bands are stored row-major, one `Vec<f64>` per band, every band holding
/// exactly `width * height` samples. Instances are immutable; operations
/// such as cropping return a new grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    crs: Crs,
    transform: AffineTransform,
    nodata: Option<f64>,
    sample_type: SampleType,
    bands: Vec<Vec<f64>>,
}

impl RasterGrid {
    pub fn new(
        width: usize,
        height: usize,
        crs: Crs,
        transform: AffineTransform,
        nodata: Option<f64>,
        sample_type: SampleType,
        bands: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "raster dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if bands.is_empty() {
            return Err(GeoLabelError::PreconditionViolation(
                "raster must have at least one band".to_string(),
            ));
        }
        let expected = width * height;
        if let Some((i, band)) = bands.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "band {} holds {} samples, expected {} ({}x{})",
                i + 1,
                band.len(),
                expected,
                width,
                height
            )));
        }

        Ok(RasterGrid {
            width,
            height,
            crs,
            transform,
            nodata,
            sample_type,
            bands,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn bands(&self) -> &[Vec<f64>] {
        &self.bands
    }

    /// Band by zero-based index
    pub fn band(&self, index: usize) -> Option<&[f64]> {
        self.bands.get(index).map(|b| b.as_slice())
    }

    /// Sample at (band, col, row)
    pub fn value(&self, band: usize, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.bands.get(band).map(|b| b[row * self.width + col])
    }

    /// Whole grid as a pixel window
    pub fn full_window(&self) -> PixelWindow {
        PixelWindow {
            col_off: 0,
            row_off: 0,
            width: self.width,
            height: self.height,
        }
    }

    /// Geographic footprint of the grid as a (possibly rotated) polygon
    pub fn extent_polygon(&self) -> Polygon<Geo> {
        let corners = self.full_window().to_bbox().corners();
        let mut ring: Vec<_> = corners.iter().map(|c| self.transform.forward_point(c)).collect();
        ring.push(ring[0]);
        // Four distinct finite corners always form a valid ring
        Polygon::new(ring, Vec::new()).unwrap_or_else(|_| {
            Polygon::rectangle(&self.transform.pixel_box_to_geo(&self.full_window().to_bbox()))
        })
    }

    /// Axis-aligned geographic bounds of the grid
    pub fn extent(&self) -> BoundingBox<Geo> {
        self.transform.pixel_box_to_geo(&self.full_window().to_bbox())
    }

    /// Copy of the samples inside `window` with a translated transform
    ///
    /// `window` must lie within the grid.
    pub fn crop(&self, window: &PixelWindow) -> Result<RasterGrid> {
        if window.width == 0
            || window.height == 0
            || window.end_col() > self.width
            || window.end_row() > self.height
        {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "window {:?} is not inside the {}x{} raster",
                window, self.width, self.height
            )));
        }

        let bands = self
            .bands
            .iter()
            .map(|band| {
                let mut out = Vec::with_capacity(window.width * window.height);
                for row in window.row_off..window.end_row() {
                    let start = row * self.width + window.col_off;
                    out.extend_from_slice(&band[start..start + window.width]);
                }
                out
            })
            .collect();

        Ok(RasterGrid {
            width: window.width,
            height: window.height,
            crs: self.crs,
            transform: self
                .transform
                .translated(window.col_off as f64, window.row_off as f64),
            nodata: self.nodata,
            sample_type: self.sample_type,
            bands,
        })
    }

    /// Same grid with band samples replaced
    pub fn with_bands(&self, bands: Vec<Vec<f64>>) -> Result<RasterGrid> {
        RasterGrid::new(
            self.width,
            self.height,
            self.crs,
            self.transform,
            self.nodata,
            self.sample_type,
            bands,
        )
    }

    /// Same grid with a different nodata sentinel
    pub fn with_nodata(mut self, nodata: Option<f64>) -> RasterGrid {
        self.nodata = nodata;
        self
    }
}
