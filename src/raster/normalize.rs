//! Percentile stretch of raw raster bands into an 8-bit RGB image

use image::{ImageBuffer, Rgb, RgbImage};
use log::{debug, warn};

use crate::errors::{GeoLabelError, Result};
use crate::raster::RasterGrid;

/// Lower and upper percentiles of the contrast stretch
pub const LOW_PERCENTILE: f64 = 2.0;
pub const HIGH_PERCENTILE: f64 = 98.0;

/// Output value for valid samples of a constant band
pub const DEGENERATE_GRAY: u8 = 128;

/// Converts raster bands to 8-bit samples with a 2-98 percentile stretch
///
/// A sample is valid when it is strictly greater than `nodata_threshold`
/// and differs from the raster's nodata sentinel, if any; invalid samples
/// come out black. The default threshold of negative infinity masks
/// nothing but NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiometricNormalizer {
    nodata_threshold: f64,
    sentinel: Option<f64>,
}

impl Default for RadiometricNormalizer {
    fn default() -> Self {
        RadiometricNormalizer::new(f64::NEG_INFINITY)
    }
}

impl RadiometricNormalizer {
    pub fn new(nodata_threshold: f64) -> Self {
        RadiometricNormalizer {
            nodata_threshold,
            sentinel: None,
        }
    }

    /// Also mask samples equal to `sentinel`
    pub fn with_sentinel(mut self, sentinel: Option<f64>) -> Self {
        // NaN never passes the threshold test
        self.sentinel = sentinel.filter(|s| !s.is_nan());
        self
    }

    /// Normalizer masking at `threshold` and at the raster's own nodata value
    pub fn for_raster(raster: &RasterGrid, threshold: f64) -> Self {
        RadiometricNormalizer::new(threshold).with_sentinel(raster.nodata())
    }

    pub fn nodata_threshold(&self) -> f64 {
        self.nodata_threshold
    }

    pub fn sentinel(&self) -> Option<f64> {
        self.sentinel
    }

    fn is_valid(&self, sample: f64) -> bool {
        sample > self.nodata_threshold && self.sentinel != Some(sample)
    }

    /// Normalize the first three bands into an RGB image
    pub fn normalize(&self, raster: &RasterGrid) -> Result<RgbImage> {
        if raster.band_count() < 3 {
            return Err(GeoLabelError::InsufficientData(format!(
                "an RGB image needs 3 bands, the raster has {}",
                raster.band_count()
            )));
        }

        let mut channels = Vec::with_capacity(3);
        for (index, band) in raster.bands().iter().take(3).enumerate() {
            match self.normalize_band(band) {
                Some(channel) => channels.push(channel),
                None => warn!("Band {} has no valid samples, dropping it", index + 1),
            }
        }
        if channels.len() < 3 {
            return Err(GeoLabelError::InsufficientData(format!(
                "only {} of the first 3 bands hold valid samples",
                channels.len()
            )));
        }

        let pixels = raster.width() * raster.height();
        let mut interleaved = Vec::with_capacity(pixels * 3);
        for i in 0..pixels {
            interleaved.extend(channels.iter().map(|c| c[i]));
        }

        ImageBuffer::<Rgb<u8>, _>::from_raw(raster.width() as u32, raster.height() as u32, interleaved)
            .ok_or_else(|| {
                GeoLabelError::PreconditionViolation(format!(
                    "{}x{} raster does not fit an image buffer",
                    raster.width(),
                    raster.height()
                ))
            })
    }

    /// Stretch one band; `None` when it has no valid samples
    pub fn normalize_band(&self, band: &[f64]) -> Option<Vec<u8>> {
        let mut valid: Vec<f64> = band.iter().copied().filter(|&v| self.is_valid(v)).collect();
        if valid.is_empty() {
            return None;
        }
        valid.sort_by(|a, b| a.total_cmp(b));

        let low = percentile(&valid, LOW_PERCENTILE);
        let high = percentile(&valid, HIGH_PERCENTILE);
        let range = high - low;
        debug!(
            "Band stretch: {} valid of {}, p2={}, p98={}",
            valid.len(),
            band.len(),
            low,
            high
        );

        let out = band
            .iter()
            .map(|&v| {
                if !self.is_valid(v) {
                    0
                } else if range <= 0.0 || !range.is_finite() {
                    DEGENERATE_GRAY
                } else {
                    let scaled = (v.clamp(low, high) - low) / range * 255.0;
                    scaled as u8
                }
            })
            .collect();
        Some(out)
    }
}

/// Percentile of an ascending slice by linear interpolation between ranks
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}
