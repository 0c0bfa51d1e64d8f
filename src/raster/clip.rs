//! Polygon clipping of rasters
//!
//! The clip window is the pixel-space bounding box of the polygon's
//! vertices, intersected with the raster. Cells of the window whose center
//! falls outside the polygon are filled with the raster's nodata value (or
//! 0 when it has none).

use log::debug;

use crate::coordinate::{BoundingBox, Crs, Geo, Geometry, Pixel, Point};
use crate::errors::{GeoLabelError, Result};
use crate::raster::grid::{PixelWindow, RasterGrid};
use crate::vector::FeatureCollection;

/// Tolerance for snapping window edges onto whole pixels
const SNAP_EPSILON: f64 = 1e-9;

/// Raster clipped to a polygon plus the companion features it intersects
#[derive(Debug, Clone)]
pub struct ClipResult {
    pub raster: RasterGrid,
    pub features: FeatureCollection,
}

/// Crops and masks rasters to polygons
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterClipper;

impl RasterClipper {
    pub fn new() -> Self {
        RasterClipper
    }

    /// Clip `raster` to `polygon`, which must already be in the raster's CRS
    pub fn clip(&self, raster: &RasterGrid, polygon: &Geometry<Geo>, polygon_crs: &Crs) -> Result<RasterGrid> {
        require_same_crs(raster.crs(), *polygon_crs, "clip polygon")?;

        let polygon = polygon.to_2d();
        if !polygon.intersects_polygon(&raster.extent_polygon()) {
            return Err(GeoLabelError::EmptyIntersection);
        }

        let window = self.window(raster, &polygon)?;
        debug!("Clip window {:?} of {}x{} raster", window, raster.width(), raster.height());

        let cropped = raster.crop(&window)?;
        let fill = raster.nodata().unwrap_or(0.0);
        let transform = raster.transform();

        let outside: Vec<usize> = (0..window.height)
            .flat_map(|r| (0..window.width).map(move |c| (r, c)))
            .filter(|&(r, c)| {
                let col = (window.col_off + c) as f64 + 0.5;
                let row = (window.row_off + r) as f64 + 0.5;
                let (x, y) = transform.forward(col, row);
                !polygon.contains(x, y)
            })
            .map(|(r, c)| r * window.width + c)
            .collect();

        if outside.is_empty() {
            return Ok(cropped);
        }
        debug!("Masking {} of {} cells outside the polygon", outside.len(), window.width * window.height);

        let bands = cropped
            .bands()
            .iter()
            .map(|band| {
                let mut band = band.clone();
                for &i in &outside {
                    band[i] = fill;
                }
                band
            })
            .collect();
        cropped.with_bands(bands)
    }

    /// Clip and keep the companion features intersecting the polygon
    pub fn clip_with_features(
        &self,
        raster: &RasterGrid,
        polygon: &Geometry<Geo>,
        polygon_crs: &Crs,
        features: &FeatureCollection,
    ) -> Result<ClipResult> {
        let clipped = self.clip(raster, polygon, polygon_crs)?;
        let features = self.intersecting_features(polygon, polygon_crs, features)?;
        Ok(ClipResult {
            raster: clipped,
            features,
        })
    }

    /// Features of `features` that intersect `polygon`; CRSs must match
    pub fn intersecting_features(
        &self,
        polygon: &Geometry<Geo>,
        polygon_crs: &Crs,
        features: &FeatureCollection,
    ) -> Result<FeatureCollection> {
        require_same_crs(*polygon_crs, features.crs, "companion features")?;
        let polygon = polygon.to_2d();
        let kept = features
            .features
            .iter()
            .filter(|f| f.geometry.intersects(&polygon))
            .cloned()
            .collect();
        Ok(FeatureCollection::new(features.crs, kept))
    }

    /// Pixel window covering `polygon`, clamped to the raster
    pub fn window(&self, raster: &RasterGrid, polygon: &Geometry<Geo>) -> Result<PixelWindow> {
        let transform = raster.transform();
        let pixels: Vec<Point<Pixel>> = polygon
            .polygons()
            .iter()
            .flat_map(|p| p.exterior().iter())
            .map(|p| transform.inverse_point(p))
            .collect();
        let bounds: BoundingBox<Pixel> =
            BoundingBox::from_points(pixels.iter()).ok_or(GeoLabelError::EmptyIntersection)?;

        let col_start = (bounds.min_x + SNAP_EPSILON).floor().max(0.0);
        let row_start = (bounds.min_y + SNAP_EPSILON).floor().max(0.0);
        let col_end = (bounds.max_x - SNAP_EPSILON).ceil().min(raster.width() as f64);
        let row_end = (bounds.max_y - SNAP_EPSILON).ceil().min(raster.height() as f64);

        if col_end <= col_start || row_end <= row_start {
            return Err(GeoLabelError::EmptyIntersection);
        }

        Ok(PixelWindow {
            col_off: col_start as usize,
            row_off: row_start as usize,
            width: (col_end - col_start) as usize,
            height: (row_end - row_start) as usize,
        })
    }
}

fn require_same_crs(expected: Crs, actual: Crs, what: &str) -> Result<()> {
    if expected != actual {
        return Err(GeoLabelError::PreconditionViolation(format!(
            "{} are in {} but {} is required; reproject first",
            what, actual, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{AffineTransform, Polygon};
    use crate::tiff::SampleType;
    use crate::vector::Feature;

    fn raster(nodata: Option<f64>) -> RasterGrid {
        // 10x10 cells of 10 m, origin (1000, 2000)
        let band: Vec<f64> = (0..100).map(f64::from).collect();
        RasterGrid::new(
            10,
            10,
            Crs::Epsg(32633),
            AffineTransform::new(10.0, 0.0, 1000.0, 0.0, -10.0, 2000.0).unwrap(),
            nodata,
            SampleType::F32,
            vec![band.clone(), band],
        )
        .unwrap()
    }

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Geometry<Geo> {
        Polygon::rectangle(&BoundingBox::new(min_x, min_y, max_x, max_y)).into()
    }

    #[test]
    fn full_extent_returns_identical_raster() {
        let source = raster(None);
        let clipped = RasterClipper::new()
            .clip(&source, &source.extent_polygon().into(), &source.crs())
            .unwrap();
        assert_eq!(clipped, source);
    }

    #[test]
    fn rectangle_crops_and_translates() {
        let source = raster(None);
        let clipped = RasterClipper::new()
            .clip(&source, &rect(1020.0, 1950.0, 1050.0, 1980.0), &source.crs())
            .unwrap();
        assert_eq!((clipped.width(), clipped.height()), (3, 3));
        assert_eq!(clipped.value(0, 0, 0), Some(22.0));
        assert_eq!(clipped.transform().forward(0.0, 0.0), (1020.0, 1980.0));
        assert_eq!(clipped.transform().pixel_size(), source.transform().pixel_size());
    }

    #[test]
    fn triangle_masks_cells_outside() {
        let source = raster(Some(-1.0));
        // right triangle over the 4x4 top-left block, hypotenuse from (1000,2000) to (1040,1960)
        let triangle: Geometry<Geo> = Polygon::new(
            vec![
                Point::new(1000.0, 2000.0),
                Point::new(1040.0, 2000.0),
                Point::new(1040.0, 1960.0),
            ],
            Vec::new(),
        )
        .unwrap()
        .into();
        let clipped = RasterClipper::new().clip(&source, &triangle, &source.crs()).unwrap();
        assert_eq!((clipped.width(), clipped.height()), (4, 4));
        // above the diagonal kept, below it filled
        assert_eq!(clipped.value(0, 3, 0), Some(3.0));
        assert_eq!(clipped.value(1, 0, 3), Some(-1.0));
    }

    #[test]
    fn polygon_outside_extent_is_empty_intersection() {
        let source = raster(None);
        let err = RasterClipper::new()
            .clip(&source, &rect(5000.0, 5000.0, 5100.0, 5100.0), &source.crs())
            .unwrap_err();
        assert!(matches!(err, GeoLabelError::EmptyIntersection));
    }

    #[test]
    fn crs_mismatch_is_precondition_violation() {
        let source = raster(None);
        let err = RasterClipper::new()
            .clip(&source, &rect(1000.0, 1900.0, 1100.0, 2000.0), &Crs::WGS84)
            .unwrap_err();
        assert!(matches!(err, GeoLabelError::PreconditionViolation(_)));
    }

    #[test]
    fn companion_features_are_filtered() {
        let source = raster(None);
        let inside = Feature::new(rect(1010.0, 1980.0, 1015.0, 1990.0));
        let outside = Feature::new(rect(3000.0, 3000.0, 3010.0, 3010.0));
        let companions = FeatureCollection::new(source.crs(), vec![inside.clone(), outside]);

        let result = RasterClipper::new()
            .clip_with_features(&source, &rect(1000.0, 1950.0, 1050.0, 2000.0), &source.crs(), &companions)
            .unwrap();
        assert_eq!(result.features.features, vec![inside]);
        assert_eq!(result.features.crs, source.crs());
    }
}
