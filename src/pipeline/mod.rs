//! Per-unit conversion operations
//!
//! [`ConversionPipeline`] glues the raster/vector readers and writers to
//! the normalizer, clipper, codec and tiler. Each public operation handles
//! one unit of work (one raster, one raster/vector pair, one image) and is
//! a pure function of its input files, so the batch runner can call them
//! concurrently.

pub mod batch;
pub mod report;

pub use batch::{collect_inputs, pair_by_stem, BatchRunner, StemPairs};
pub use report::{BatchReport, UnitOutcome, UnitStatus};

use std::fs;
use std::path::Path;

use image::RgbImage;
use log::{debug, info, warn};

use crate::annotation::{read_label_file, write_label_file, AnnotationCodec, BoxPainter, NormalizedAnnotation};
use crate::compression::Compression;
use crate::config::Config;
use crate::coordinate::{CoordinateTransformer, Crs, Geo, Geometry};
use crate::errors::{GeoLabelError, Result};
use crate::raster::{RadiometricNormalizer, RasterClipper, RasterGrid, TileCutter};
use crate::tiff::{RasterReader, RasterWriter};
use crate::vector::{group_bounding_boxes, read_feature_collection, write_feature_collection, Feature, FeatureCollection};

/// How class ids are assigned to exported features
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassPolicy {
    /// Attribute holding the class id
    pub field: Option<String>,
    /// Used when `field` is unset or missing on a feature
    pub default_class: u32,
}

impl ClassPolicy {
    pub fn class_of(&self, feature: &Feature) -> i64 {
        match &self.field {
            Some(field) => match feature.class_id(field) {
                Some(id) => id,
                None => {
                    warn!(
                        "Feature has no integer '{}' attribute, using class {}",
                        field, self.default_class
                    );
                    self.default_class as i64
                }
            },
            None => self.default_class as i64,
        }
    }
}

/// Conversion operations sharing one set of settings
#[derive(Debug, Clone)]
pub struct ConversionPipeline {
    nodata_threshold: f64,
    classes: ClassPolicy,
    clamp: bool,
    cutter: TileCutter,
    painter: BoxPainter,
    reader: RasterReader,
    writer: RasterWriter,
    clipper: RasterClipper,
    transformer: CoordinateTransformer,
}

impl Default for ConversionPipeline {
    fn default() -> Self {
        ConversionPipeline {
            nodata_threshold: f64::NEG_INFINITY,
            classes: ClassPolicy::default(),
            clamp: false,
            cutter: TileCutter::default(),
            painter: BoxPainter::default(),
            reader: RasterReader::new(),
            writer: RasterWriter::new(Compression::None),
            clipper: RasterClipper::new(),
            transformer: CoordinateTransformer::new(),
        }
    }
}

impl ConversionPipeline {
    /// Build a pipeline from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(ConversionPipeline {
            nodata_threshold: config.normalize.nodata_threshold,
            classes: ClassPolicy {
                field: config.annotate.class_field.clone(),
                default_class: config.annotate.default_class,
            },
            clamp: config.annotate.clamp,
            cutter: TileCutter::new(config.tiles.size)?,
            painter: BoxPainter::new(config.draw.color, config.draw.thickness),
            ..ConversionPipeline::default()
        })
    }

    pub fn with_nodata_threshold(mut self, threshold: f64) -> Self {
        self.nodata_threshold = threshold;
        self
    }

    pub fn with_class_field(mut self, field: Option<String>) -> Self {
        self.classes.field = field;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_tile_size(mut self, size: u32) -> Result<Self> {
        self.cutter = TileCutter::new(size)?;
        Ok(self)
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.writer = RasterWriter::new(compression);
        self
    }

    pub fn nodata_threshold(&self) -> f64 {
        self.nodata_threshold
    }

    pub fn class_policy(&self) -> &ClassPolicy {
        &self.classes
    }

    pub fn tile_size(&self) -> u32 {
        self.cutter.size()
    }

    /// Read a GeoTIFF
    pub fn read_raster(&self, path: &Path) -> Result<RasterGrid> {
        self.reader.read(path)
    }

    /// Normalizer for `raster`: the configured threshold plus its own nodata value
    pub fn normalizer_for(&self, raster: &RasterGrid) -> RadiometricNormalizer {
        RadiometricNormalizer::for_raster(raster, self.nodata_threshold)
    }

    /// Express `collection` in the raster's CRS
    ///
    /// A raster without CRS information is assumed to share the vector's
    /// coordinate space.
    pub fn align_to_raster(&self, collection: FeatureCollection, raster: &RasterGrid) -> Result<FeatureCollection> {
        match raster.crs() {
            Crs::Unknown => {
                if collection.crs != Crs::Unknown {
                    warn!(
                        "Raster has no CRS; treating {} coordinates as raster coordinates",
                        collection.crs
                    );
                }
                Ok(FeatureCollection::new(Crs::Unknown, collection.features))
            }
            target => collection.reproject(&target, &self.transformer),
        }
    }

    /// Annotations for every feature intersecting the raster extent
    ///
    /// `features` must already be in the raster's CRS.
    pub fn annotations_for(&self, raster: &RasterGrid, features: &FeatureCollection) -> Result<Vec<NormalizedAnnotation>> {
        if features.crs != raster.crs() {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "features are in {}, raster is in {}",
                features.crs,
                raster.crs()
            )));
        }

        let extent = raster.extent_polygon();
        let inside: Vec<Feature> = features
            .features
            .iter()
            .filter(|f| f.geometry.intersects_polygon(&extent))
            .cloned()
            .collect();
        debug!("{} of {} feature(s) intersect the raster", inside.len(), features.len());

        let codec = codec_for(raster)?;
        let annotations = codec.to_annotations(&inside, |f| self.classes.class_of(f))?;
        Ok(if self.clamp {
            annotations.iter().map(|a| a.clamped()).collect()
        } else {
            annotations
        })
    }

    /// Raster to 8-bit RGB PNG
    pub fn normalize(&self, raster_path: &Path, output: &Path) -> Result<()> {
        let raster = self.read_raster(raster_path)?;
        let image = self.normalizer_for(&raster).normalize(&raster)?;
        save_png(&image, output)?;
        info!("Normalized {} -> {}", raster_path.display(), output.display());
        Ok(())
    }

    /// Raster + vector to a training image and its label file
    ///
    /// Returns the number of annotations written.
    pub fn export_training(&self, raster_path: &Path, vector_path: &Path, image_out: &Path, label_out: &Path) -> Result<usize> {
        let raster = self.read_raster(raster_path)?;
        let features = self.align_to_raster(read_feature_collection(vector_path)?, &raster)?;

        let annotations = self.annotations_for(&raster, &features)?;
        let image = self.normalizer_for(&raster).normalize(&raster)?;

        save_png(&image, image_out)?;
        write_label_file(label_out, &annotations)?;
        info!(
            "Exported {} annotation(s) for {} -> {}",
            annotations.len(),
            raster_path.display(),
            label_out.display()
        );
        Ok(annotations.len())
    }

    /// Label file to geographic boxes in the raster's CRS
    pub fn detections_to_vector(&self, raster_path: &Path, labels: &Path, output: &Path) -> Result<usize> {
        let raster = self.read_raster(raster_path)?;
        let records = read_label_file(labels)?;
        let codec = codec_for(&raster)?;

        let collection = FeatureCollection::new(raster.crs(), codec.to_geo_boxes(&records));
        write_feature_collection(&collection, output)?;
        info!("Wrote {} detection box(es) to {}", collection.len(), output.display());
        Ok(collection.len())
    }

    /// Clip a raster by every polygon of a collection
    ///
    /// Each polygon is one unit: polygon `i` produces `square_{i}.tif` and
    /// `square_{i}.geojson` in `out_dir`. The GeoJSON holds the companion
    /// features intersecting the polygon, or the polygon itself when no
    /// companion set is given.
    pub fn clip_by_polygons(
        &self,
        raster_path: &Path,
        polygons_path: &Path,
        companion_path: Option<&Path>,
        out_dir: &Path,
    ) -> Result<BatchReport> {
        let raster = self.read_raster(raster_path)?;
        let polygons = self.align_to_raster(read_feature_collection(polygons_path)?, &raster)?;
        let companion = companion_path
            .map(|p| read_feature_collection(p).and_then(|fc| self.align_to_raster(fc, &raster)))
            .transpose()?;
        fs::create_dir_all(out_dir).map_err(|e| GeoLabelError::io_at(out_dir, e))?;

        let mut report = BatchReport::new("clip");
        for (i, feature) in polygons.features.iter().enumerate() {
            let result = self.clip_one(&raster, &feature.geometry, &polygons.crs, companion.as_ref(), i, out_dir);
            if let Err(e) = &result {
                warn!("Polygon {} of {}: {}", i, polygons_path.display(), e);
            }
            report.record(format!("{}#{}", raster_path.display(), i), &result);
        }
        Ok(report)
    }

    fn clip_one(
        &self,
        raster: &RasterGrid,
        polygon: &Geometry<Geo>,
        crs: &Crs,
        companion: Option<&FeatureCollection>,
        index: usize,
        out_dir: &Path,
    ) -> Result<()> {
        let (clipped, features) = match companion {
            Some(fc) => {
                let result = self.clipper.clip_with_features(raster, polygon, crs, fc)?;
                (result.raster, result.features)
            }
            None => {
                let clipped = self.clipper.clip(raster, polygon, crs)?;
                (clipped, FeatureCollection::new(*crs, vec![Feature::new(polygon.to_2d())]))
            }
        };

        let stem = format!("square_{}", index);
        self.writer.write(&clipped, &out_dir.join(format!("{}.tif", stem)))?;
        write_feature_collection(&features, &out_dir.join(format!("{}.geojson", stem)))?;
        debug!(
            "{}: {}x{} raster, {} feature(s)",
            stem,
            clipped.width(),
            clipped.height(),
            features.len()
        );
        Ok(())
    }

    /// Cut an image or GeoTIFF into square tiles
    ///
    /// GeoTIFF inputs produce geo-referenced `.tif` tiles; anything else is
    /// decoded as an image and cut into `.png` tiles.
    pub fn tile(&self, input: &Path, out_dir: &Path) -> Result<usize> {
        fs::create_dir_all(out_dir).map_err(|e| GeoLabelError::io_at(out_dir, e))?;
        let stem = file_stem_of(input)?;

        let count = if is_tiff(input) {
            let raster = self.read_raster(input)?;
            let tiles = self.cutter.cut_raster(&raster)?;
            for tile in &tiles {
                self.writer.write(&tile.data, &out_dir.join(tile.file_name(&stem, "tif")))?;
            }
            tiles.len()
        } else {
            let image = image::open(input)?.to_rgb8();
            let tiles = self.cutter.cut_image(&image);
            for tile in &tiles {
                save_png(&tile.data, &out_dir.join(tile.file_name(&stem, "png")))?;
            }
            tiles.len()
        };

        if count == 0 {
            warn!(
                "{} is smaller than one {}px tile, nothing written",
                input.display(),
                self.cutter.size()
            );
        }
        info!("Cut {} into {} tile(s)", input.display(), count);
        Ok(count)
    }

    /// Draw the boxes of a label file onto its image
    pub fn draw(&self, image_path: &Path, labels: &Path, output: &Path) -> Result<usize> {
        let mut image = image::open(image_path)?.to_rgb8();
        let records = read_label_file(labels)?;
        self.painter.paint(&mut image, &records);
        save_png(&image, output)?;
        Ok(records.len())
    }

    /// One bounding rectangle per value of `field`
    pub fn group(&self, input: &Path, field: &str, output: &Path) -> Result<usize> {
        let collection = read_feature_collection(input)?;
        let grouped = group_bounding_boxes(&collection, field);
        write_feature_collection(&grouped, output)?;
        Ok(grouped.len())
    }
}

/// Codec bound to `raster`'s transform and dimensions
pub fn codec_for(raster: &RasterGrid) -> Result<AnnotationCodec> {
    let width = u32::try_from(raster.width())
        .map_err(|_| GeoLabelError::PreconditionViolation(format!("raster width {} too large", raster.width())))?;
    let height = u32::try_from(raster.height())
        .map_err(|_| GeoLabelError::PreconditionViolation(format!("raster height {} too large", raster.height())))?;
    AnnotationCodec::new(*raster.transform(), width, height)
}

pub(crate) fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "tif" | "tiff"))
        .unwrap_or(false)
}

pub(crate) fn file_stem_of(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| GeoLabelError::InvalidArgument(format!("{} has no file name", path.display())))
}

fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    debug!("Saved {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{AffineTransform, BoundingBox, Polygon};
    use crate::tiff::SampleType;
    use serde_json::json;

    fn raster(crs: Crs) -> RasterGrid {
        let band: Vec<f64> = (0..100).map(|v| v as f64).collect();
        RasterGrid::new(
            10,
            10,
            crs,
            AffineTransform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0).unwrap(),
            None,
            SampleType::U8,
            vec![band.clone(), band.clone(), band],
        )
        .unwrap()
    }

    fn boxed(min: f64, max: f64) -> Feature {
        Feature::new(Polygon::rectangle(&BoundingBox::new(min, min, max, max)).into())
    }

    #[test]
    fn class_policy_falls_back_to_default() {
        let policy = ClassPolicy {
            field: Some("class".into()),
            default_class: 7,
        };
        assert_eq!(policy.class_of(&boxed(0.0, 1.0).with_property("class", 2)), 2);
        assert_eq!(policy.class_of(&boxed(0.0, 1.0).with_property("class", json!("x"))), 7);
        assert_eq!(ClassPolicy::default().class_of(&boxed(0.0, 1.0)), 0);
    }

    #[test]
    fn annotations_skip_features_outside_raster() {
        let pipeline = ConversionPipeline::default();
        let r = raster(Crs::Epsg(32633));
        let fc = FeatureCollection::new(Crs::Epsg(32633), vec![boxed(2.0, 4.0), boxed(20.0, 30.0)]);
        let annotations = pipeline.annotations_for(&r, &fc).unwrap();
        assert_eq!(annotations.len(), 1);
        assert!((annotations[0].x_center - 0.3).abs() < 1e-9);
    }

    #[test]
    fn annotations_clamp_only_on_request() {
        let r = raster(Crs::Epsg(32633));
        let fc = FeatureCollection::new(Crs::Epsg(32633), vec![boxed(8.0, 12.0)]);

        let raw = ConversionPipeline::default().annotations_for(&r, &fc).unwrap();
        assert!(raw[0].is_out_of_bounds());

        let clamped = ConversionPipeline::default().with_clamp(true).annotations_for(&r, &fc).unwrap();
        assert!((clamped[0].width - 0.2).abs() < 1e-9);
    }

    #[test]
    fn annotations_require_matching_crs() {
        let r = raster(Crs::Epsg(32633));
        let fc = FeatureCollection::new(Crs::WGS84, vec![boxed(2.0, 4.0)]);
        assert!(matches!(
            ConversionPipeline::default().annotations_for(&r, &fc),
            Err(GeoLabelError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn unknown_raster_crs_adopts_vector_coordinates() {
        let pipeline = ConversionPipeline::default();
        let r = raster(Crs::Unknown);
        let fc = FeatureCollection::new(Crs::WGS84, vec![boxed(2.0, 4.0)]);
        let aligned = pipeline.align_to_raster(fc, &r).unwrap();
        assert_eq!(aligned.crs, Crs::Unknown);
        assert_eq!(pipeline.annotations_for(&r, &aligned).unwrap().len(), 1);
    }

    #[test]
    fn config_feeds_settings() {
        let mut config = Config::default();
        config.tiles.size = 64;
        config.annotate.class_field = Some("kind".into());
        let pipeline = ConversionPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.tile_size(), 64);
        assert_eq!(pipeline.class_policy().field.as_deref(), Some("kind"));
        assert_eq!(pipeline.nodata_threshold(), crate::config::FLOAT32_NODATA);
    }

    #[test]
    fn raster_nodata_masks_alongside_configured_threshold() {
        let mut band: Vec<f64> = (0..100).map(|v| v as f64).collect();
        band[3] = 255.0;
        let r = RasterGrid::new(
            10,
            10,
            Crs::Epsg(32633),
            AffineTransform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0).unwrap(),
            Some(255.0),
            SampleType::U8,
            vec![band.clone(), band.clone(), band],
        )
        .unwrap();

        let pipeline = ConversionPipeline::default().with_nodata_threshold(-1.0);
        let normalizer = pipeline.normalizer_for(&r);
        assert_eq!(normalizer.nodata_threshold(), -1.0);
        let image = normalizer.normalize(&r).unwrap();
        assert_eq!(image.get_pixel(3, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(9, 9).0, [255, 255, 255]);
    }

    #[test]
    fn tiff_extension_detection() {
        assert!(is_tiff(Path::new("a/b.TIF")));
        assert!(is_tiff(Path::new("scene.tiff")));
        assert!(!is_tiff(Path::new("scene.png")));
        assert_eq!(file_stem_of(Path::new("dir/scene.tif")).unwrap(), "scene");
    }
}
