//! Conversion between geographic boxes, pixel boxes and normalized annotations
//!
//! Boxes are mapped corner by corner (all four corners) and the result is
//! the axis-aligned hull. For north-up transforms the conversions are
//! exact inverses; with rotation or skew a geo -> normalized -> geo round
//! trip yields the hull of the rotated box instead of the original.

use log::debug;

use crate::annotation::record::NormalizedAnnotation;
use crate::coordinate::{AffineTransform, BoundingBox, Geo, Pixel, Polygon};
use crate::errors::{GeoLabelError, Result};
use crate::vector::Feature;

/// Property name carrying class ids on exported boxes
pub const CLASS_ID_PROPERTY: &str = "class_id";

/// Geographic box produced from one annotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedBox {
    pub bbox: BoundingBox<Geo>,
    pub class_id: u32,
}

/// Codec bound to one raster's transform and pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationCodec {
    transform: AffineTransform,
    width: u32,
    height: u32,
}

impl AnnotationCodec {
    pub fn new(transform: AffineTransform, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(AnnotationCodec {
            transform,
            width,
            height,
        })
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn geo_box_to_pixel(&self, bbox: &BoundingBox<Geo>) -> BoundingBox<Pixel> {
        self.transform.geo_box_to_pixel(bbox)
    }

    pub fn pixel_box_to_geo(&self, bbox: &BoundingBox<Pixel>) -> BoundingBox<Geo> {
        self.transform.pixel_box_to_geo(bbox)
    }

    pub fn pixel_box_to_normalized(&self, bbox: &BoundingBox<Pixel>, class_id: i64) -> Result<NormalizedAnnotation> {
        let (w, h) = (self.width as f64, self.height as f64);
        let center = bbox.center();
        NormalizedAnnotation::new(class_id, center.x / w, center.y / h, bbox.width() / w, bbox.height() / h)
    }

    pub fn normalized_to_pixel_box(&self, annotation: &NormalizedAnnotation) -> BoundingBox<Pixel> {
        let (w, h) = (self.width as f64, self.height as f64);
        let (left, top, right, bottom) = annotation.edges();
        BoundingBox::new(left * w, top * h, right * w, bottom * h)
    }

    pub fn geo_box_to_normalized(&self, bbox: &BoundingBox<Geo>, class_id: i64) -> Result<NormalizedAnnotation> {
        self.pixel_box_to_normalized(&self.geo_box_to_pixel(bbox), class_id)
    }

    pub fn normalized_to_geo_box(&self, annotation: &NormalizedAnnotation) -> BoundingBox<Geo> {
        self.pixel_box_to_geo(&self.normalized_to_pixel_box(annotation))
    }

    /// Batch form of [`normalized_to_geo_box`](Self::normalized_to_geo_box), order-preserving
    pub fn detection_records_to_geo_boxes(&self, records: &[NormalizedAnnotation]) -> Vec<ClassifiedBox> {
        records
            .iter()
            .map(|r| ClassifiedBox {
                bbox: self.normalized_to_geo_box(r),
                class_id: r.class_id,
            })
            .collect()
    }

    /// One annotation per feature, using each geometry's bounding box
    ///
    /// `class_of` supplies the class id of a feature.
    pub fn to_annotations<F>(&self, features: &[Feature], mut class_of: F) -> Result<Vec<NormalizedAnnotation>>
    where
        F: FnMut(&Feature) -> i64,
    {
        let annotations = features
            .iter()
            .filter_map(|f| f.geometry.bounds().map(|b| (f, b)))
            .map(|(f, bounds)| self.geo_box_to_normalized(&bounds, class_of(f)))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Converted {} feature(s) to {} annotation(s)",
            features.len(),
            annotations.len()
        );
        Ok(annotations)
    }

    /// Rectangle features with a `class_id` property, one per record
    pub fn to_geo_boxes(&self, records: &[NormalizedAnnotation]) -> Vec<Feature> {
        self.detection_records_to_geo_boxes(records)
            .into_iter()
            .map(|b| Feature::new(Polygon::rectangle(&b.bbox).into()).with_property(CLASS_ID_PROPERTY, b.class_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_codec(width: u32, height: u32) -> AnnotationCodec {
        AnnotationCodec::new(AffineTransform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0).unwrap(), width, height).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn geo_box_to_normalized_on_identity() {
        let codec = identity_codec(100, 100);
        let a = codec
            .geo_box_to_normalized(&BoundingBox::new(10.0, 10.0, 30.0, 40.0), 0)
            .unwrap();
        assert_eq!(a.class_id, 0);
        assert!(close(a.x_center, 0.20) && close(a.y_center, 0.25));
        assert!(close(a.width, 0.20) && close(a.height, 0.30));

        let back = codec.normalized_to_geo_box(&a);
        assert!(back.approx_eq(&BoundingBox::new(10.0, 10.0, 30.0, 40.0), 1e-9));
    }

    #[test]
    fn detection_record_to_pixel_and_geo() {
        let codec = identity_codec(200, 200);
        let record: NormalizedAnnotation = "0 0.5 0.5 0.1 0.1".parse().unwrap();
        let pixel = codec.normalized_to_pixel_box(&record);
        assert!(pixel.approx_eq(&BoundingBox::new(90.0, 90.0, 110.0, 110.0), 1e-9));

        let boxes = codec.detection_records_to_geo_boxes(&[record]);
        assert!(boxes[0].bbox.approx_eq(&BoundingBox::new(90.0, 90.0, 110.0, 110.0), 1e-9));
    }

    #[test]
    fn north_up_round_trip_is_exact() {
        let t = AffineTransform::new(0.5, 0.0, 300000.0, 0.0, -0.5, 5000000.0).unwrap();
        let codec = AnnotationCodec::new(t, 1000, 800).unwrap();
        let original = BoundingBox::new(300100.0, 4999700.0, 300150.0, 4999900.0);
        let a = codec.geo_box_to_normalized(&original, 3).unwrap();
        assert!(codec.normalized_to_geo_box(&a).approx_eq(&original, 1e-6));
    }

    #[test]
    fn rotated_round_trip_gives_hull() {
        // 45 degree rotation: a unit-square geo box maps to a diamond in pixel space
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let t = AffineTransform::new(s, -s, 0.0, s, s, 0.0).unwrap();
        let codec = AnnotationCodec::new(t, 10, 10).unwrap();
        let original = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

        let a = codec.geo_box_to_normalized(&original, 0).unwrap();
        let back = codec.normalized_to_geo_box(&a);
        // pixel hull has side sqrt(2); rotating it back gives a box of side 2
        assert!(close(back.width(), 2.0) && close(back.height(), 2.0));
        assert!(back.contains_point(0.0, 0.0) && back.contains_point(1.0, 1.0));
        assert!(!back.approx_eq(&original, 1e-6));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(AnnotationCodec::new(AffineTransform::identity(), 0, 10).is_err());
        let codec = identity_codec(10, 10);
        assert!(matches!(
            codec.geo_box_to_normalized(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), -1),
            Err(GeoLabelError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn geo_boxes_carry_class_ids() {
        let codec = identity_codec(10, 10);
        let records = [
            NormalizedAnnotation::new(4, 0.5, 0.5, 0.2, 0.2).unwrap(),
            NormalizedAnnotation::new(1, 0.1, 0.1, 0.2, 0.2).unwrap(),
        ];
        let features = codec.to_geo_boxes(&records);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].class_id(CLASS_ID_PROPERTY), Some(4));
        assert_eq!(features[1].class_id(CLASS_ID_PROPERTY), Some(1));

        let annotations = codec.to_annotations(&features, |f| f.class_id(CLASS_ID_PROPERTY).unwrap_or(0)).unwrap();
        assert!(close(annotations[0].x_center, 0.5) && annotations[0].class_id == 4);
    }
}
