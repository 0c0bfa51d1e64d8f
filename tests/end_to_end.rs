//! Conversion scenarios across codec, normalizer and clipper

use geolabel::annotation::{AnnotationCodec, NormalizedAnnotation};
use geolabel::coordinate::{AffineTransform, BoundingBox, Crs, Geo, Geometry, Polygon};
use geolabel::errors::GeoLabelError;
use geolabel::raster::{RadiometricNormalizer, RasterClipper, RasterGrid};
use geolabel::tiff::SampleType;

const SENTINEL: f64 = -3.40282e38;

fn identity() -> AffineTransform {
    AffineTransform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn rgb_grid(width: usize, height: usize, bands: Vec<Vec<f64>>, nodata: Option<f64>) -> RasterGrid {
    RasterGrid::new(
        width,
        height,
        Crs::Epsg(32633),
        AffineTransform::new(2.0, 0.0, 1000.0, 0.0, -2.0, 2000.0).unwrap(),
        nodata,
        SampleType::F32,
        bands,
    )
    .unwrap()
}

#[test]
fn geo_box_to_annotation_and_back_on_identity_raster() {
    let codec = AnnotationCodec::new(identity(), 100, 100).unwrap();
    let original = BoundingBox::<Geo>::new(10.0, 10.0, 30.0, 40.0);

    let a = codec.geo_box_to_normalized(&original, 0).unwrap();
    assert_eq!(a.class_id, 0);
    assert!(close(a.x_center, 0.20));
    assert!(close(a.y_center, 0.25));
    assert!(close(a.width, 0.20));
    assert!(close(a.height, 0.30));

    assert!(codec.normalized_to_geo_box(&a).approx_eq(&original, 1e-9));
}

#[test]
fn detection_record_line_to_boxes() {
    let codec = AnnotationCodec::new(identity(), 200, 200).unwrap();

    let narrow: NormalizedAnnotation = "0 0.5 0.5 0.1 0.1".parse().unwrap();
    let expected = BoundingBox::new(90.0, 90.0, 110.0, 110.0);
    let expected_geo =
        BoundingBox::<Geo>::new(expected.min_x, expected.min_y, expected.max_x, expected.max_y);
    assert!(codec.normalized_to_pixel_box(&narrow).approx_eq(&expected, 1e-9));
    assert!(codec.normalized_to_geo_box(&narrow).approx_eq(&expected_geo, 1e-9));

    // A 0.2 extent on 200 px spans 40 px around the center
    let wide: NormalizedAnnotation = "0 0.5 0.5 0.2 0.2".parse().unwrap();
    let boxes = codec.detection_records_to_geo_boxes(&[wide, narrow]);
    assert!(boxes[0].bbox.approx_eq(&BoundingBox::new(80.0, 80.0, 120.0, 120.0), 1e-9));
    assert!(boxes[1].bbox.approx_eq(&expected_geo, 1e-9));
}

#[test]
fn negative_class_id_is_rejected() {
    let codec = AnnotationCodec::new(identity(), 10, 10).unwrap();
    let err = codec
        .geo_box_to_normalized(&BoundingBox::new(1.0, 1.0, 2.0, 2.0), -1)
        .unwrap_err();
    assert!(matches!(err, GeoLabelError::PreconditionViolation(_)));
    assert!(NormalizedAnnotation::new(-1, 0.5, 0.5, 0.1, 0.1).is_err());
}

#[test]
fn non_positive_dimensions_are_rejected() {
    assert!(matches!(
        AnnotationCodec::new(identity(), 0, 10),
        Err(GeoLabelError::PreconditionViolation(_))
    ));
    assert!(AnnotationCodec::new(identity(), 10, 0).is_err());
}

#[test]
fn singular_transform_is_rejected_at_construction() {
    assert!(matches!(
        AffineTransform::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0),
        Err(GeoLabelError::SingularTransform { .. })
    ));
}

#[test]
fn rotated_transform_round_trip_yields_hull() {
    // 30 degree rotation, 1 unit pixels
    let (s, c) = 30f64.to_radians().sin_cos();
    let t = AffineTransform::new(c, -s, 500.0, s, c, 100.0).unwrap();
    let codec = AnnotationCodec::new(t, 64, 64).unwrap();
    let original = BoundingBox::<Geo>::new(505.0, 110.0, 515.0, 120.0);

    let a = codec.geo_box_to_normalized(&original, 1).unwrap();
    let back = codec.normalized_to_geo_box(&a);

    // Result is the axis-aligned hull of the rotated pixel box: strictly
    // larger than, and containing, the original
    assert!(back.min_x < original.min_x && back.min_y < original.min_y);
    assert!(back.max_x > original.max_x && back.max_y > original.max_y);
    assert!(close(back.center().x, original.center().x));
    assert!(close(back.center().y, original.center().y));
    // side 10 box -> pixel hull side 10(c+s) -> geo hull side 10(c+s)^2
    let side = 10.0 * (c + s) * (c + s);
    assert!((back.width() - side).abs() < 1e-9);
}

#[test]
fn nodata_positions_become_black() {
    let (w, h) = (10, 10);
    let band: Vec<f64> = (0..w * h)
        .map(|i| if i % 10 == 3 { SENTINEL } else { (i * 7 % 113) as f64 })
        .collect();
    let grid = rgb_grid(w, h, vec![band.clone(), band.clone(), band.clone()], Some(SENTINEL));

    let image = RadiometricNormalizer::for_raster(&grid, f64::NEG_INFINITY)
        .normalize(&grid)
        .unwrap();
    assert_eq!(image.dimensions(), (10, 10));

    let mut zeros = 0;
    for (i, value) in band.iter().enumerate() {
        let pixel = image.get_pixel((i % w) as u32, (i / w) as u32).0;
        if *value == SENTINEL {
            assert_eq!(pixel, [0, 0, 0]);
            zeros += 1;
        }
    }
    assert_eq!(zeros, 10);
}

#[test]
fn constant_band_gives_constant_output() {
    let constant = vec![42.0; 16];
    let ramp: Vec<f64> = (0..16).map(|v| v as f64).collect();
    let grid = rgb_grid(4, 4, vec![constant, ramp.clone(), ramp], None);

    let image = RadiometricNormalizer::default().normalize(&grid).unwrap();
    let reds: Vec<u8> = image.pixels().map(|p| p.0[0]).collect();
    assert!(reds.iter().all(|v| *v == reds[0]));
    // second channel spans the full range
    let greens: Vec<u8> = image.pixels().map(|p| p.0[1]).collect();
    assert_eq!(greens.iter().min(), Some(&0));
    assert_eq!(greens.iter().max(), Some(&255));
}

#[test]
fn fully_invalid_band_is_insufficient_data() {
    let ramp: Vec<f64> = (0..16).map(|v| v as f64).collect();
    let grid = rgb_grid(4, 4, vec![ramp.clone(), vec![SENTINEL; 16], ramp], Some(SENTINEL));
    let err = RadiometricNormalizer::for_raster(&grid, f64::NEG_INFINITY)
        .normalize(&grid)
        .unwrap_err();
    assert!(matches!(err, GeoLabelError::InsufficientData(_)));
}

#[test]
fn clip_to_full_extent_is_identity() {
    let ramp: Vec<f64> = (0..48).map(|v| v as f64).collect();
    let grid = rgb_grid(8, 6, vec![ramp.clone(), ramp.clone(), ramp], None);
    let extent: Geometry<Geo> = grid.extent_polygon().into();

    let clipped = RasterClipper::new().clip(&grid, &extent, &grid.crs()).unwrap();
    assert_eq!(clipped.bands(), grid.bands());
    assert_eq!(clipped.transform(), grid.transform());
}

#[test]
fn clip_outside_extent_is_empty_intersection() {
    let ramp: Vec<f64> = (0..48).map(|v| v as f64).collect();
    let grid = rgb_grid(8, 6, vec![ramp.clone(), ramp.clone(), ramp], None);
    let far: Geometry<Geo> = Polygon::rectangle(&BoundingBox::new(0.0, 0.0, 10.0, 10.0)).into();

    assert!(matches!(
        RasterClipper::new().clip(&grid, &far, &grid.crs()),
        Err(GeoLabelError::EmptyIntersection)
    ));
}

#[test]
fn clip_keeps_window_origin() {
    let ramp: Vec<f64> = (0..48).map(|v| v as f64).collect();
    let grid = rgb_grid(8, 6, vec![ramp.clone(), ramp.clone(), ramp], None);
    // Pixels 2..5 across, 1..4 down; x = 1000 + 2 col, y = 2000 - 2 row
    let window: Geometry<Geo> = Polygon::rectangle(&BoundingBox::new(1004.0, 1992.0, 1010.0, 1998.0)).into();

    let clipped = RasterClipper::new().clip(&grid, &window, &grid.crs()).unwrap();
    assert_eq!((clipped.width(), clipped.height()), (3, 3));
    assert_eq!(clipped.transform().forward(0.0, 0.0), grid.transform().forward(2.0, 1.0));
    assert_eq!(clipped.value(0, 0, 0), grid.value(0, 2, 1));
}
