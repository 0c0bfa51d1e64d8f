use std::fs;
use std::path::Path;

use assert_cmd::Command;
use geolabel::coordinate::{AffineTransform, BoundingBox, Crs, Polygon};
use geolabel::raster::RasterGrid;
use geolabel::tiff::{RasterWriter, SampleType};
use geolabel::vector::{read_feature_collection, write_feature_collection, Feature, FeatureCollection};
use predicates::str::contains;
use tempfile::tempdir;

fn geolabel() -> Command {
    let mut cmd = Command::cargo_bin("geolabel").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// 200x200 three-band raster whose pixel and map coordinates coincide
fn write_identity_raster(path: &Path) {
    let band: Vec<f64> = (0..200 * 200).map(|i| (i % 251) as f64).collect();
    let grid = RasterGrid::new(
        200,
        200,
        Crs::Epsg(32633),
        AffineTransform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0).unwrap(),
        None,
        SampleType::U8,
        vec![band.clone(), band.clone(), band],
    )
    .unwrap();
    RasterWriter::default().write(&grid, path).unwrap();
}

fn write_boxes(path: &Path, boxes: &[(f64, f64, f64, f64, i64)]) {
    let features = boxes
        .iter()
        .map(|&(x0, y0, x1, y1, class)| {
            Feature::new(Polygon::rectangle(&BoundingBox::new(x0, y0, x1, y1)).into()).with_property("class", class)
        })
        .collect();
    write_feature_collection(&FeatureCollection::new(Crs::Epsg(32633), features), path).unwrap();
}

#[test]
fn outputs_tool_name() {
    geolabel()
        .arg("-V")
        .assert()
        .success()
        .stdout(format!("geolabel {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn requires_a_subcommand() {
    geolabel().assert().failure();
}

#[test]
fn info_describes_raster() {
    let dir = tempdir().unwrap();
    let raster = dir.path().join("scene.tif");
    write_identity_raster(&raster);

    geolabel()
        .args(["info", "--input"])
        .arg(&raster)
        .assert()
        .success()
        .stdout(contains("Size: 200 x 200"))
        .stdout(contains("EPSG:32633"))
        .stdout(contains("Bands: 3 (uint8)"));
}

#[test]
fn detections_become_geographic_boxes() {
    let dir = tempdir().unwrap();
    let raster = dir.path().join("scene.tif");
    let labels = dir.path().join("scene.txt");
    let output = dir.path().join("out/scene.geojson");
    write_identity_raster(&raster);
    fs::write(&labels, "0 0.5 0.5 0.2 0.2\n2 0.25 0.25 0.1 0.1\n").unwrap();

    geolabel()
        .arg("detections")
        .arg("--raster")
        .arg(&raster)
        .arg("--labels")
        .arg(&labels)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let boxes = read_feature_collection(&output).unwrap();
    assert_eq!(boxes.crs, Crs::Epsg(32633));
    assert_eq!(boxes.len(), 2);
    let first = boxes.features[0].geometry.bounds().unwrap();
    assert!(first.approx_eq(&BoundingBox::new(80.0, 80.0, 120.0, 120.0), 1e-9));
    assert_eq!(boxes.features[1].class_id("class_id"), Some(2));
}

#[test]
fn annotate_pairs_directories_and_writes_report() {
    let dir = tempdir().unwrap();
    let (rasters, vectors) = (dir.path().join("rasters"), dir.path().join("vectors"));
    fs::create_dir_all(&rasters).unwrap();
    fs::create_dir_all(&vectors).unwrap();
    write_identity_raster(&rasters.join("a.tif"));
    write_identity_raster(&rasters.join("b.tif"));
    write_boxes(&vectors.join("a.geojson"), &[(10.0, 10.0, 30.0, 40.0, 1), (500.0, 500.0, 510.0, 510.0, 0)]);
    write_boxes(&vectors.join("b.geojson"), &[(20.0, 20.0, 60.0, 60.0, 4)]);

    let report = dir.path().join("report.json");
    geolabel()
        .arg("annotate")
        .arg("--raster")
        .arg(&rasters)
        .arg("--vector")
        .arg(&vectors)
        .arg("--images")
        .arg(dir.path().join("images"))
        .arg("--labels")
        .arg(dir.path().join("labels"))
        .args(["--class-field", "class", "--report"])
        .arg(&report)
        .assert()
        .success();

    let a = fs::read_to_string(dir.path().join("labels/a.txt")).unwrap();
    assert_eq!(a, "1 0.100000 0.125000 0.100000 0.150000\n");
    assert!(dir.path().join("images/b.png").exists());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["command"], "annotate");
    assert_eq!(json["units"].as_array().map(|u| u.len()), Some(2));
}

#[test]
fn unpaired_rasters_are_reported_as_skipped() {
    let dir = tempdir().unwrap();
    let (rasters, vectors) = (dir.path().join("rasters"), dir.path().join("vectors"));
    fs::create_dir_all(&rasters).unwrap();
    fs::create_dir_all(&vectors).unwrap();
    write_identity_raster(&rasters.join("a.tif"));
    write_identity_raster(&rasters.join("orphan.tif"));
    write_boxes(&vectors.join("a.geojson"), &[(10.0, 10.0, 30.0, 40.0, 1)]);

    let report = dir.path().join("report.json");
    geolabel()
        .arg("annotate")
        .arg("--raster")
        .arg(&rasters)
        .arg("--vector")
        .arg(&vectors)
        .arg("--images")
        .arg(dir.path().join("images"))
        .arg("--labels")
        .arg(dir.path().join("labels"))
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stderr(contains("1 skipped"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    let units = json["units"].as_array().unwrap();
    assert_eq!(units.len(), 2);
    let orphan = units
        .iter()
        .find(|u| u["unit"].as_str().is_some_and(|n| n.ends_with("orphan.tif")))
        .unwrap();
    assert_eq!(orphan["status"], "skipped");
    assert_eq!(orphan["reason"], "no matching vector file");
    assert!(!dir.path().join("labels/orphan.txt").exists());
}

#[test]
fn negative_class_fails_unit_with_exit_code_two() {
    let dir = tempdir().unwrap();
    let raster = dir.path().join("scene.tif");
    let vector = dir.path().join("scene.geojson");
    write_identity_raster(&raster);
    write_boxes(&vector, &[(10.0, 10.0, 20.0, 20.0, -1)]);

    geolabel()
        .arg("annotate")
        .arg("--raster")
        .arg(&raster)
        .arg("--vector")
        .arg(&vector)
        .arg("--images")
        .arg(dir.path().join("images"))
        .arg("--labels")
        .arg(dir.path().join("labels"))
        .args(["--class-field", "class"])
        .assert()
        .code(2)
        .stderr(contains("failed"));
}

#[test]
fn clip_outside_polygon_is_skipped() {
    let dir = tempdir().unwrap();
    let raster = dir.path().join("scene.tif");
    let polygons = dir.path().join("cells.geojson");
    write_identity_raster(&raster);
    write_boxes(&polygons, &[(0.0, 0.0, 50.0, 50.0, 0), (1000.0, 1000.0, 1100.0, 1100.0, 0)]);

    let out = dir.path().join("clips");
    geolabel()
        .arg("clip")
        .arg("--raster")
        .arg(&raster)
        .arg("--polygons")
        .arg(&polygons)
        .arg("--output")
        .arg(&out)
        .args(["--compression", "deflate"])
        .assert()
        .success()
        .stderr(contains("skipped"));

    assert!(out.join("square_0.tif").exists());
    assert!(out.join("square_0.geojson").exists());
    assert!(!out.join("square_1.tif").exists());
}

#[test]
fn tile_cuts_whole_squares() {
    let dir = tempdir().unwrap();
    let raster = dir.path().join("scene.tif");
    write_identity_raster(&raster);

    let out = dir.path().join("tiles");
    geolabel()
        .args(["tile", "--size", "64", "--input"])
        .arg(&raster)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    // 200 / 64 = 3 tiles per side
    let count = fs::read_dir(&out).unwrap().count();
    assert_eq!(count, 9);
    assert!(out.join("scene_square_2_2.tif").exists());
}

#[test]
fn group_writes_one_box_per_value() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("parcels.geojson");
    let output = dir.path().join("grouped.geojson");
    write_boxes(&input, &[(0.0, 0.0, 1.0, 1.0, 1), (5.0, 5.0, 6.0, 6.0, 1), (2.0, 2.0, 3.0, 3.0, 2)]);

    geolabel()
        .arg("group")
        .arg("--input")
        .arg(&input)
        .args(["--field", "class", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(contains("2 group box(es)"));

    let grouped = read_feature_collection(&output).unwrap();
    assert_eq!(grouped.len(), 2);
    assert!(grouped.features[0]
        .geometry
        .bounds()
        .unwrap()
        .approx_eq(&BoundingBox::new(0.0, 0.0, 6.0, 6.0), 1e-12));
}

#[test]
fn unknown_config_key_is_an_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("geolabel.toml");
    fs::write(&config, "[tiles]\nsise = 3\n").unwrap();
    let raster = dir.path().join("scene.tif");
    write_identity_raster(&raster);

    geolabel()
        .arg("--config")
        .arg(&config)
        .args(["info", "--input"])
        .arg(&raster)
        .assert()
        .code(1)
        .stderr(contains("invalid configuration"));
}
