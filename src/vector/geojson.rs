//! GeoJSON reading and writing
//!
//! Only polygonal geometries are kept; features with other geometry types
//! (or none) are skipped with a warning. The CRS comes from the legacy
//! `crs` member and defaults to EPSG:4326. Z coordinates are dropped.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coordinate::{Crs, Geo, Geometry, Point, Polygon};
use crate::errors::{GeoLabelError, Result};
use crate::vector::feature::{Feature, FeatureCollection};

type Position = Vec<f64>;
type Ring = Vec<Position>;

#[derive(Debug, Serialize, Deserialize)]
struct GeoJsonCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crs: Option<NamedCrs>,
    features: Vec<GeoJsonFeature>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedCrs {
    #[serde(rename = "type")]
    kind: String,
    properties: CrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct CrsProperties {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeoJsonFeature {
    #[serde(rename = "type")]
    kind: String,
    geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Polygon {
        coordinates: Vec<Ring>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Ring>>,
    },
    #[serde(other)]
    Unsupported,
}

/// Read a FeatureCollection file
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path).map_err(|e| GeoLabelError::io_at(path, e))?;
    let raw: GeoJsonCollection =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| GeoLabelError::VectorParse {
            path: path.to_path_buf(),
            source,
        })?;
    let collection = from_geojson(raw)?;
    debug!(
        "Read {} feature(s) in {} from {}",
        collection.len(),
        collection.crs,
        path.display()
    );
    Ok(collection)
}

/// Parse a FeatureCollection from a string
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection> {
    let raw: GeoJsonCollection = serde_json::from_str(text).map_err(|source| GeoLabelError::VectorParse {
        path: "<string>".into(),
        source,
    })?;
    from_geojson(raw)
}

/// Write a FeatureCollection file, including the `crs` member
pub fn write_feature_collection(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| GeoLabelError::io_at(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &to_geojson(collection)).map_err(|source| {
        GeoLabelError::VectorWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(|e| GeoLabelError::io_at(path, e))?;
    debug!("Wrote {} feature(s) to {}", collection.len(), path.display());
    Ok(())
}

/// Serialize a FeatureCollection to a pretty-printed string
pub fn to_geojson_string(collection: &FeatureCollection) -> Result<String> {
    serde_json::to_string_pretty(&to_geojson(collection)).map_err(|source| GeoLabelError::VectorWrite {
        path: "<string>".into(),
        source,
    })
}

fn from_geojson(raw: GeoJsonCollection) -> Result<FeatureCollection> {
    if raw.kind != "FeatureCollection" {
        return Err(GeoLabelError::InvalidGeometry(format!(
            "expected a FeatureCollection, found {}",
            raw.kind
        )));
    }

    let crs = match raw.crs {
        Some(named) => named
            .properties
            .name
            .parse::<Crs>()
            .map_err(GeoLabelError::InvalidArgument)?,
        None => Crs::WGS84,
    };

    let mut features = Vec::with_capacity(raw.features.len());
    for (index, feature) in raw.features.into_iter().enumerate() {
        let geometry = match feature.geometry {
            Some(GeoJsonGeometry::Polygon { coordinates }) => Geometry::Polygon(polygon_from(&coordinates)?),
            Some(GeoJsonGeometry::MultiPolygon { coordinates }) => Geometry::MultiPolygon(
                coordinates
                    .iter()
                    .map(|p| polygon_from(p))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(GeoJsonGeometry::Unsupported) | None => {
                warn!("Skipping feature {}: geometry is not polygonal", index);
                continue;
            }
        };
        features.push(Feature {
            geometry,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    Ok(FeatureCollection::new(crs, features))
}

fn polygon_from(rings: &[Ring]) -> Result<Polygon<Geo>> {
    let mut rings = rings.iter().map(|r| ring_from(r));
    let exterior = rings
        .next()
        .ok_or_else(|| GeoLabelError::InvalidGeometry("polygon without rings".to_string()))??;
    let holes = rings.collect::<Result<Vec<_>>>()?;
    Polygon::new(exterior, holes)
}

fn ring_from(ring: &[Position]) -> Result<Vec<Point<Geo>>> {
    ring.iter()
        .map(|pos| match pos.as_slice() {
            [x, y, ..] => Ok(Point::new(*x, *y)),
            _ => Err(GeoLabelError::InvalidGeometry(format!(
                "position needs at least 2 coordinates, got {}",
                pos.len()
            ))),
        })
        .collect()
}

fn to_geojson(collection: &FeatureCollection) -> GeoJsonCollection {
    let crs = collection.crs.ogc_urn().map(|name| NamedCrs {
        kind: "name".to_string(),
        properties: CrsProperties { name },
    });

    let features = collection
        .features
        .iter()
        .map(|f| GeoJsonFeature {
            kind: "Feature".to_string(),
            geometry: Some(match &f.geometry {
                Geometry::Polygon(p) => GeoJsonGeometry::Polygon {
                    coordinates: rings_of(p),
                },
                Geometry::MultiPolygon(parts) => GeoJsonGeometry::MultiPolygon {
                    coordinates: parts.iter().map(rings_of).collect(),
                },
            }),
            properties: Some(f.properties.clone()),
        })
        .collect();

    GeoJsonCollection {
        kind: "FeatureCollection".to_string(),
        crs,
        features,
    }
}

fn rings_of(polygon: &Polygon<Geo>) -> Vec<Ring> {
    polygon
        .rings()
        .map(|ring| ring.iter().map(|p| vec![p.x, p.y]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::BoundingBox;
    use serde_json::json;
    use tempfile::tempdir;

    const FIELDS: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::32633" } },
        "features": [
            { "type": "Feature", "properties": { "class": 2, "crop": "wheat" },
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0, 5], [10, 0, 5], [10, 10, 5], [0, 10, 5], [0, 0, 5]]] } },
            { "type": "Feature", "properties": { "name": "well" },
              "geometry": { "type": "Point", "coordinates": [3, 3] } },
            { "type": "Feature", "properties": null,
              "geometry": { "type": "MultiPolygon", "coordinates": [
                  [[[20, 20], [30, 20], [30, 30], [20, 20]]],
                  [[[40, 40], [50, 40], [50, 50], [40, 40]]] ] } }
        ]
    }"#;

    #[test]
    fn reads_polygons_and_drops_z() {
        let fc = parse_feature_collection(FIELDS).unwrap();
        assert_eq!(fc.crs, Crs::Epsg(32633));
        assert_eq!(fc.len(), 2);
        assert!(!fc.features[0].geometry.polygons()[0].has_z());
        assert_eq!(fc.features[0].class_id("class"), Some(2));
        assert_eq!(fc.features[1].geometry.polygons().len(), 2);
        assert!(fc.features[1].properties.is_empty());
    }

    #[test]
    fn missing_crs_means_wgs84() {
        let fc = parse_feature_collection(r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert_eq!(fc.crs, Crs::WGS84);
    }

    #[test]
    fn short_positions_are_invalid() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},
            "geometry":{"type":"Polygon","coordinates":[[[0],[1,1],[1,0],[0,0]]]}}]}"#;
        assert!(matches!(
            parse_feature_collection(text),
            Err(GeoLabelError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boxes.geojson");
        let feature = Feature::new(Polygon::rectangle(&BoundingBox::new(1.0, 2.0, 3.0, 4.0)).into())
            .with_property("class_id", 1);
        let fc = FeatureCollection::new(Crs::Epsg(3857), vec![feature]);

        write_feature_collection(&fc, &path).unwrap();
        let back = read_feature_collection(&path).unwrap();
        assert_eq!(back, fc);

        let text = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["crs"]["properties"]["name"], json!("urn:ogc:def:crs:EPSG::3857"));
        assert_eq!(value["features"][0]["geometry"]["type"], json!("Polygon"));
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.geojson");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_feature_collection(&path).unwrap_err();
        assert!(err.to_string().contains("broken.geojson"));
    }
}
