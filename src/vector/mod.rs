//! Vector features and GeoJSON I/O

pub mod feature;
pub mod geojson;
pub mod group;

pub use self::feature::{Feature, FeatureCollection};
pub use self::geojson::{parse_feature_collection, read_feature_collection, write_feature_collection};
pub use self::group::group_bounding_boxes;
