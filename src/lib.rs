pub mod annotation;
pub mod commands;
pub mod compression;
pub mod config;
pub mod coordinate;
pub mod errors;
pub mod io;
pub mod pipeline;
pub mod raster;
pub mod tiff;
pub mod utils;
pub mod vector;

pub use annotation::{AnnotationCodec, NormalizedAnnotation};
pub use config::Config;
pub use coordinate::{AffineTransform, BoundingBox, CoordinateTransformer, Crs, Geo, Geometry, Pixel, Point, Polygon};
pub use errors::{GeoLabelError, Result};
pub use pipeline::{BatchReport, ConversionPipeline};
pub use raster::{ClipResult, RadiometricNormalizer, RasterClipper, RasterGrid, TileCutter};
pub use tiff::{RasterReader, RasterWriter};
pub use vector::{Feature, FeatureCollection};
