//! TIFF and GeoTIFF constants used by the reader and writer

/// TIFF header constants
pub mod header {
    /// Standard TIFF version number (42)
    pub const TIFF_VERSION: u16 = 42;
    /// BigTIFF version number (43)
    pub const BIG_TIFF_VERSION: u16 = 43;
    /// BigTIFF offset size (8 bytes)
    pub const BIGTIFF_OFFSET_SIZE: u16 = 8;
    /// Upper bound on followed IFD links
    pub const MAX_IFDS: usize = 256;
}

/// Field types defined by TIFF 6.0 and BigTIFF
pub mod field_types {
    pub const BYTE: u16 = 1;       // 8-bit unsigned integer
    pub const ASCII: u16 = 2;      // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;      // 16-bit unsigned integer
    pub const LONG: u16 = 4;       // 32-bit unsigned integer
    pub const RATIONAL: u16 = 5;   // Two LONGs: numerator and denominator
    pub const SBYTE: u16 = 6;      // 8-bit signed integer
    pub const UNDEFINED: u16 = 7;  // 8-bit byte with unspecified format
    pub const SSHORT: u16 = 8;     // 16-bit signed integer
    pub const SLONG: u16 = 9;      // 32-bit signed integer
    pub const SRATIONAL: u16 = 10; // Two SLONGs: numerator and denominator
    pub const FLOAT: u16 = 11;     // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;    // Double precision IEEE floating point
    pub const LONG8: u16 = 16;     // BigTIFF 64-bit unsigned integer
    pub const SLONG8: u16 = 17;    // BigTIFF 64-bit signed integer
    pub const IFD8: u16 = 18;      // BigTIFF 64-bit IFD offset

    /// Size in bytes of one value of `field_type`
    pub fn size_of(field_type: u16) -> Option<usize> {
        match field_type {
            BYTE | ASCII | SBYTE | UNDEFINED => Some(1),
            SHORT | SSHORT => Some(2),
            LONG | SLONG | FLOAT => Some(4),
            RATIONAL | SRATIONAL | DOUBLE | LONG8 | SLONG8 | IFD8 => Some(8),
            _ => None,
        }
    }
}

/// Tags read or written by this crate
pub mod tags {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const PREDICTOR: u16 = 317;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const EXTRA_SAMPLES: u16 = 338;
    pub const SAMPLE_FORMAT: u16 = 339;

    // GeoTIFF tags
    pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;    // Pixel size in map units
    pub const MODEL_TIEPOINT_TAG: u16 = 33922;       // Links raster to world coordinates
    pub const MODEL_TRANSFORMATION_TAG: u16 = 34264; // 4x4 transformation matrix
    pub const GEO_KEY_DIRECTORY_TAG: u16 = 34735;    // GeoTIFF keys structure
    pub const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
    pub const GEO_ASCII_PARAMS_TAG: u16 = 34737;

    // GDAL specific tags
    pub const GDAL_NODATA: u16 = 42113;              // NoData marker value
}

/// Compression types
pub mod compression {
    pub const NONE: u16 = 1;
    pub const LZW: u16 = 5;
    pub const DEFLATE: u16 = 8;           // Adobe Deflate (zlib)
    pub const ZSTD: u16 = 14;
    pub const DEFLATE_LEGACY: u16 = 32946; // Pre-standard deflate code
}

/// Photometric interpretation values
pub mod photometric {
    pub const BLACK_IS_ZERO: u16 = 1;
    pub const RGB: u16 = 2;
}

/// Planar configuration values
pub mod planar_config {
    pub const CHUNKY: u16 = 1;            // Components stored interleaved (RGBRGBRGB)
    pub const PLANAR: u16 = 2;            // Components stored separately (RRR...GGG...BBB)
}

/// Sample format values
pub mod sample_format {
    pub const UNSIGNED: u16 = 1;
    pub const SIGNED: u16 = 2;
    pub const IEEEFP: u16 = 3;
}

/// Predictor values
pub mod predictor {
    pub const NONE: u16 = 1;
    pub const HORIZONTAL_DIFFERENCING: u16 = 2;
    pub const FLOATING_POINT: u16 = 3;
}

/// GeoTIFF key IDs
pub mod geo_keys {
    pub const GT_MODEL_TYPE: u16 = 1024;      // GTModelTypeGeoKey
    pub const GT_RASTER_TYPE: u16 = 1025;     // GTRasterTypeGeoKey
    pub const GEOGRAPHIC_TYPE: u16 = 2048;    // GeographicTypeGeoKey
    pub const PROJECTED_CS_TYPE: u16 = 3072;  // ProjectedCSTypeGeoKey

    /// Key value meaning "user defined"
    pub const USER_DEFINED: u16 = 32767;
}

/// GTModelTypeGeoKey values
pub mod model_type {
    pub const PROJECTED: u16 = 1;
    pub const GEOGRAPHIC: u16 = 2;
}

/// GTRasterTypeGeoKey values
pub mod raster_type {
    pub const PIXEL_IS_AREA: u16 = 1;
    pub const PIXEL_IS_POINT: u16 = 2;
}
