//! GeoTIFF geo-referencing: GeoKey directory, model tags and nodata
//!
//! The affine transform comes from ModelTransformationTag when present,
//! otherwise from ModelPixelScaleTag + ModelTiepointTag (north-up).
//! The CRS is the ProjectedCSType key, falling back to GeographicType.

use log::{debug, warn};

use crate::coordinate::{AffineTransform, Crs};
use crate::errors::Result;
use crate::io::SeekableReader;
use crate::tiff::constants::{geo_keys, raster_type, tags};
use crate::tiff::errors::TiffError;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// One GeoKey entry with an inline SHORT value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    pub location: u16,
    pub count: u16,
    pub value: u16,
}

/// Geo-referencing extracted from the first IFD
#[derive(Debug, Clone, PartialEq)]
pub struct GeoReference {
    pub crs: Crs,
    /// `None` when the file carries no model tags
    pub transform: Option<AffineTransform>,
    pub nodata: Option<f64>,
}

/// Parse the SHORT array of GeoKeyDirectoryTag
///
/// Layout: header `[version, revision, minor, key_count]` followed by
/// `key_count` quadruples `[key_id, location, count, value]`.
pub fn parse_geo_key_directory(values: &[u64]) -> Vec<GeoKeyEntry> {
    if values.len() < 4 {
        warn!("GeoKey directory too short ({} values)", values.len());
        return Vec::new();
    }

    let declared = values[3] as usize;
    let entries: Vec<GeoKeyEntry> = values[4..]
        .chunks_exact(4)
        .take(declared)
        .map(|q| GeoKeyEntry {
            key_id: q[0] as u16,
            location: q[1] as u16,
            count: q[2] as u16,
            value: q[3] as u16,
        })
        .collect();

    if entries.len() < declared {
        warn!("GeoKey directory declares {} keys but holds {}", declared, entries.len());
    }
    entries
}

/// Value of a key stored directly in the directory
pub fn inline_key_value(entries: &[GeoKeyEntry], key_id: u16) -> Option<u16> {
    entries
        .iter()
        .find(|e| e.key_id == key_id && e.location == 0)
        .map(|e| e.value)
}

/// CRS from the GeoKeys: projected code first, then geographic
pub fn crs_from_keys(entries: &[GeoKeyEntry]) -> Crs {
    [geo_keys::PROJECTED_CS_TYPE, geo_keys::GEOGRAPHIC_TYPE]
        .iter()
        .filter_map(|&key| inline_key_value(entries, key))
        .find(|&code| code != 0 && code != geo_keys::USER_DEFINED)
        .map(|code| Crs::Epsg(code as u32))
        .unwrap_or(Crs::Unknown)
}

/// Affine transform from the model tags
///
/// `transformation` is the 16-value row-major 4x4 matrix; `scale` and
/// `tiepoint` are the 3- and 6-value (or longer) arrays.
pub fn transform_from_model(
    transformation: Option<&[f64]>,
    scale: Option<&[f64]>,
    tiepoint: Option<&[f64]>,
) -> Result<Option<AffineTransform>> {
    if let Some(m) = transformation {
        if m.len() < 16 {
            return Err(TiffError::InvalidTagValue {
                tag: tags::MODEL_TRANSFORMATION_TAG,
                reason: format!("expected 16 values, got {}", m.len()),
            }
            .into());
        }
        return AffineTransform::new(m[0], m[1], m[3], m[4], m[5], m[7]).map(Some);
    }

    match (scale, tiepoint) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => {
            let (sx, sy) = (s[0], s[1]);
            let (i, j, x, y) = (t[0], t[1], t[3], t[4]);
            if t.len() > 6 {
                debug!("Ignoring {} extra tiepoints", t.len() / 6 - 1);
            }
            AffineTransform::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy).map(Some)
        }
        (None, None) => Ok(None),
        _ => {
            warn!("Incomplete pixel scale / tiepoint tags, ignoring geo-referencing");
            Ok(None)
        }
    }
}

/// Parse a GDAL_NODATA string such as `-3.40282e+38` or `nan`
pub fn parse_nodata(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match trimmed.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparseable GDAL_NODATA value '{}'", trimmed);
            None
        }
    }
}

/// Read all geo-referencing information from `ifd`
pub fn read_geo_reference<R: SeekableReader>(
    reader: &mut TiffReader<R>,
    ifd: &IFD,
) -> Result<GeoReference> {
    let keys = match reader.tag(ifd, tags::GEO_KEY_DIRECTORY_TAG)? {
        Some(value) => parse_geo_key_directory(&value.as_u64s(tags::GEO_KEY_DIRECTORY_TAG)?),
        None => Vec::new(),
    };
    let crs = crs_from_keys(&keys);

    let transformation = reader
        .tag(ifd, tags::MODEL_TRANSFORMATION_TAG)?
        .map(|v| v.as_f64s(tags::MODEL_TRANSFORMATION_TAG))
        .transpose()?;
    let scale = reader
        .tag(ifd, tags::MODEL_PIXEL_SCALE_TAG)?
        .map(|v| v.as_f64s(tags::MODEL_PIXEL_SCALE_TAG))
        .transpose()?;
    let tiepoint = reader
        .tag(ifd, tags::MODEL_TIEPOINT_TAG)?
        .map(|v| v.as_f64s(tags::MODEL_TIEPOINT_TAG))
        .transpose()?;

    let mut transform = transform_from_model(
        transformation.as_deref(),
        scale.as_deref(),
        tiepoint.as_deref(),
    )?;

    // PixelIsPoint anchors the model space at cell centers
    if inline_key_value(&keys, geo_keys::GT_RASTER_TYPE) == Some(raster_type::PIXEL_IS_POINT) {
        transform = transform.map(|t| t.translated(-0.5, -0.5));
    }

    let nodata = reader
        .tag(ifd, tags::GDAL_NODATA)?
        .and_then(|v| v.as_str().and_then(parse_nodata));

    debug!("Geo reference: crs={}, transform={:?}, nodata={:?}", crs, transform, nodata);
    Ok(GeoReference {
        crs,
        transform,
        nodata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projected_code_wins_over_geographic() {
        let dir: [u64; 16] = [1, 1, 0, 3, 1024, 0, 1, 1, 2048, 0, 1, 4326, 3072, 0, 1, 32633];
        let keys = parse_geo_key_directory(&dir);
        assert_eq!(keys.len(), 3);
        assert_eq!(crs_from_keys(&keys), Crs::Epsg(32633));
    }

    #[test]
    fn user_defined_codes_are_unknown() {
        let dir: [u64; 8] = [1, 1, 0, 1, 3072, 0, 1, 32767];
        assert_eq!(crs_from_keys(&parse_geo_key_directory(&dir)), Crs::Unknown);
    }

    #[test]
    fn scale_and_tiepoint_build_north_up_transform() {
        let t = transform_from_model(
            None,
            Some(&[30.0, 30.0, 0.0][..]),
            Some(&[0.0, 0.0, 0.0, 440720.0, 3751320.0, 0.0][..]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(t.coefficients(), [30.0, 0.0, 440720.0, 0.0, -30.0, 3751320.0]);
    }

    #[test]
    fn tiepoint_away_from_origin_is_honoured() {
        let t = transform_from_model(
            None,
            Some(&[2.0, 2.0, 0.0][..]),
            Some(&[10.0, 5.0, 0.0, 1000.0, 500.0, 0.0][..]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(t.forward(10.0, 5.0), (1000.0, 500.0));
        assert_eq!(t.forward(0.0, 0.0), (980.0, 510.0));
    }

    #[test]
    fn model_transformation_takes_precedence() {
        let m = [
            0.0, 1.0, 0.0, 5.0, //
            1.0, 0.0, 0.0, 7.0, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let t = transform_from_model(Some(&m[..]), Some(&[9.0, 9.0, 0.0][..]), None)
            .unwrap()
            .unwrap();
        assert_eq!(t.coefficients(), [0.0, 1.0, 5.0, 1.0, 0.0, 7.0]);
    }

    #[test]
    fn nodata_strings() {
        assert_eq!(parse_nodata("-3.40282e+38\0"), Some(-3.40282e38));
        assert!(parse_nodata("nan").map_or(false, f64::is_nan));
        assert_eq!(parse_nodata("none"), None);
    }
}
