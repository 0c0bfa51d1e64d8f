//! Crate-wide error type
//!
//! Every conversion unit (one raster, one raster/vector pair, one clip
//! polygon) either succeeds or fails with a [`GeoLabelError`]. The batch
//! orchestrator uses [`GeoLabelError::disposition`] to decide whether a
//! failed unit is reported as skipped or as failed.

use std::path::PathBuf;

use thiserror::Error;

use crate::coordinate::Crs;
use crate::tiff::errors::TiffError;

/// Errors produced by geolabel operations.
#[derive(Debug, Error)]
pub enum GeoLabelError {
    #[error("singular affine transform: linear part [[{a}, {b}], [{d}, {e}]] has determinant {determinant}")]
    SingularTransform {
        a: f64,
        b: f64,
        d: f64,
        e: f64,
        determinant: f64,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("clip geometry does not intersect the raster extent")]
    EmptyIntersection,

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("GeoTIFF error: {0}")]
    Tiff(#[from] TiffError),

    #[error("Failed to parse GeoJSON from {path}: {source}")]
    VectorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write GeoJSON to {path}: {source}")]
    VectorWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{path}:{line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("unsupported reprojection from {from} to {to}")]
    Reprojection { from: Crs, to: Crs },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// How the orchestrator reports a unit that ended in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Nothing to export for this unit; not a fault.
    Skipped,
    /// The unit could not be processed.
    Failed,
}

impl GeoLabelError {
    /// Classify this error for the batch report.
    pub fn disposition(&self) -> Disposition {
        match self {
            GeoLabelError::InsufficientData(_) | GeoLabelError::EmptyIntersection => {
                Disposition::Skipped
            }
            _ => Disposition::Failed,
        }
    }

    /// Attach a path to a bare IO error.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeoLabelError::FileIo {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeoLabelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_and_empty_intersection_are_skips() {
        assert_eq!(
            GeoLabelError::InsufficientData("no bands".into()).disposition(),
            Disposition::Skipped
        );
        assert_eq!(
            GeoLabelError::EmptyIntersection.disposition(),
            Disposition::Skipped
        );
    }

    #[test]
    fn caller_bugs_are_failures() {
        let err = GeoLabelError::PreconditionViolation("negative class id".into());
        assert_eq!(err.disposition(), Disposition::Failed);

        let err = GeoLabelError::SingularTransform {
            a: 0.0,
            b: 0.0,
            d: 0.0,
            e: 0.0,
            determinant: 0.0,
        };
        assert_eq!(err.disposition(), Disposition::Failed);
    }
}
