//! Normalized detection annotations
//!
//! Text form, one record per line:
//!
//! ```text
//! class_id x_center y_center width height
//! ```

use std::fmt;
use std::str::FromStr;

use crate::errors::{GeoLabelError, Result};

/// A YOLO-style box relative to one image's dimensions
///
/// Centers and extents are not clamped to [0, 1]: boxes near the image
/// edge may extend past it. Use [`NormalizedAnnotation::clamped`] to clip
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedAnnotation {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedAnnotation {
    /// Validated constructor; negative class ids and extents are rejected
    pub fn new(class_id: i64, x_center: f64, y_center: f64, width: f64, height: f64) -> Result<Self> {
        if class_id < 0 || class_id > u32::MAX as i64 {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "class id must be a non-negative 32-bit integer, got {}",
                class_id
            )));
        }
        if ![x_center, y_center, width, height].iter().all(|v| v.is_finite()) {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "annotation values must be finite, got ({}, {}, {}, {})",
                x_center, y_center, width, height
            )));
        }
        if width < 0.0 || height < 0.0 {
            return Err(GeoLabelError::PreconditionViolation(format!(
                "annotation extent must be non-negative, got {}x{}",
                width, height
            )));
        }

        Ok(NormalizedAnnotation {
            class_id: class_id as u32,
            x_center,
            y_center,
            width,
            height,
        })
    }

    /// Left, top, right, bottom in normalized units
    pub fn edges(&self) -> (f64, f64, f64, f64) {
        (
            self.x_center - self.width / 2.0,
            self.y_center - self.height / 2.0,
            self.x_center + self.width / 2.0,
            self.y_center + self.height / 2.0,
        )
    }

    /// Whether any edge lies outside the unit square
    pub fn is_out_of_bounds(&self) -> bool {
        let (left, top, right, bottom) = self.edges();
        left < 0.0 || top < 0.0 || right > 1.0 || bottom > 1.0
    }

    /// Same box with its edges clipped to the unit square
    pub fn clamped(&self) -> NormalizedAnnotation {
        let (left, top, right, bottom) = self.edges();
        let (left, right) = (left.clamp(0.0, 1.0), right.clamp(0.0, 1.0));
        let (top, bottom) = (top.clamp(0.0, 1.0), bottom.clamp(0.0, 1.0));
        NormalizedAnnotation {
            class_id: self.class_id,
            x_center: (left + right) / 2.0,
            y_center: (top + bottom) / 2.0,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Parse one whitespace-separated record
    ///
    /// The class id may be written as a float (`0.0`) but must be integral.
    pub fn parse_line(line: &str) -> std::result::Result<Self, String> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(format!("expected 5 fields, found {}", fields.len()));
        }

        let mut values = [0.0f64; 5];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", field))?;
        }

        let class = values[0];
        if class.fract() != 0.0 {
            return Err(format!("class id '{}' is not an integer", fields[0]));
        }
        NormalizedAnnotation::new(class as i64, values[1], values[2], values[3], values[4])
            .map_err(|e| e.to_string())
    }
}

impl FromStr for NormalizedAnnotation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NormalizedAnnotation::parse_line(s)
    }
}

impl fmt::Display for NormalizedAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_class_is_rejected() {
        assert!(matches!(
            NormalizedAnnotation::new(-1, 0.5, 0.5, 0.1, 0.1),
            Err(GeoLabelError::PreconditionViolation(_))
        ));
        assert!("-1 0.5 0.5 0.1 0.1".parse::<NormalizedAnnotation>().is_err());
    }

    #[test]
    fn parses_float_class_ids() {
        let a: NormalizedAnnotation = "3.0 0.5 0.25 0.2 0.1".parse().unwrap();
        assert_eq!(a.class_id, 3);
        assert_eq!(a.y_center, 0.25);
        assert!("1.5 0.5 0.5 0.1 0.1".parse::<NormalizedAnnotation>().is_err());
        assert!("0 0.5 0.5 0.1".parse::<NormalizedAnnotation>().is_err());
        assert!("0 0.5 abc 0.1 0.1".parse::<NormalizedAnnotation>().is_err());
    }

    #[test]
    fn display_uses_six_decimals() {
        let a = NormalizedAnnotation::new(0, 0.2, 0.25, 0.2, 0.3).unwrap();
        assert_eq!(a.to_string(), "0 0.200000 0.250000 0.200000 0.300000");
    }

    #[test]
    fn out_of_bounds_passes_through_until_clamped() {
        let a = NormalizedAnnotation::new(1, 0.95, 0.5, 0.2, 0.2).unwrap();
        assert!(a.is_out_of_bounds());
        assert_eq!(a.x_center, 0.95);

        let c = a.clamped();
        assert!((c.width - 0.15).abs() < 1e-12);
        assert!((c.x_center - 0.925).abs() < 1e-12);
    }
}
