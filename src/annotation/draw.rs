//! Drawing annotation boxes onto images

use image::{Rgb, RgbImage};

use crate::annotation::record::NormalizedAnnotation;

/// Draws hollow rectangles for normalized annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxPainter {
    color: Rgb<u8>,
    thickness: u32,
}

impl Default for BoxPainter {
    fn default() -> Self {
        BoxPainter {
            color: Rgb([255, 0, 0]),
            thickness: 2,
        }
    }
}

impl BoxPainter {
    pub fn new(color: [u8; 3], thickness: u32) -> Self {
        BoxPainter {
            color: Rgb(color),
            thickness: thickness.max(1),
        }
    }

    /// Draw every annotation; lines grow inward from the box edges
    pub fn paint(&self, image: &mut RgbImage, annotations: &[NormalizedAnnotation]) {
        let (w, h) = (image.width() as f64, image.height() as f64);
        for annotation in annotations {
            let (left, top, right, bottom) = annotation.edges();
            let left = (left * w).round() as i64;
            let top = (top * h).round() as i64;
            let right = (right * w).round() as i64;
            let bottom = (bottom * h).round() as i64;
            for inset in 0..self.thickness as i64 {
                if left + inset > right - inset || top + inset > bottom - inset {
                    break;
                }
                self.outline(image, left + inset, top + inset, right - inset, bottom - inset);
            }
        }
    }

    fn outline(&self, image: &mut RgbImage, left: i64, top: i64, right: i64, bottom: i64) {
        // Only the visible span of each side is walked
        let (w, h) = (image.width() as i64, image.height() as i64);
        for x in left.max(0)..=right.min(w - 1) {
            self.put(image, x, top);
            self.put(image, x, bottom);
        }
        for y in top.max(0)..=bottom.min(h - 1) {
            self.put(image, left, y);
            self.put(image, right, y);
        }
    }

    fn put(&self, image: &mut RgbImage, x: i64, y: i64) {
        if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
            image.put_pixel(x as u32, y as u32, self.color);
        }
    }
}
