//! Fixed-size square tiling of images and rasters
//!
//! Tiles are laid out from the top-left corner; partial tiles along the
//! right and bottom edges are discarded.

use image::{imageops, RgbImage};

use crate::errors::{GeoLabelError, Result};
use crate::raster::grid::{PixelWindow, RasterGrid};

/// One square piece of a larger image
#[derive(Debug, Clone)]
pub struct Tile<T> {
    pub row: u32,
    pub col: u32,
    pub data: T,
}

impl<T> Tile<T> {
    /// File name for this tile: `{stem}_square_{row}_{col}.{ext}`
    pub fn file_name(&self, stem: &str, extension: &str) -> String {
        format!("{}_square_{}_{}.{}", stem, self.row, self.col, extension)
    }
}

/// Cuts images into `size` x `size` tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCutter {
    size: u32,
}

impl Default for TileCutter {
    fn default() -> Self {
        TileCutter { size: 512 }
    }
}

impl TileCutter {
    pub fn new(size: u32) -> Result<Self> {
        if size == 0 {
            return Err(GeoLabelError::PreconditionViolation(
                "tile size must be positive".to_string(),
            ));
        }
        Ok(TileCutter { size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of whole tiles across and down
    pub fn grid_shape(&self, width: u32, height: u32) -> (u32, u32) {
        (width / self.size, height / self.size)
    }

    pub fn cut_image(&self, image: &RgbImage) -> Vec<Tile<RgbImage>> {
        let (across, down) = self.grid_shape(image.width(), image.height());
        let mut tiles = Vec::with_capacity((across * down) as usize);
        for row in 0..down {
            for col in 0..across {
                let view = imageops::crop_imm(image, col * self.size, row * self.size, self.size, self.size);
                tiles.push(Tile {
                    row,
                    col,
                    data: view.to_image(),
                });
            }
        }
        tiles
    }

    /// Square sub-grids, each with its own translated transform
    pub fn cut_raster(&self, raster: &RasterGrid) -> Result<Vec<Tile<RasterGrid>>> {
        let (across, down) = self.grid_shape(raster.width() as u32, raster.height() as u32);
        let size = self.size as usize;
        let mut tiles = Vec::with_capacity((across * down) as usize);
        for row in 0..down {
            for col in 0..across {
                let window = PixelWindow {
                    col_off: col as usize * size,
                    row_off: row as usize * size,
                    width: size,
                    height: size,
                };
                tiles.push(Tile {
                    row,
                    col,
                    data: raster.crop(&window)?,
                });
            }
        }
        Ok(tiles)
    }
}
