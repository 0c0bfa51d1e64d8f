//! GeoTIFF summary command
//!
//! Prints the structure and geo-referencing of a raster: dimensions,
//! sample layout, compression, CRS, transform, extent, nodata and the
//! value range of each band.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::required_path;
use crate::errors::Result;
use crate::pipeline::{BatchReport, UnitOutcome};
use crate::raster::RasterGrid;
use crate::tiff::decoder::read_layout;
use crate::tiff::{ImageLayout, RasterReader, TiffReader};

/// Command for describing one GeoTIFF
pub struct InfoCommand {
    /// Path to the input file
    input: PathBuf,
}

impl InfoCommand {
    /// Create a new info command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    pub fn new(args: &ArgMatches) -> Result<Self> {
        Ok(InfoCommand {
            input: required_path(args, "input")?,
        })
    }

    /// Render the summary as text
    ///
    /// # Arguments
    /// * `big_tiff` - Whether the container is BigTIFF
    /// * `layout` - Structure of the first image
    /// * `grid` - The decoded raster
    pub fn describe(&self, big_tiff: bool, layout: &ImageLayout, grid: &RasterGrid) -> String {
        let mut lines = vec![
            format!("File: {}", self.input.display()),
            format!("Format: {}", if big_tiff { "BigTIFF" } else { "TIFF" }),
            format!("Size: {} x {}", grid.width(), grid.height()),
            format!("Bands: {} ({})", grid.band_count(), grid.sample_type()),
            format!(
                "Layout: {} {}x{}, {}",
                if layout.tiled { "tiles" } else { "strips" },
                layout.chunk_width,
                layout.chunk_height,
                if layout.planar { "planar" } else { "interleaved" }
            ),
            format!("Compression: {}", layout.compression),
            format!("CRS: {}", grid.crs().description()),
            format!("Transform:\n{}", grid.transform()),
            format!("Extent: {}", grid.extent()),
        ];
        match grid.nodata() {
            Some(nodata) => lines.push(format!("NoData: {}", nodata)),
            None => lines.push("NoData: none".to_string()),
        }

        for (index, band) in grid.bands().iter().enumerate() {
            let valid = band.iter().copied().filter(|v| Some(*v) != grid.nodata() && !v.is_nan());
            let range = valid.fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });
            match range {
                Some((lo, hi)) => lines.push(format!("Band {}: min {} max {}", index + 1, lo, hi)),
                None => lines.push(format!("Band {}: no valid samples", index + 1)),
            }
        }
        lines.join("\n")
    }
}

impl Command for InfoCommand {
    fn name(&self) -> &'static str {
        "info"
    }

    fn execute(&self) -> Result<BatchReport> {
        info!("Describing {}", self.input.display());

        let mut tiff = TiffReader::open(&self.input)?;
        let ifds = tiff.read_directories()?;
        let layout = read_layout(&mut tiff, &ifds[0])?;
        let grid = RasterReader::new().read_from(&mut tiff)?;

        println!("{}", self.describe(tiff.is_big_tiff(), &layout, &grid));

        let mut report = BatchReport::new(self.name());
        report.push(UnitOutcome::succeeded(self.input.display().to_string()));
        Ok(report)
    }
}
