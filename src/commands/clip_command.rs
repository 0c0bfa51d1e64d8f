//! Polygon clipping command
//!
//! Clips a raster by each polygon of a GeoJSON file. Every polygon is
//! reported as its own unit; polygons outside the raster are skipped.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{compression_arg, required_path, CommandContext};
use crate::errors::Result;
use crate::pipeline::batch::RASTER_EXTENSIONS;
use crate::pipeline::{collect_inputs, file_stem_of, BatchReport};

/// Command for clipping rasters to polygons
pub struct ClipCommand<'a> {
    /// Raster file or directory
    raster: PathBuf,
    /// GeoJSON with the clip polygons
    polygons: PathBuf,
    /// Optional GeoJSON filtered against each polygon
    features: Option<PathBuf>,
    /// Output directory
    output: PathBuf,
    context: CommandContext<'a>,
}

impl<'a> ClipCommand<'a> {
    /// Create a new clip command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `context` - Shared run settings
    pub fn new(args: &ArgMatches, mut context: CommandContext<'a>) -> Result<Self> {
        context.pipeline = context.pipeline.with_compression(compression_arg(args)?);
        Ok(ClipCommand {
            raster: required_path(args, "raster")?,
            polygons: required_path(args, "polygons")?,
            features: args.get_one::<PathBuf>("features").cloned(),
            output: required_path(args, "output")?,
            context,
        })
    }
}

impl Command for ClipCommand<'_> {
    fn name(&self) -> &'static str {
        "clip"
    }

    fn execute(&self) -> Result<BatchReport> {
        let rasters = collect_inputs(&self.raster, &RASTER_EXTENSIONS)?;
        let single = rasters.len() == 1;
        info!("Clipping {} raster(s) by {}", rasters.len(), self.polygons.display());

        Ok(self.context.runner().run(
            self.name(),
            &rasters,
            |path| path.display().to_string(),
            |path| {
                // Several rasters each get their own subdirectory
                let out_dir = if single {
                    self.output.clone()
                } else {
                    self.output.join(file_stem_of(path)?)
                };
                self.context
                    .pipeline
                    .clip_by_polygons(path, &self.polygons, self.features.as_deref(), &out_dir)
            },
        ))
    }
}
