//! Radiometric normalization command
//!
//! Converts one GeoTIFF, or every GeoTIFF under a directory, into an
//! 8-bit RGB PNG using a 2-98 percentile stretch.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{output_for, required_path, CommandContext};
use crate::errors::Result;
use crate::pipeline::batch::RASTER_EXTENSIONS;
use crate::pipeline::{collect_inputs, BatchReport};

/// Command for normalizing rasters to PNG
pub struct NormalizeCommand<'a> {
    /// Raster file or directory
    input: PathBuf,
    /// PNG file (single input) or output directory
    output: PathBuf,
    context: CommandContext<'a>,
}

impl<'a> NormalizeCommand<'a> {
    /// Create a new normalize command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `context` - Shared run settings
    pub fn new(args: &ArgMatches, mut context: CommandContext<'a>) -> Result<Self> {
        if let Ok(Some(threshold)) = args.try_get_one::<f64>("nodata-threshold") {
            context.pipeline = context.pipeline.with_nodata_threshold(*threshold);
        }
        Ok(NormalizeCommand {
            input: required_path(args, "input")?,
            output: required_path(args, "output")?,
            context,
        })
    }
}

impl Command for NormalizeCommand<'_> {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn execute(&self) -> Result<BatchReport> {
        let rasters = collect_inputs(&self.input, &RASTER_EXTENSIONS)?;
        let single = self.input.is_file();
        info!(
            "Normalizing {} raster(s), nodata threshold {}",
            rasters.len(),
            self.context.pipeline.nodata_threshold()
        );

        Ok(self.context.runner().run(
            self.name(),
            &rasters,
            |path| path.display().to_string(),
            |path| {
                let output = output_for(&self.output, path, single, "png")?;
                self.context.pipeline.normalize(path, &output)?;
                Ok(BatchReport::default())
            },
        ))
    }
}
