//! Square tiling command

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{compression_arg, required_path, CommandContext};
use crate::errors::Result;
use crate::pipeline::batch::IMAGE_EXTENSIONS;
use crate::pipeline::{collect_inputs, BatchReport};

/// Command cutting images or GeoTIFFs into fixed-size tiles
pub struct TileCommand<'a> {
    /// Image/raster file or directory
    input: PathBuf,
    /// Output directory
    output: PathBuf,
    context: CommandContext<'a>,
}

impl<'a> TileCommand<'a> {
    /// Create a new tile command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `context` - Shared run settings
    pub fn new(args: &ArgMatches, mut context: CommandContext<'a>) -> Result<Self> {
        if let Ok(Some(size)) = args.try_get_one::<u32>("size") {
            context.pipeline = context.pipeline.with_tile_size(*size)?;
        }
        context.pipeline = context.pipeline.with_compression(compression_arg(args)?);

        Ok(TileCommand {
            input: required_path(args, "input")?,
            output: required_path(args, "output")?,
            context,
        })
    }
}

impl Command for TileCommand<'_> {
    fn name(&self) -> &'static str {
        "tile"
    }

    fn execute(&self) -> Result<BatchReport> {
        let inputs = collect_inputs(&self.input, &IMAGE_EXTENSIONS)?;
        info!(
            "Tiling {} file(s) into {}px squares",
            inputs.len(),
            self.context.pipeline.tile_size()
        );

        Ok(self.context.runner().run(
            self.name(),
            &inputs,
            |path| path.display().to_string(),
            |path| {
                self.context.pipeline.tile(path, &self.output)?;
                Ok(BatchReport::default())
            },
        ))
    }
}
