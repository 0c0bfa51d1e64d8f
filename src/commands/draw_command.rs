//! Bounding-box drawing command

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{output_for, required_path, CommandContext};
use crate::errors::Result;
use crate::pipeline::batch::{IMAGE_EXTENSIONS, LABEL_EXTENSIONS};
use crate::pipeline::{pair_by_stem, BatchReport};

/// Command drawing label boxes onto their images
pub struct DrawCommand<'a> {
    /// Image file or directory
    images: PathBuf,
    /// Label file or directory
    labels: PathBuf,
    /// Output directory
    output: PathBuf,
    context: CommandContext<'a>,
}

impl<'a> DrawCommand<'a> {
    /// Create a new draw command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `context` - Shared run settings
    pub fn new(args: &ArgMatches, context: CommandContext<'a>) -> Result<Self> {
        Ok(DrawCommand {
            images: required_path(args, "images")?,
            labels: required_path(args, "labels")?,
            output: required_path(args, "output")?,
            context,
        })
    }
}

impl Command for DrawCommand<'_> {
    fn name(&self) -> &'static str {
        "draw"
    }

    fn execute(&self) -> Result<BatchReport> {
        let pairing = pair_by_stem(&self.images, &IMAGE_EXTENSIONS, &self.labels, &LABEL_EXTENSIONS)?;
        info!("Drawing boxes on {} image(s)", pairing.pairs.len());

        Ok(self.context.runner().run_pairs(
            self.name(),
            &pairing,
            "label",
            |(image, _)| image.display().to_string(),
            |(image, labels)| {
                let output = output_for(&self.output, image, false, "png")?;
                self.context.pipeline.draw(image, labels, &output)?;
                Ok(BatchReport::default())
            },
        ))
    }
}
