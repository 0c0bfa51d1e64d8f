//! Detection records to GeoJSON command

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{output_for, required_path, CommandContext};
use crate::errors::Result;
use crate::pipeline::batch::{LABEL_EXTENSIONS, RASTER_EXTENSIONS};
use crate::pipeline::{pair_by_stem, BatchReport};

/// Command converting label files into geographic boxes
pub struct DetectionsCommand<'a> {
    /// Raster file or directory
    raster: PathBuf,
    /// Label file or directory
    labels: PathBuf,
    /// GeoJSON file (single pair) or output directory
    output: PathBuf,
    context: CommandContext<'a>,
}

impl<'a> DetectionsCommand<'a> {
    /// Create a new detections command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `context` - Shared run settings
    pub fn new(args: &ArgMatches, context: CommandContext<'a>) -> Result<Self> {
        Ok(DetectionsCommand {
            raster: required_path(args, "raster")?,
            labels: required_path(args, "labels")?,
            output: required_path(args, "output")?,
            context,
        })
    }
}

impl Command for DetectionsCommand<'_> {
    fn name(&self) -> &'static str {
        "detections"
    }

    fn execute(&self) -> Result<BatchReport> {
        let pairing = pair_by_stem(&self.raster, &RASTER_EXTENSIONS, &self.labels, &LABEL_EXTENSIONS)?;
        let single = self.raster.is_file();
        info!("Converting detections for {} raster(s)", pairing.pairs.len());

        Ok(self.context.runner().run_pairs(
            self.name(),
            &pairing,
            "label",
            |(_, labels)| labels.display().to_string(),
            |(raster, labels)| {
                let output = output_for(&self.output, raster, single, "geojson")?;
                self.context.pipeline.detections_to_vector(raster, labels, &output)?;
                Ok(BatchReport::default())
            },
        ))
    }
}
