//! Training export command
//!
//! Pairs rasters with vector files by stem and writes, per pair, a
//! normalized PNG and a label file with one annotation per feature.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{ensure_dir, required_path, CommandContext};
use crate::errors::Result;
use crate::pipeline::batch::{RASTER_EXTENSIONS, VECTOR_EXTENSIONS};
use crate::pipeline::{file_stem_of, pair_by_stem, BatchReport};

/// Command for exporting image/label pairs
pub struct AnnotateCommand<'a> {
    /// Raster file or directory
    raster: PathBuf,
    /// GeoJSON file or directory
    vector: PathBuf,
    /// Directory receiving the PNG images
    images: PathBuf,
    /// Directory receiving the label files
    labels: PathBuf,
    context: CommandContext<'a>,
}

impl<'a> AnnotateCommand<'a> {
    /// Create a new annotate command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    /// * `context` - Shared run settings
    pub fn new(args: &ArgMatches, mut context: CommandContext<'a>) -> Result<Self> {
        if let Ok(Some(field)) = args.try_get_one::<String>("class-field") {
            context.pipeline = context.pipeline.with_class_field(Some(field.clone()));
        }
        if matches!(args.try_get_one::<bool>("clamp"), Ok(Some(true))) {
            context.pipeline = context.pipeline.with_clamp(true);
        }
        if let Ok(Some(threshold)) = args.try_get_one::<f64>("nodata-threshold") {
            context.pipeline = context.pipeline.with_nodata_threshold(*threshold);
        }

        Ok(AnnotateCommand {
            raster: required_path(args, "raster")?,
            vector: required_path(args, "vector")?,
            images: required_path(args, "images")?,
            labels: required_path(args, "labels")?,
            context,
        })
    }
}

impl Command for AnnotateCommand<'_> {
    fn name(&self) -> &'static str {
        "annotate"
    }

    fn execute(&self) -> Result<BatchReport> {
        let pairing = pair_by_stem(&self.raster, &RASTER_EXTENSIONS, &self.vector, &VECTOR_EXTENSIONS)?;
        ensure_dir(&self.images)?;
        ensure_dir(&self.labels)?;
        info!("Exporting {} raster/vector pair(s)", pairing.pairs.len());

        Ok(self.context.runner().run_pairs(
            self.name(),
            &pairing,
            "vector",
            |(raster, _)| raster.display().to_string(),
            |(raster, vector)| {
                let stem = file_stem_of(raster)?;
                let image_out = self.images.join(format!("{}.png", stem));
                let label_out = self.labels.join(format!("{}.txt", stem));
                self.context
                    .pipeline
                    .export_training(raster, vector, &image_out, &label_out)?;
                Ok(BatchReport::default())
            },
        ))
    }
}
