//! CLI command implementations
//!
//! This module contains implementations of various commands
//! supported by the CLI application using the Command pattern.

pub mod annotate_command;
pub mod clip_command;
pub mod command_traits;
pub mod detections_command;
pub mod draw_command;
pub mod group_command;
pub mod info_command;
pub mod normalize_command;
pub mod tile_command;

pub use annotate_command::AnnotateCommand;
pub use clip_command::ClipCommand;
pub use command_traits::{Command, CommandFactory};
pub use detections_command::DetectionsCommand;
pub use draw_command::DrawCommand;
pub use group_command::GroupCommand;
pub use info_command::InfoCommand;
pub use normalize_command::NormalizeCommand;
pub use tile_command::TileCommand;

use std::fs;
use std::path::{Path, PathBuf};

use clap::ArgMatches;

use crate::compression::Compression;
use crate::config::Config;
use crate::errors::{GeoLabelError, Result};
use crate::pipeline::{file_stem_of, BatchRunner, ConversionPipeline};
use crate::utils::logger::Logger;

/// Settings shared by every command of one run
pub struct CommandContext<'a> {
    pub pipeline: ConversionPipeline,
    pub parallel: bool,
    pub show_progress: bool,
    pub logger: &'a Logger,
}

impl<'a> CommandContext<'a> {
    /// Batch runner honoring the parallel and progress settings
    pub fn runner(&self) -> BatchRunner<'a> {
        BatchRunner::new(self.parallel, self.logger).show_progress(self.show_progress)
    }
}

/// Factory for creating command instances based on CLI arguments
///
/// The factory owns the loaded configuration; subcommand flags override
/// configuration values when the command is created.
pub struct GeoLabelCommandFactory {
    config: Config,
    show_progress: bool,
}

impl GeoLabelCommandFactory {
    /// Create a new factory instance
    pub fn new(config: Config) -> Self {
        GeoLabelCommandFactory {
            config,
            show_progress: true,
        }
    }

    /// Enable or disable progress bars
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<'a> CommandFactory<'a> for GeoLabelCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> Result<Box<dyn Command + 'a>> {
        let (name, sub) = args
            .subcommand()
            .ok_or_else(|| GeoLabelError::InvalidArgument("no subcommand given".to_string()))?;

        let context = CommandContext {
            pipeline: ConversionPipeline::from_config(&self.config)?,
            parallel: self.config.batch.parallel && !matches!(sub.try_get_one::<bool>("sequential"), Ok(Some(true))),
            show_progress: self.show_progress,
            logger,
        };

        let command: Box<dyn Command + 'a> = match name {
            "info" => Box::new(InfoCommand::new(sub)?),
            "normalize" => Box::new(NormalizeCommand::new(sub, context)?),
            "annotate" => Box::new(AnnotateCommand::new(sub, context)?),
            "detections" => Box::new(DetectionsCommand::new(sub, context)?),
            "clip" => Box::new(ClipCommand::new(sub, context)?),
            "tile" => Box::new(TileCommand::new(sub, context)?),
            "draw" => Box::new(DrawCommand::new(sub, context)?),
            "group" => Box::new(GroupCommand::new(sub)?),
            other => {
                return Err(GeoLabelError::InvalidArgument(format!(
                    "unknown subcommand '{}'",
                    other
                )))
            }
        };
        Ok(command)
    }
}

/// Value of a required path argument
pub(crate) fn required_path(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| GeoLabelError::InvalidArgument(format!("missing --{}", name)))
}

/// `--compression` value, defaulting to none
pub(crate) fn compression_arg(args: &ArgMatches) -> Result<Compression> {
    match args.try_get_one::<String>("compression") {
        Ok(Some(name)) => name.parse::<Compression>().map_err(GeoLabelError::InvalidArgument),
        _ => Ok(Compression::None),
    }
}

/// Output file for one input
///
/// With a single input and an `output` carrying `extension`, `output` is
/// the file itself. Otherwise `output` is a directory and the file is
/// named after the input's stem.
pub(crate) fn output_for(output: &Path, input: &Path, single: bool, extension: &str) -> Result<PathBuf> {
    let names_file = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false);

    if single && names_file {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| GeoLabelError::io_at(parent, e))?;
        }
        return Ok(output.to_path_buf());
    }

    fs::create_dir_all(output).map_err(|e| GeoLabelError::io_at(output, e))?;
    Ok(output.join(format!("{}.{}", file_stem_of(input)?, extension)))
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| GeoLabelError::io_at(dir, e))
}
