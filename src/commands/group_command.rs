//! Group-by-attribute bounding box command

use std::path::PathBuf;

use clap::ArgMatches;

use crate::commands::command_traits::Command;
use crate::commands::required_path;
use crate::errors::{GeoLabelError, Result};
use crate::pipeline::{BatchReport, ConversionPipeline, UnitOutcome};

/// Command dissolving features into one rectangle per attribute value
pub struct GroupCommand {
    input: PathBuf,
    /// Attribute to group by
    field: String,
    output: PathBuf,
}

impl GroupCommand {
    /// Create a new group command
    ///
    /// # Arguments
    /// * `args` - Subcommand argument matches from clap
    pub fn new(args: &ArgMatches) -> Result<Self> {
        let field = args
            .get_one::<String>("field")
            .cloned()
            .ok_or_else(|| GeoLabelError::InvalidArgument("missing --field".to_string()))?;
        Ok(GroupCommand {
            input: required_path(args, "input")?,
            field,
            output: required_path(args, "output")?,
        })
    }
}

impl Command for GroupCommand {
    fn name(&self) -> &'static str {
        "group"
    }

    fn execute(&self) -> Result<BatchReport> {
        let groups = ConversionPipeline::default().group(&self.input, &self.field, &self.output)?;
        println!("Wrote {} group box(es) to {}", groups, self.output.display());

        let mut report = BatchReport::new(self.name());
        report.push(UnitOutcome::succeeded(self.input.display().to_string()));
        Ok(report)
    }
}
