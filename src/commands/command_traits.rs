//! Command pattern interfaces
//!
//! This module defines the core Command pattern interfaces
//! for the CLI application, enabling a clean separation of concerns.

use crate::errors::Result;
use crate::pipeline::BatchReport;
use crate::utils::logger::Logger;

/// Represents an executable command in the application
///
/// Command objects encapsulate the logic for a specific CLI operation,
/// allowing for separation of concerns and better testability.
pub trait Command {
    /// Subcommand name, used to label the report
    fn name(&self) -> &'static str;

    /// Execute the command
    ///
    /// # Returns
    /// The report over every unit processed. Unit failures are recorded in
    /// the report; an `Err` means the command could not run at all.
    fn execute(&self) -> Result<BatchReport>;
}

/// Factory for creating commands from CLI arguments
///
/// This trait defines the interface for command factories
/// which can parse CLI arguments and create the appropriate Command.
pub trait CommandFactory<'a> {
    /// Create a new Command instance based on CLI arguments
    ///
    /// # Arguments
    /// * `args` - Top-level CLI argument matches from clap
    /// * `logger` - Run log receiving one line per unit
    ///
    /// # Returns
    /// A command that implements the Command trait, or an error
    fn create_command(&self, args: &clap::ArgMatches, logger: &'a Logger) -> Result<Box<dyn Command + 'a>>;
}
