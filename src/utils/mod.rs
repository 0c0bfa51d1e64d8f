//! Utility modules for common functionality
//!
//! Run logging and progress reporting shared by the commands.

pub mod logger;
pub mod progress;

pub use logger::Logger;
pub use progress::ProgressTracker;
