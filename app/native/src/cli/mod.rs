//! CLI module for Backdrop.
//!
//! Parses the command line, sets up logging and runs the redraw session.

mod commands;

use clap::Parser;
pub use commands::{Cli, Settings};

use crate::error::BackdropError;
use crate::logging;

/// Runs the CLI.
///
/// Parses command-line arguments and executes them. Invalid arguments, as
/// well as `--help` and `--version`, are handled by clap and exit directly.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), BackdropError> {
    let cli = Cli::parse();
    logging::init(cli.verbosity());
    cli.execute()
}
