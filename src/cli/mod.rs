//! CLI argument parsing module
//!
//! This module handles command-line argument parsing and application entry point.

use crate::exit_code::exit_code_for_error;
use crate::i18n::localize_error;
use crate::logging;
use crate::output::OutputWriter;

pub mod args;
pub mod runner;

pub use args::create_app;

/// Main entry point for the CLI application
pub fn run() {
    let matches = create_app().get_matches();
    logging::init(matches.get_flag("verbose"));
    let output = OutputWriter::new(args::output_config(&matches));

    match runner::run_with_args(&matches) {
        Ok(()) => {}
        Err(e) => {
            output.write_error(&localize_error(&e));
            std::process::exit(exit_code_for_error(&e));
        }
    }
}
