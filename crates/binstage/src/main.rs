//! binstage CLI Application
//!
//! Stages prebuilt native libraries for a target platform into the
//! directories a host build expects, then reports what happened.

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

use binstage::cli::{self, EXIT_OK, exit_code_for, render_error};
use binstage::commands;
use binstage::tracing::{TracingConfig, TracingFormat};

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let json = cli.json;

    let config = TracingConfig {
        format: TracingFormat::for_output(json),
        level: cli.level.into(),
    };
    if let Err(e) = binstage::tracing::init_tracing(config) {
        eprintln!("Failed to initialize tracing: {e}");
    }

    match commands::execute(cli.command, json) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            std::process::exit(EXIT_OK);
        }
        Err(err) => {
            ::tracing::debug!(error = %err, "Command failed");
            render_error(&err, json);
            std::process::exit(exit_code_for(&err));
        }
    }
}
