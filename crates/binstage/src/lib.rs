//! binstage command-line interface
//!
//! Thin layer over [`binstage_core`]: argument parsing, manifest selection,
//! report rendering and exit-code mapping.

pub mod cli;
pub mod commands;
pub mod tracing;
