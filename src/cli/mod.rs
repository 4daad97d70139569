//! Command-line interface (feature `cli`)

pub mod commands;
pub mod error;

pub use error::CliError;
