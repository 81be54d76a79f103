//! Core library entry for the `fleetfix` CLI.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod ports;
pub mod reconcile;
pub mod record;
pub mod seed;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
