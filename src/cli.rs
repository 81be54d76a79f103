//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `fleetfix`.
#[derive(Debug, Parser)]
#[command(name = "fleetfix", version, about = "Reconcile terminal records in a fleet document store")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring every terminal record into canonical shape.
    Reconcile {
        /// Print the planned updates without writing them.
        #[arg(long)]
        dry_run: bool,
        /// Collection to process instead of the configured default.
        #[arg(long)]
        collection: Option<String>,
    },
    /// Assign sample QR image URLs to terminal records.
    Seed {
        /// Print the planned updates without writing them.
        #[arg(long)]
        dry_run: bool,
        /// Collection to process instead of the configured default.
        #[arg(long)]
        collection: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_reconcile_subcommand() {
        let cli = Cli::parse_from(["fleetfix", "reconcile"]);
        assert!(matches!(cli.command, Command::Reconcile { dry_run: false, .. }));
    }

    #[test]
    fn parses_reconcile_dry_run() {
        let cli = Cli::parse_from(["fleetfix", "reconcile", "--dry-run"]);
        assert!(matches!(cli.command, Command::Reconcile { dry_run: true, .. }));
    }

    #[test]
    fn parses_seed_with_collection_override() {
        let cli = Cli::parse_from(["fleetfix", "seed", "--collection", "terminals_staging"]);
        match cli.command {
            Command::Seed { collection: Some(c), .. } => assert_eq!(c, "terminals_staging"),
            other => panic!("unexpected parse: {other:?}"),
        }
    }
}
