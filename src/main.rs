//! hot-import - keep a data file hot and print every reload.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    hot_import::logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Watch { args } => cli::watch::run(args),
    }
}
