//! Command-line entry point for the design-space explorer.

use anyhow::Result;
use archdse_driver::cli::{run_cli, Cli};
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
