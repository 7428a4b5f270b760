//! Report subcommand for project-tracker CLI

use clap::Args;
use std::path::PathBuf;

/// Arguments for the report subcommand
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output HTML file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
