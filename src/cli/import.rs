//! Import subcommand for project-tracker CLI

use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Snapshot file to import (plain or gzipped JSON)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Delete all existing projects before importing
    ///
    /// Without this flag, rows whose id already exists are skipped.
    #[arg(long)]
    pub replace: bool,
}

impl ImportArgs {
    /// Describe the import mode for logging
    pub fn import_mode(&self) -> &'static str {
        if self.replace { "replace" } else { "merge-skip" }
    }
}
