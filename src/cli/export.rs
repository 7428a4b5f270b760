//! Export subcommand for project-tracker CLI
//!
//! Writes every project, with tasks and subtasks inline, as a JSON snapshot
//! that can be re-imported.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Force gzip compression (auto-detected from .gz extension otherwise)
    #[arg(long)]
    pub gzip: bool,
}

impl ExportArgs {
    /// Determine if output should be compressed based on args and filename
    pub fn should_compress(&self) -> bool {
        self.gzip
            || self
                .output
                .as_ref()
                .is_some_and(|path| path.extension().is_some_and(|ext| ext == "gz"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_compress() {
        let args = ExportArgs {
            output: None,
            gzip: true,
        };
        assert!(args.should_compress());

        let args = ExportArgs {
            output: Some(PathBuf::from("portfolio.json.gz")),
            gzip: false,
        };
        assert!(args.should_compress());

        let args = ExportArgs {
            output: Some(PathBuf::from("portfolio.json")),
            gzip: false,
        };
        assert!(!args.should_compress());
    }
}
