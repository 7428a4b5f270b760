//! CLI command definitions for project-tracker
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod export;
pub mod import;
pub mod report;

use crate::config::Config;
use clap::{Parser, Subcommand};
use export::ExportArgs;
use import::ImportArgs;
use report::ReportArgs;
use std::path::PathBuf;

/// Project tracker REST server and data tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Interface to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Do not insert sample data into a fresh database
    #[arg(long, global = true)]
    pub no_seed: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply command-line overrides, the highest configuration tier.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(db_path) = &self.database {
            config.server.db_path = db_path.clone();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_seed {
            config.server.seed_sample_data = false;
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the REST server (default if no subcommand given)
    Serve,

    /// Export all projects to a JSON snapshot
    Export(ExportArgs),

    /// Import projects from a JSON snapshot
    Import(ImportArgs),

    /// Write the HTML portfolio report
    Report(ReportArgs),
}
