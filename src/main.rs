//! Project Tracker server
//!
//! Serves the REST API by default; `export`, `import` and `report` work on
//! the configured database directly.

use anyhow::Result;
use clap::Parser;
use project_tracker::cli::export::ExportArgs;
use project_tracker::cli::import::ImportArgs;
use project_tracker::cli::report::ReportArgs;
use project_tracker::cli::{Cli, Command};
use project_tracker::config::{Config, ConfigLoader};
use project_tracker::db::Database;
use project_tracker::db::snapshot::Snapshot;
use project_tracker::logging::{LogTarget, init_logging};
use project_tracker::report::render_html_report;
use project_tracker::server::{AppState, start_server};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut loader = ConfigLoader::load(cli.config.clone())?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Configuration loaded");
    }
    cli.apply_overrides(loader.config_mut());
    let config = loader.into_config();

    match cli.command {
        Some(Command::Export(args)) => run_export(&config, args)?,
        Some(Command::Import(args)) => run_import(&config, args)?,
        Some(Command::Report(args)) => run_report(&config, args)?,
        Some(Command::Serve) | None => run_server(config).await?,
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!(path = %config.server.db_path.display(), "Database opened");
    Ok(db)
}

/// Run the REST server until Ctrl-C.
async fn run_server(config: Config) -> Result<()> {
    let db = open_database(&config)?;

    if config.server.seed_sample_data {
        db.seed_sample_data()?;
    }
    if config.server.reconcile_progress_on_start {
        let count = db.recalculate_all_progress()?;
        info!(projects = count, "Project progress reconciled");
    }

    let state = AppState::new(Arc::new(db));
    let (shutdown_tx, addr, server) =
        start_server(state, &config.bind_address(), &config.server.cors).await?;
    info!("API available at http://{}/api", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
    server.await?;
    info!("Server stopped");

    Ok(())
}

/// Run the export command
fn run_export(config: &Config, args: ExportArgs) -> Result<()> {
    let db = open_database(config)?;
    let snapshot = db.export_snapshot()?;
    let gzip = args.should_compress();

    match args.output {
        Some(ref path) => {
            let file = std::fs::File::create(path)?;
            snapshot.write_to(file, gzip)?;
            eprintln!(
                "Exported {} projects to {}{}",
                snapshot.projects.len(),
                path.display(),
                if gzip { " (gzipped)" } else { "" }
            );
        }
        None => {
            let stdout = std::io::stdout();
            snapshot.write_to(stdout.lock(), gzip)?;
        }
    }

    Ok(())
}

/// Run the import command
fn run_import(config: &Config, args: ImportArgs) -> Result<()> {
    let snapshot = Snapshot::from_file(&args.file)?;
    let db = open_database(config)?;

    info!(mode = args.import_mode(), file = %args.file.display(), "Importing snapshot");
    let summary = db.import_snapshot(&snapshot, args.replace)?;

    println!("Import complete:");
    println!("  Mode: {}", args.import_mode());
    if args.replace {
        println!("  Projects deleted: {}", summary.projects_deleted);
    }
    println!("  Projects imported: {}", summary.projects_imported);
    println!("  Tasks imported: {}", summary.tasks_imported);
    println!("  Subtasks imported: {}", summary.subtasks_imported);
    if summary.rows_skipped > 0 {
        println!("  Rows skipped (already present): {}", summary.rows_skipped);
    }

    Ok(())
}

/// Run the report command
fn run_report(config: &Config, args: ReportArgs) -> Result<()> {
    let db = open_database(config)?;
    let now = chrono::Utc::now();
    let projects = db.list_projects()?;
    let stats = db.dashboard_stats(now.date_naive())?;
    let html = render_html_report(
        &projects,
        &stats,
        &now.format("%Y-%m-%d %H:%M UTC").to_string(),
    );

    match args.output {
        Some(ref path) => {
            std::fs::write(path, html)?;
            eprintln!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
