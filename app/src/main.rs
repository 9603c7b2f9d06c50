use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fb_history_core::importer::ImportSummary;
use fb_history_core::models::{ArchiveStats, ImportStateRow};
use fb_history_core::query::{archive_stats, import_state};
use fb_history_core::{
    diagnostics, open_store, spawn_import, ArchiveLayout, CoreError, ImportEvent, ImportOptions, ImportOutcome,
    Store, StoreOptions,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fb-history", about = "Import a Facebook data export into a local history store")]
struct Cli {
    /// Where the store lives; falls back to FB_HISTORY_DATA_DIR, then ./fb-history-data.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Erase the store and rebuild it from an export folder.
    Import {
        export: PathBuf,
        #[arg(long, default_value_t = fb_history_core::config::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Print the last import and row counts as JSON.
    Status,
    /// Drop all imported data and copied photos.
    Erase,
}

#[derive(Debug, Serialize)]
struct Status {
    imported: Option<ImportStateRow>,
    stats: ArchiveStats,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let layout = ArchiveLayout::resolve(cli.data_dir.as_deref());
    let log_dir = layout.logs_dir();
    match run(cli.command, &layout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = diagnostics::log_event(&log_dir, "error", &err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, layout: &ArchiveLayout) -> Result<(), String> {
    let store = open_store(layout, &StoreOptions::default()).map_err(|e| e.to_string())?;
    let log_dir = layout.logs_dir();
    match command {
        Command::Import { export, batch_size } => {
            let summary = import(Arc::new(store), &export, batch_size, &log_dir)?;
            if let Some(summary) = summary {
                println!("{}", serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?);
            }
            Ok(())
        }
        Command::Status => {
            let status = status(&store).map_err(|e| e.to_string())?;
            println!("{}", serde_json::to_string_pretty(&status).map_err(|e| e.to_string())?);
            Ok(())
        }
        Command::Erase => {
            store.erase().map_err(|e| e.to_string())?;
            let _ = diagnostics::log_event(&log_dir, "erase", "store erased");
            println!("erased {}", layout.data_dir.display());
            Ok(())
        }
    }
}

fn import(store: Arc<Store>, export: &Path, batch_size: usize, log_dir: &Path) -> Result<Option<ImportSummary>, String> {
    let _ = diagnostics::log_event(log_dir, "import_start", &format!("import requested from {}", export.display()));
    let session = spawn_import(store, export.to_path_buf(), ImportOptions { batch_size });
    let cancel = session.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("cancelling after the current batch...");
        cancel.cancel();
    })
    .map_err(|e| e.to_string())?;

    let mut finished = None;
    let mut last_phase = None;
    for event in session.events.iter() {
        match event {
            ImportEvent::Progress(progress) => {
                if last_phase != Some(progress.phase) {
                    last_phase = Some(progress.phase);
                    eprintln!("{:>5.1}% {}", progress.overall_fraction() * 100.0, progress.phase.label());
                }
                tracing::debug!(
                    threads = progress.completed_threads,
                    total_threads = progress.total_threads,
                    messages = progress.total_messages,
                    "progress"
                );
            }
            ImportEvent::Finished(result) => finished = Some(result),
        }
    }
    session.wait().map_err(|e| e.to_string())?;

    match finished {
        Some(Ok(ImportOutcome::Completed(summary))) => {
            let _ = diagnostics::log_event(
                log_dir,
                "import_success",
                &format!("{} threads, {} messages", summary.thread_count, summary.message_count),
            );
            Ok(Some(summary))
        }
        Some(Ok(ImportOutcome::Cancelled)) => {
            let _ = diagnostics::log_event(log_dir, "import_cancelled", "import cancelled");
            eprintln!("import cancelled; the store holds a partial import");
            Ok(None)
        }
        Some(Err(err)) => {
            let _ = diagnostics::log_event(log_dir, "import_error", &err);
            Err(err)
        }
        None => Err("import ended without a result".to_string()),
    }
}

fn status(store: &Store) -> Result<Status, CoreError> {
    let conn = store.reader()?;
    Ok(Status {
        imported: import_state(&conn)?,
        stats: archive_stats(&conn)?,
    })
}
