pub mod config;
pub mod db;
pub mod diagnostics;
pub mod discovery;
pub mod encoding;
pub mod error;
pub mod importer;
pub mod merge;
pub mod models;
pub mod query;
pub mod raw;
pub mod records;
mod migrations;

pub use config::{ArchiveLayout, ImportOptions, StoreOptions};
pub use db::{open_store, Store};
pub use error::CoreError;
pub use importer::{run_import, spawn_import, CancelToken, ImportEvent, ImportOutcome, ImportProgress};
