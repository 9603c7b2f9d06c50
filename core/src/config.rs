use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;

pub const DATA_DIR_ENV: &str = "FB_HISTORY_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "fb-history-data";
const DATABASE_FILE: &str = "history.sqlite";
const PHOTOS_DIR: &str = "profile_photos";
const LOGS_DIR: &str = "logs";

pub const DEFAULT_BATCH_SIZE: usize = 8;
pub const DEFAULT_READER_POOL_SIZE: u32 = 5;

/// On-disk locations derived from a single data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub data_dir: PathBuf,
}

impl ArchiveLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Explicit directory first, then `FB_HISTORY_DATA_DIR`, then `./fb-history-data`.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(dir) = explicit {
            return Self::new(dir);
        }
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::new(DEFAULT_DATA_DIR),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn photos_dir(&self) -> PathBuf {
        self.data_dir.join(PHOTOS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join(LOGS_DIR)
    }

    pub fn ensure_dirs(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.photos_dir())?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Thread groups imported concurrently per batch in the messages phase.
    pub batch_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ImportOptions {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.batch_size == 0 {
            return Err(CoreError::InvalidArgument(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Upper bound on concurrently open read connections.
    pub reader_pool_size: u32,
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            reader_pool_size: DEFAULT_READER_POOL_SIZE,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreOptions {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.reader_pool_size == 0 {
            return Err(CoreError::InvalidArgument(
                "reader pool size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
