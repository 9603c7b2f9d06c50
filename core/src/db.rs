use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags, Transaction};

use crate::config::{ArchiveLayout, StoreOptions};
use crate::error::CoreError;
use crate::migrations::MIGRATIONS;

pub type ReadConnection = PooledConnection<SqliteConnectionManager>;

/// The local history store.
///
/// Writes are serialized through a single connection behind a mutex; every
/// write runs inside one transaction. Reads go through a bounded pool of
/// read-only connections and never contend for the writer.
pub struct Store {
    pub path: PathBuf,
    photos_dir: PathBuf,
    writer: Mutex<Connection>,
    readers: Pool<SqliteConnectionManager>,
}

pub fn open_store(layout: &ArchiveLayout, options: &StoreOptions) -> Result<Store, CoreError> {
    options.validate()?;
    layout.ensure_dirs()?;
    let path = layout.database_path();

    let conn = Connection::open(&path)?;
    conn.busy_timeout(options.busy_timeout)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL; \
         PRAGMA synchronous = NORMAL; \
         PRAGMA foreign_keys = ON; \
         PRAGMA journal_size_limit = 67108864; \
         PRAGMA temp_store = MEMORY;",
    )?;
    apply_migrations(&conn)?;

    let busy_timeout = options.busy_timeout;
    let manager = SqliteConnectionManager::file(&path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
        .with_init(move |c| {
            c.busy_timeout(busy_timeout)?;
            c.execute_batch("PRAGMA query_only = ON;")
        });
    let readers = Pool::builder()
        .max_size(options.reader_pool_size)
        .build(manager)?;

    Ok(Store {
        path,
        photos_dir: layout.photos_dir(),
        writer: Mutex::new(conn),
        readers,
    })
}

impl Store {
    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    /// Runs `f` inside a write transaction, committing only when it succeeds.
    pub fn write<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&Transaction) -> Result<T, CoreError>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|_| CoreError::StoreUnavailable("writer lock poisoned".to_string()))?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn reader(&self) -> Result<ReadConnection, CoreError> {
        Ok(self.readers.get()?)
    }

    /// Drops every table, re-runs the migrations and deletes copied photo assets.
    pub fn erase(&self) -> Result<(), CoreError> {
        {
            let conn = self
                .writer
                .lock()
                .map_err(|_| CoreError::StoreUnavailable("writer lock poisoned".to_string()))?;
            erase_schema(&conn)?;
        }
        clear_dir(&self.photos_dir)?;
        tracing::info!(path = %self.path.display(), "store erased");
        Ok(())
    }
}

pub fn apply_migrations(conn: &Connection) -> Result<(), CoreError> {
    let current_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let mut version = current_version as usize;
    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let next_version = idx + 1;
        if next_version <= version {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {};", next_version))?;
        version = next_version;
    }
    Ok(())
}

pub fn erase_schema(conn: &Connection) -> Result<(), CoreError> {
    let tables: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%';",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    for table in &tables {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\";", table.replace('"', "\"\"")))?;
    }
    conn.execute_batch("PRAGMA user_version = 0; PRAGMA foreign_keys = ON;")?;
    apply_migrations(conn)
}

fn clear_dir(dir: &Path) -> Result<(), CoreError> {
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
    } else {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
