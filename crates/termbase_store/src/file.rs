//! File-based store for persistent catalogs.

use crate::connection::Connection;
use crate::error::StoreResult;
use crate::memory::TableData;
use crate::row::Row;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A file-based row store.
///
/// Each table is a JSON array of row objects stored at `<dir>/<table>.json`.
/// Data survives process restarts.
///
/// # Durability
///
/// Writes go to a sibling temporary file which is then renamed over the
/// table file, so a crash never leaves a half-written table behind.
///
/// # Thread Safety
///
/// Read-modify-write cycles are serialized by an internal lock. Concurrent
/// writers in other processes are not coordinated.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a directory.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        let meta = fs::metadata(dir)?;
        if !meta.is_dir() {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a directory", dir.display()),
            )
            .into());
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Opens a store, creating the directory and its parents if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_create_dirs(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Self::open(dir)
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }

    fn read_table(&self, table: &str) -> StoreResult<Vec<Row>> {
        match fs::read(self.table_path(table)) {
            Ok(content) => Ok(serde_json::from_slice(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_table(&self, table: &str, rows: &[Row]) -> StoreResult<()> {
        let path = self.table_path(table);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(rows)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl Connection for FileStore {
    fn find_all(&self, table: &str) -> StoreResult<Vec<Row>> {
        self.read_table(table)
    }

    fn batch_update(&self, table: &str, patches: &[Row]) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut data = TableData::from_rows(self.read_table(table)?);
        data.apply_update(table, patches)?;
        self.write_table(table, data.rows())?;
        tracing::debug!(table, rows = patches.len(), "file store batch update");
        Ok(())
    }

    fn batch_create(&self, table: &str, rows: &[Row]) -> StoreResult<Vec<i64>> {
        let _guard = self.write_lock.lock();
        let mut data = TableData::from_rows(self.read_table(table)?);
        let ids = data.apply_create(table, rows)?;
        self.write_table(table, data.rows())?;
        tracing::debug!(table, rows = rows.len(), "file store batch create");
        Ok(ids)
    }
}
