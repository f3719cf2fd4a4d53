//! JSON snapshots of source output.
//!
//! When backup is enabled, every source's loaded entries are written to
//! `<dictPath>/<filename>` as indented JSON during a pass. The same files
//! can be read back with [`load_file`], which is how file-based sources
//! replay a snapshot.

use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Indentation used for backup files.
const INDENT: &[u8] = b" ";

/// Serializes `value` as indented JSON to `dir/filename`.
///
/// Returns the full path written.
///
/// # Errors
///
/// Returns [`CoreError::Json`] if the value cannot be encoded and
/// [`CoreError::Backup`] if the file cannot be written.
pub fn save_file<T: Serialize + ?Sized>(value: &T, dir: &Path, filename: &str) -> CoreResult<PathBuf> {
    let path = dir.join(filename);

    let mut content = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
    value.serialize(&mut serializer)?;

    fs::write(&path, content).map_err(|source| CoreError::Backup {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Reads a JSON value back from `dir/filename`.
///
/// # Errors
///
/// Returns [`CoreError::Backup`] if the file cannot be read and
/// [`CoreError::Json`] if it does not decode as `T`.
pub fn load_file<T: DeserializeOwned>(dir: &Path, filename: &str) -> CoreResult<T> {
    load_path(&dir.join(filename))
}

/// Reads a JSON value back from a full path.
///
/// # Errors
///
/// Same as [`load_file`].
pub fn load_path<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    let content = fs::read(path).map_err(|source| CoreError::Backup {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&content)?)
}
