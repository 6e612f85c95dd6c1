//! Filesystem helpers shared across modules.
//!
//! These helpers attach the operation and path to IO errors and keep the
//! JSON read/write conventions of the on-disk stores in one place.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Convert an IO error into an application error with operation + path context.
pub fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::io_path(op, path, source)
}

/// Ensure a directory exists, creating it (recursively) if needed.
pub async fn ensure_dir_all_with_op(op: &'static str, path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| io_error(op, path, e))
}

/// Ensure the parent directory of a file path exists.
pub async fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    ensure_dir_all_with_op("creating directory", parent).await
}

/// Read a UTF-8 file with a custom operation label.
pub async fn read_to_string_with_op(op: &'static str, path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io_error(op, path, e))
}

/// Write `contents` to `path`, creating parent directories first.
pub async fn write_with_op(op: &'static str, path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dir(path).await?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| io_error(op, path, e))
}

/// Serialize `value` as pretty JSON and write it to `path`.
pub async fn write_json<T: Serialize>(op: &'static str, path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_with_op(op, path, &data).await
}

/// Read and deserialize a JSON document.
pub async fn read_json<T: DeserializeOwned>(op: &'static str, path: &Path) -> Result<T> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| io_error(op, path, e))?;
    Ok(serde_json::from_slice(&data)?)
}

/// Whether a path exists. Permission errors count as absent.
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
