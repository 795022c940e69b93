//! On-disk storage for uploaded documents.
//!
//! Files live flat under one root directory, named by
//! [`clinic_core::document::stored_file_name`]. The database row is the
//! source of truth for ownership; this module only moves bytes.

use std::{
  io,
  path::{Path, PathBuf},
};

use tokio::io::{AsyncWrite, AsyncWriteExt as _};

#[derive(Debug, Clone)]
pub struct DocumentFiles {
  root: PathBuf,
}

impl DocumentFiles {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// Create the root directory if it does not exist yet.
  pub async fn ensure_root(&self) -> io::Result<()> { tokio::fs::create_dir_all(&self.root).await }

  fn path(&self, stored_name: &str) -> PathBuf { self.root.join(stored_name) }

  /// Write a new file. Fails with [`io::ErrorKind::AlreadyExists`] rather
  /// than overwrite an existing upload. A failed write leaves nothing behind.
  pub async fn write_new(&self, stored_name: &str, bytes: &[u8]) -> io::Result<()> {
    let path = self.path(stored_name);
    let file = tokio::fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&path)
      .await?;
    fill_or_discard(file, &path, bytes).await
  }

  /// Size in bytes, or `None` if the file is missing.
  pub async fn size(&self, stored_name: &str) -> Option<u64> {
    tokio::fs::metadata(self.path(stored_name))
      .await
      .ok()
      .map(|m| m.len())
  }

  /// Full contents, or `None` if the file is missing.
  pub async fn read(&self, stored_name: &str) -> io::Result<Option<Vec<u8>>> {
    match tokio::fs::read(self.path(stored_name)).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// Remove a file. Returns `false` if it was already gone.
  pub async fn remove(&self, stored_name: &str) -> io::Result<bool> {
    match tokio::fs::remove_file(self.path(stored_name)).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e),
    }
  }
}

/// Write `bytes` through `writer`, which was just created at `path`. On
/// failure the partial file is removed before the error is returned.
async fn fill_or_discard<W>(mut writer: W, path: &Path, bytes: &[u8]) -> io::Result<()>
where
  W: AsyncWrite + Unpin,
{
  let written = async {
    writer.write_all(bytes).await?;
    writer.flush().await
  }
  .await;
  let Err(e) = written else {
    return Ok(());
  };

  drop(writer);
  if let Err(cleanup) = tokio::fs::remove_file(path).await {
    tracing::warn!(path = %path.display(), error = %cleanup, "could not remove partial upload");
  }
  Err(e)
}

/// Render a byte count as megabytes with two decimals, e.g. `"1.50 MB"`.
pub fn format_size(bytes: u64) -> String {
  format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}
