//! Streaming writes into the cache
//!
//! A `CacheWriter` appends bytes to a temporary file under `tmp/` while
//! hashing them. `commit` moves the content into place, records the key in
//! the index and resolves the writer's finalized future.

use blake3::Hasher;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use stow_core::error::StowError;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tracing::debug;

use super::store::content_path;
use super::{CasIndex, ContentHash, IndexEntry, Integrity};
use crate::CacheResult;

/// Options recognized by the cache writer
///
/// Unknown fields are ignored when deserializing, so option objects can be
/// forwarded without knowing every consumer's keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Arbitrary JSON attached to the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Expected byte count of the written content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Expected integrity of the written content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Integrity>,
}

impl WriteOptions {
    /// Attach metadata to the entry
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Require the written content to have this many bytes
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Require the written content to hash to this integrity
    pub fn with_integrity(mut self, integrity: Integrity) -> Self {
        self.integrity = Some(integrity);
        self
    }
}

/// Writable handle for one cache entry
#[derive(Debug)]
pub struct CacheWriter {
    key: String,
    options: WriteOptions,
    file: File,
    /// Deleted on drop unless persisted by `commit`
    temp_path: TempPath,
    hasher: Hasher,
    written: u64,
    content_root: Utf8PathBuf,
    index: Arc<CasIndex>,
    finalized_tx: Option<oneshot::Sender<Integrity>>,
    finalized_rx: Option<oneshot::Receiver<Integrity>>,
}

impl CacheWriter {
    pub(crate) fn create(
        key: String,
        options: WriteOptions,
        tmp_dir: &Utf8Path,
        content_root: Utf8PathBuf,
        index: Arc<CasIndex>,
    ) -> CacheResult<Self> {
        let temp_file = tempfile::Builder::new()
            .prefix("write-")
            .tempfile_in(tmp_dir)
            .map_err(|e| StowError::io(format!("Failed to create temporary file in {}", tmp_dir), e))?;
        let (std_file, temp_path) = temp_file.into_parts();
        let (finalized_tx, finalized_rx) = oneshot::channel();

        debug!("Opened cache writer for '{}' at {}", key, temp_path.display());

        Ok(Self {
            key,
            options,
            file: File::from_std(std_file),
            temp_path,
            hasher: Hasher::new(),
            written: 0,
            content_root,
            index,
            finalized_tx: Some(finalized_tx),
            finalized_rx: Some(finalized_rx),
        })
    }

    /// Key this writer stores under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Future resolving to the integrity once `commit` has hashed the content
    ///
    /// Resolves to `WriteAborted` if the writer is dropped or fails before
    /// committing. Only the first call observes the result.
    pub fn finalized(&mut self) -> impl Future<Output = CacheResult<Integrity>> + Send + 'static {
        let receiver = self.finalized_rx.take();
        let key = self.key.clone();
        async move {
            match receiver {
                Some(receiver) => receiver.await.map_err(|_| StowError::WriteAborted { key }),
                None => Err(StowError::WriteAborted { key }),
            }
        }
    }

    /// Append bytes to the entry
    pub async fn write_all(&mut self, buf: &[u8]) -> CacheResult<()> {
        self.file
            .write_all(buf)
            .await
            .map_err(|e| StowError::io(format!("Failed to write cache content for '{}'", self.key), e))?;
        self.hasher.update(buf);
        self.written += buf.len() as u64;
        Ok(())
    }

    /// Finish the write and record the entry under its key
    pub async fn commit(self) -> CacheResult<Integrity> {
        let CacheWriter {
            key,
            options,
            mut file,
            temp_path,
            hasher,
            written,
            content_root,
            index,
            finalized_tx,
            ..
        } = self;

        file.flush()
            .await
            .map_err(|e| StowError::io(format!("Failed to flush cache content for '{}'", key), e))?;
        file.sync_all()
            .await
            .map_err(|e| StowError::io(format!("Failed to sync cache content for '{}'", key), e))?;
        drop(file);

        let integrity = Integrity::new(ContentHash::new(*hasher.finalize().as_bytes()));

        if let Some(expected) = options.size {
            if expected != written {
                return Err(StowError::SizeMismatch {
                    key,
                    expected,
                    actual: written,
                });
            }
        }

        if let Some(expected) = options.integrity {
            if expected != integrity {
                return Err(StowError::IntegrityFailure {
                    subject: key,
                    expected: expected.to_string(),
                    actual: integrity.to_string(),
                });
            }
        }

        let destination = content_path(&content_root, integrity.hash());
        if destination.exists() {
            debug!("Content {} already stored, reusing it", integrity);
            drop(temp_path);
        } else {
            if let Some(parent) = destination.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StowError::io("Failed to create content directory".to_string(), e))?;
            }
            temp_path
                .persist(&destination)
                .map_err(|e| StowError::io(format!("Failed to move content into {}", destination), e.error))?;
        }

        index
            .insert(IndexEntry::new(key.clone(), integrity, written, options.metadata))
            .await?;

        debug!("Committed '{}' as {} ({} bytes)", key, integrity, written);

        if let Some(finalized_tx) = finalized_tx {
            // Nobody listening is fine
            let _ = finalized_tx.send(integrity);
        }

        Ok(integrity)
    }
}
