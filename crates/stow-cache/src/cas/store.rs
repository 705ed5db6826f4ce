//! CAS store implementation
//!
//! This module provides the main CasStore interface for
//! content-addressable storage operations.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use stow_config::{ConfigLoader, ResolvedConfig};
use stow_core::error::StowError;
use tracing::{debug, info};

use super::{CacheWriter, CasIndex, ContentHash, IndexEntry, Integrity, WriteOptions};
use crate::tarball::extract_tarball;
use crate::{join_error, CacheResult};

const CONTENT_DIR: &str = "content";
const TMP_DIR: &str = "tmp";
const INDEX_DIR: &str = "index";

/// Metadata for a stored entry, as returned by key lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Caller key
    pub key: String,
    /// Integrity of the stored content
    pub integrity: Integrity,
    /// Location of the content on disk
    pub path: Utf8PathBuf,
    /// Size in bytes
    pub size: u64,
    /// When the entry was stored (unix millis)
    pub time: i64,
    /// Caller metadata
    pub metadata: Option<Value>,
}

impl CacheEntry {
    fn from_index(entry: IndexEntry, path: Utf8PathBuf) -> Self {
        Self {
            key: entry.key,
            integrity: entry.integrity,
            path,
            size: entry.size,
            time: entry.time,
            metadata: entry.metadata,
        }
    }
}

/// Content-addressable storage
#[derive(Debug)]
pub struct CasStore {
    /// Root directory for storage (~/.stow/cache)
    root_path: Utf8PathBuf,
    /// Key index
    index: Arc<CasIndex>,
}

/// Storage path for a hash: `content/ab/cd/abcd...`
pub(crate) fn content_path(content_root: &Utf8Path, hash: &ContentHash) -> Utf8PathBuf {
    let hex = hash.to_hex();
    content_root.join(&hex[0..2]).join(&hex[2..4]).join(&hex)
}

impl CasStore {
    /// Create a new CAS store
    pub fn new<P: AsRef<Utf8Path>>(root_path: P) -> CacheResult<Self> {
        let root_path = root_path.as_ref().to_path_buf();

        for dir in [CONTENT_DIR, TMP_DIR] {
            fs::create_dir_all(root_path.join(dir))
                .map_err(|e| StowError::io(format!("Failed to create store directory {}", root_path), e))?;
        }

        let index = Arc::new(CasIndex::open(root_path.join(INDEX_DIR))?);

        debug!("Opened cache store at {}", root_path);

        Ok(Self { root_path, index })
    }

    /// Open the store at a resolved configuration's cache directory
    pub fn open(config: &ResolvedConfig) -> CacheResult<Self> {
        Self::new(&config.cache_dir)
    }

    /// Open the store at the default location (`STOW_CACHE_DIR` or config)
    pub async fn open_default() -> CacheResult<Self> {
        let config = ConfigLoader::new().resolve(None).await?;
        Self::open(&config)
    }

    /// Get the root path of the store
    pub fn root_path(&self) -> &Utf8Path {
        &self.root_path
    }

    fn content_root(&self) -> Utf8PathBuf {
        self.root_path.join(CONTENT_DIR)
    }

    /// Path where content with this integrity is stored
    pub fn content_path(&self, integrity: &Integrity) -> Utf8PathBuf {
        content_path(&self.content_root(), integrity.hash())
    }

    /// Check if content exists in store
    pub fn contains(&self, integrity: &Integrity) -> bool {
        self.content_path(integrity).exists()
    }

    /// Open a writer that stores its content under `key`
    pub async fn writer(&self, key: &str, options: WriteOptions) -> CacheResult<CacheWriter> {
        CacheWriter::create(
            key.to_string(),
            options,
            &self.root_path.join(TMP_DIR),
            self.content_root(),
            Arc::clone(&self.index),
        )
    }

    /// Look up the entry stored under `key`
    pub fn info(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.index.get(key)?;
        let path = self.content_path(&entry.integrity);
        Some(CacheEntry::from_index(entry, path))
    }

    /// Keys currently in the index
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.index.keys();
        keys.sort();
        keys
    }

    /// Read the content stored under `key`, verifying its integrity
    pub async fn read(&self, key: &str) -> CacheResult<Vec<u8>> {
        let entry = self
            .info(key)
            .ok_or_else(|| StowError::EntryNotFound { key: key.to_string() })?;

        let content = tokio::fs::read(&entry.path)
            .await
            .map_err(|e| StowError::io(format!("Failed to read content file {}", entry.path), e))?;

        if !entry.integrity.matches(&content) {
            return Err(StowError::IntegrityFailure {
                subject: key.to_string(),
                expected: entry.integrity.to_string(),
                actual: Integrity::of(&content).to_string(),
            });
        }

        Ok(content)
    }

    /// Verify content integrity
    pub async fn verify(&self, integrity: &Integrity) -> CacheResult<bool> {
        match tokio::fs::read(self.content_path(integrity)).await {
            Ok(content) => Ok(integrity.matches(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StowError::io("Failed to read content file".to_string(), e)),
        }
    }

    /// Extract the archive stored under `key` into `dest_dir`
    pub async fn restore<P: AsRef<std::path::Path>>(&self, key: &str, dest_dir: P) -> CacheResult<CacheEntry> {
        let content = self.read(key).await?;
        let entry = self
            .info(key)
            .ok_or_else(|| StowError::EntryNotFound { key: key.to_string() })?;

        let dest_dir = dest_dir.as_ref().to_path_buf();
        let extracted = tokio::task::spawn_blocking(move || extract_tarball(Cursor::new(content), &dest_dir))
            .await
            .map_err(|e| join_error("Extraction", e))??;

        info!("Restored '{}' ({} entries)", key, extracted.len());

        Ok(entry)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;
    use tempfile::tempdir;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]
        #[test]
        fn cas_integrity_property(content in prop::collection::vec(any::<u8>(), 0..1000)) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let temp_dir = tempdir().unwrap();
            let store_path = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
            let store = CasStore::new(&store_path).unwrap();

            let (integrity, retrieved) = runtime.block_on(async {
                let mut writer = store.writer("key", WriteOptions::default()).await.unwrap();
                writer.write_all(&content).await.unwrap();
                let integrity = writer.commit().await.unwrap();
                (integrity, store.read("key").await.unwrap())
            });

            prop_assert_eq!(integrity, Integrity::of(&content));
            prop_assert_eq!(content, retrieved);
            prop_assert!(runtime.block_on(store.verify(&integrity)).unwrap());
        }
    }
}
