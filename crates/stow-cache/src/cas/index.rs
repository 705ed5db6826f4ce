//! CAS index for key lookups
//!
//! Every key owns one record file under `index/<ab>/<cd>/<hex>`, where the
//! hex is the Blake3 hash of the key. Records are written to a temporary
//! file in their bucket and renamed into place, so a write only ever
//! touches its own key and readers never see a partial record. Lookups go
//! to disk, which makes writes from other handles and processes visible.

use chrono::Utc;
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use stow_core::error::StowError;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{compute_hash, Integrity};
use crate::{join_error, CacheResult};

/// Index record for a cached key
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct IndexEntry {
    /// Caller key
    pub key: String,
    /// Integrity of the stored content
    pub integrity: Integrity,
    /// Size in bytes
    pub size: u64,
    /// When the entry was stored (unix millis)
    pub time: i64,
    /// Caller metadata, round-tripped verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl IndexEntry {
    /// Create a new index record stamped with the current time
    pub fn new(key: String, integrity: Integrity, size: u64, metadata: Option<Value>) -> Self {
        Self {
            key,
            integrity,
            size,
            time: Utc::now().timestamp_millis(),
            metadata,
        }
    }
}

/// Key index stored as one record file per key
#[derive(Debug, Clone)]
pub struct CasIndex {
    /// Root of the record buckets
    root: PathBuf,
}

impl CasIndex {
    /// Open the index rooted at `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> CacheResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| StowError::io(format!("Failed to create index directory {}", root.display()), e))?;
        Ok(Self { root })
    }

    /// Location of the record for `key`
    pub fn record_path(&self, key: &str) -> PathBuf {
        let hex = compute_hash(key.as_bytes()).to_hex();
        self.root.join(&hex[0..2]).join(&hex[2..4]).join(hex)
    }

    /// Write the record for `entry.key`, replacing any previous one
    ///
    /// Nothing is recorded when this fails.
    pub async fn insert(&self, entry: IndexEntry) -> CacheResult<()> {
        let record_path = self.record_path(&entry.key);
        let content = serde_json::to_vec_pretty(&entry).map_err(|e| {
            StowError::io(
                "Failed to serialize index record".to_string(),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;

        tokio::task::spawn_blocking(move || write_record(&record_path, &content))
            .await
            .map_err(|e| join_error("Index write", e))??;

        debug!("Recorded index entry for '{}'", entry.key);
        Ok(())
    }

    /// Get the entry stored under `key`
    pub fn get(&self, key: &str) -> Option<IndexEntry> {
        read_record(&self.record_path(key)).filter(|entry| entry.key == key)
    }

    /// Keys of every readable record
    pub fn keys(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && is_record_name(entry.file_name()))
            .filter_map(|entry| read_record(entry.path()))
            .map(|entry| entry.key)
            .collect()
    }
}

fn write_record(record_path: &Path, content: &[u8]) -> CacheResult<()> {
    let bucket = record_path
        .parent()
        .ok_or_else(|| StowError::io(
            format!("Index record {} has no parent directory", record_path.display()),
            io::Error::new(io::ErrorKind::InvalidInput, "record path has no parent"),
        ))?;
    fs::create_dir_all(bucket)
        .map_err(|e| StowError::io(format!("Failed to create index bucket {}", bucket.display()), e))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".record-")
        .tempfile_in(bucket)
        .map_err(|e| StowError::io("Failed to stage index record".to_string(), e))?;
    staged
        .write_all(content)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| StowError::io("Failed to write index record".to_string(), e))?;
    staged
        .persist(record_path)
        .map_err(|e| StowError::io(format!("Failed to replace index record {}", record_path.display()), e.error))?;
    Ok(())
}

fn read_record(record_path: &Path) -> Option<IndexEntry> {
    let content = match fs::read(record_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Cannot read index record {}: {}", record_path.display(), e);
            return None;
        }
    };
    match serde_json::from_slice(&content) {
        Ok(entry) => Some(entry),
        Err(e) => {
            // Content files are still addressable; only the key mapping is lost
            warn!("Ignoring unreadable index record {}: {}", record_path.display(), e);
            None
        }
    }
}

/// Record files are named by 64 hex digits; staged writes start with a dot
fn is_record_name(name: &std::ffi::OsStr) -> bool {
    name.to_str()
        .map(|name| name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_entry(key: &str) -> IndexEntry {
        IndexEntry::new(key.to_string(), Integrity::of(b"content"), 1024, None)
    }

    #[tokio::test]
    async fn test_cas_index_operations() {
        let temp_dir = tempdir().unwrap();
        let index = CasIndex::open(temp_dir.path().join("index")).unwrap();
        assert!(index.keys().is_empty());
        assert!(index.get("test_key").is_none());

        index.insert(sample_entry("test_key")).await.unwrap();
        let retrieved = index.get("test_key").unwrap();
        assert_eq!(retrieved.size, 1024);
        assert_eq!(index.keys(), vec!["test_key".to_string()]);
    }

    #[tokio::test]
    async fn test_index_persistence() {
        let temp_dir = tempdir().unwrap();
        let index_root = temp_dir.path().join("index");

        {
            let index = CasIndex::open(&index_root).unwrap();
            let entry = IndexEntry::new(
                "test_key".to_string(),
                Integrity::of(b"content"),
                7,
                Some(json!({"customData": [1, 2, 3]})),
            );
            index.insert(entry).await.unwrap();
        }

        let index = CasIndex::open(&index_root).unwrap();
        let retrieved = index.get("test_key").unwrap();
        assert_eq!(retrieved.size, 7);
        assert_eq!(retrieved.integrity, Integrity::of(b"content"));
        assert_eq!(retrieved.metadata, Some(json!({"customData": [1, 2, 3]})));

        let bucket = index.record_path("test_key").parent().unwrap().to_path_buf();
        assert_eq!(fs::read_dir(bucket).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_replacing_a_key_keeps_others() {
        let temp_dir = tempdir().unwrap();
        let index = CasIndex::open(temp_dir.path()).unwrap();

        index.insert(sample_entry("a")).await.unwrap();
        index.insert(sample_entry("b")).await.unwrap();
        index
            .insert(IndexEntry::new("a".to_string(), Integrity::of(b"new"), 3, None))
            .await
            .unwrap();

        let mut keys = index.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(index.get("a").unwrap().integrity, Integrity::of(b"new"));
    }

    #[tokio::test]
    async fn test_two_indexes_on_one_root_see_each_other() {
        let temp_dir = tempdir().unwrap();
        let first = CasIndex::open(temp_dir.path()).unwrap();
        let second = CasIndex::open(temp_dir.path()).unwrap();

        first.insert(sample_entry("one")).await.unwrap();
        second.insert(sample_entry("two")).await.unwrap();

        assert!(first.get("two").is_some());
        assert!(second.get("one").is_some());
    }

    #[tokio::test]
    async fn test_failed_write_records_nothing() {
        let temp_dir = tempdir().unwrap();
        let index = CasIndex::open(temp_dir.path()).unwrap();

        // A file where the first-level bucket directory should be
        let record_path = index.record_path("blocked");
        let top_bucket = record_path.parent().unwrap().parent().unwrap();
        fs::write(top_bucket, b"").unwrap();

        assert!(index.insert(sample_entry("blocked")).await.is_err());
        assert!(index.get("blocked").is_none());
        assert!(index.keys().is_empty());
    }

    #[test]
    fn test_corrupt_record_is_ignored() {
        let temp_dir = tempdir().unwrap();
        let index = CasIndex::open(temp_dir.path()).unwrap();
        let record_path = index.record_path("broken");
        fs::create_dir_all(record_path.parent().unwrap()).unwrap();
        fs::write(&record_path, "not json").unwrap();

        assert!(index.get("broken").is_none());
        assert!(index.keys().is_empty());
    }

    #[test]
    fn test_record_names() {
        assert!(is_record_name(std::ffi::OsStr::new(&"a".repeat(64))));
        assert!(!is_record_name(std::ffi::OsStr::new(".record-abc")));
        assert!(!is_record_name(std::ffi::OsStr::new("zz")));
    }
}
