//! Store a single file in the cache
//!
//! `store_file` archives one regular file (gzipped tar, one entry named after
//! the file) and writes the archive under a key. The returned `CacheEntry`
//! is the index lookup for that key after the write has committed.

use serde_json::Value;
use std::path::Path;
use stow_core::error::StowError;
use stow_core::utils::{resolve_path, split_file_path};
use tracing::debug;

use crate::cas::{CacheEntry, CasStore, WriteOptions};
use crate::tarball::ArchiveOptions;
use crate::CacheResult;

pub mod args;
mod pipe;


pub use args::FileRequest;

/// Archive the file at `path` and store it under `key`
pub async fn store_file(
    store: &CasStore,
    path: &str,
    key: &str,
    options: WriteOptions,
) -> CacheResult<CacheEntry> {
    store_file_with(store, path, key, options, ArchiveOptions::default()).await
}

/// Validate untyped `(path, key[, options])` arguments, then store the file
pub async fn store_file_with_args(store: &CasStore, args: &[Value]) -> CacheResult<CacheEntry> {
    let request = FileRequest::from_args(args)?;
    store_request(store, request, ArchiveOptions::default()).await
}

/// `store_file` with explicit archive settings
pub async fn store_file_with(
    store: &CasStore,
    path: &str,
    key: &str,
    options: WriteOptions,
    archive: ArchiveOptions,
) -> CacheResult<CacheEntry> {
    let request = FileRequest::new(path, key, options)?;
    store_request(store, request, archive).await
}

/// Store a request that has already passed validation
pub async fn store_request(
    store: &CasStore,
    request: FileRequest,
    archive: ArchiveOptions,
) -> CacheResult<CacheEntry> {
    let FileRequest { path, key, options } = request;

    let cwd = std::env::current_dir()
        .map_err(|e| StowError::io("Failed to get current directory".to_string(), e))?;
    let given = Path::new(&path);
    let absolute_path = resolve_path(&cwd, given);

    let (mut writer, metadata) = tokio::try_join!(store.writer(&key, options), async {
        tokio::fs::metadata(&absolute_path)
            .await
            .map_err(|e| StowError::io(format!("Failed to stat {}", absolute_path.display()), e))
    })?;

    if !metadata.is_file() {
        return Err(StowError::NotAFile {
            resolved: (!given.is_absolute()).then(|| absolute_path.display().to_string()),
            path,
        });
    }

    let finalized = writer.finalized();
    let lookup = async {
        finalized.await?;
        store
            .info(&key)
            .ok_or_else(|| StowError::EntryNotFound { key: key.clone() })
    };

    let (directory, file_name) = split_file_path(&absolute_path).ok_or_else(|| StowError::NotAFile {
        path: path.clone(),
        resolved: Some(absolute_path.display().to_string()),
    })?;

    debug!("Storing {} as '{}'", absolute_path.display(), key);

    pipe::pipe_file(&directory, Path::new(&file_name), archive, writer).await?;

    lookup.await
}
