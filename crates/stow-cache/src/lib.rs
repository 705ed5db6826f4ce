//! Content-Addressable Storage for stow
//!
//! This crate stores single files as gzipped tar archives in a
//! content-addressable cache. Content is named by its Blake3 hash and
//! looked up through a caller-supplied key.
//!
//! - `cas`: the cache itself (store, streaming writer, key index)
//! - `tarball`: archive creation and extraction
//! - `put`: validates a request and pipes a file's archive into the cache

pub mod cas;
pub mod put;
pub mod tarball;

// Re-export main types
pub use cas::{CacheEntry, CacheWriter, CasIndex, CasStore, ContentHash, IndexEntry, Integrity, WriteOptions};
pub use put::{store_file, store_file_with, store_file_with_args, store_request, FileRequest};
pub use tarball::{create_tarball, extract_tarball, ArchiveOptions};

use stow_core::error::StowError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, StowError>;

/// Map a failed blocking task into an IO error
pub(crate) fn join_error(context: &str, error: tokio::task::JoinError) -> StowError {
    StowError::io(
        format!("{} task failed", context),
        std::io::Error::new(std::io::ErrorKind::Other, error),
    )
}
