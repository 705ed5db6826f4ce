//! Content-Addressable Storage implementation
//!
//! Content lives under `content/<ab>/<cd>/<hex>`, in-flight writes under
//! `tmp/`, and one index record per key under `index/<ab>/<cd>/<hex>`.

pub mod hash;
pub mod index;
pub mod store;
pub mod writer;

// Re-export main types
pub use hash::{compute_hash, ContentHash, Integrity};
pub use index::{CasIndex, IndexEntry};
pub use store::{CacheEntry, CasStore};
pub use writer::{CacheWriter, WriteOptions};
