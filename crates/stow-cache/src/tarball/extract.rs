//! Tarball extraction functionality
//!
//! Entries are unpacked only after their path has been checked to stay
//! inside the destination directory.

use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use stow_core::error::StowError;
use tar::{Archive, EntryType};
use tracing::debug;

use crate::CacheResult;

/// Extract a gzipped tarball to a destination directory
///
/// Returns the paths of the files, directories and symlinks that were
/// written. Hard links and special entries are skipped.
pub fn extract_tarball<R: Read>(reader: R, dest_dir: &Path) -> CacheResult<Vec<PathBuf>> {
    fs::create_dir_all(dest_dir)
        .map_err(|e| StowError::io(format!("Failed to create {}", dest_dir.display()), e))?;

    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut extracted = Vec::new();

    let entries = archive
        .entries()
        .map_err(|e| StowError::io("Failed to read archive".to_string(), e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| StowError::io("Failed to read archive entry".to_string(), e))?;
        let entry_path = entry
            .path()
            .map_err(|e| StowError::io("Failed to read archive entry path".to_string(), e))?
            .into_owned();
        let target = contained_path(&entry_path, dest_dir)?;

        match entry.header().entry_type() {
            EntryType::Regular | EntryType::Directory => {}
            EntryType::Symlink => {
                check_link_target(&entry, &target, dest_dir)?;
            }
            other => {
                debug!("Skipping {:?} entry {}", other, entry_path.display());
                continue;
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StowError::io(format!("Failed to create {}", parent.display()), e))?;
        }

        entry
            .unpack(&target)
            .map_err(|e| StowError::io(format!("Failed to unpack {}", entry_path.display()), e))?;
        extracted.push(target);
    }

    Ok(extracted)
}

/// Map an entry path under `dest_dir`, rejecting absolute and `..` paths
fn contained_path(entry_path: &Path, dest_dir: &Path) -> CacheResult<PathBuf> {
    let mut target = dest_dir.to_path_buf();

    for component in entry_path.components() {
        match component {
            Component::Normal(name) => target.push(name),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StowError::IntegrityFailure {
                    subject: "tarball".to_string(),
                    expected: "relative path inside the destination".to_string(),
                    actual: entry_path.display().to_string(),
                });
            }
        }
    }

    Ok(target)
}

/// Reject symlinks whose target would land outside `dest_dir`
fn check_link_target<R: Read>(entry: &tar::Entry<'_, R>, target: &Path, dest_dir: &Path) -> CacheResult<()> {
    let link_name = entry
        .link_name()
        .map_err(|e| StowError::io("Failed to read link target".to_string(), e))?;

    let Some(link_name) = link_name else {
        return Ok(());
    };

    let escapes = if link_name.is_absolute() {
        true
    } else {
        let base = target.parent().unwrap_or(dest_dir);
        let mut depth = base
            .strip_prefix(dest_dir)
            .map(|rel| rel.components().count() as isize)
            .unwrap_or(0);
        link_name.components().any(|component| {
            match component {
                Component::ParentDir => depth -= 1,
                Component::Normal(_) => depth += 1,
                _ => {}
            }
            depth < 0
        })
    };

    if escapes {
        return Err(StowError::IntegrityFailure {
            subject: "tarball".to_string(),
            expected: "link within destination".to_string(),
            actual: format!("{} -> {}", target.display(), link_name.display()),
        });
    }

    Ok(())
}
