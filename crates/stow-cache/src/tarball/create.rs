//! Tarball creation functionality

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use stow_core::error::StowError;
use tar::Builder;
use tracing::warn;
use walkdir::WalkDir;

use crate::CacheResult;

/// How an archive is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Wrap the tar stream in gzip
    pub gzip: bool,
    /// Fail on missing or special entries instead of skipping them
    pub strict: bool,
    /// Gzip level (0-9)
    pub compression_level: u32,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            gzip: true,
            strict: true,
            compression_level: 6,
        }
    }
}

impl ArchiveOptions {
    /// Use a different gzip level
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}

/// Write an archive of `entries` (relative to `base_dir`) into `writer`
///
/// Returns the writer once the archive, and gzip trailer if any, is
/// complete and flushed.
pub fn create_tarball<W: Write>(
    writer: W,
    base_dir: &Path,
    entries: &[PathBuf],
    options: &ArchiveOptions,
) -> CacheResult<W> {
    let mut inner = if options.gzip {
        let encoder = GzEncoder::new(writer, Compression::new(options.compression_level));
        let mut builder = Builder::new(encoder);
        append_entries(&mut builder, base_dir, entries, options)?;
        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .map_err(|e| StowError::io("Failed to finish archive".to_string(), e))?
    } else {
        let mut builder = Builder::new(writer);
        append_entries(&mut builder, base_dir, entries, options)?;
        builder
            .into_inner()
            .map_err(|e| StowError::io("Failed to finish archive".to_string(), e))?
    };

    inner
        .flush()
        .map_err(|e| StowError::io("Failed to flush archive".to_string(), e))?;

    Ok(inner)
}

/// Create tarball and return as bytes
pub fn create_tarball_bytes(
    base_dir: &Path,
    entries: &[PathBuf],
    options: &ArchiveOptions,
) -> CacheResult<Vec<u8>> {
    create_tarball(Vec::new(), base_dir, entries, options)
}

fn append_entries<W: Write>(
    builder: &mut Builder<W>,
    base_dir: &Path,
    entries: &[PathBuf],
    options: &ArchiveOptions,
) -> CacheResult<()> {
    for name in entries {
        if !is_relative_entry(name) {
            return Err(StowError::InvalidArchiveEntry {
                entry: name.display().to_string(),
                reason: "entry names must be relative and stay inside the base directory".to_string(),
            });
        }

        let full_path = base_dir.join(name);
        // Follows symlinks, so a link to a file is archived as that file
        let metadata = match fs::metadata(&full_path) {
            Ok(metadata) => metadata,
            Err(e) => {
                skip_or_fail(options, name, &e.to_string())?;
                continue;
            }
        };

        if metadata.is_file() {
            builder
                .append_path_with_name(&full_path, name)
                .map_err(|e| StowError::io(format!("Failed to archive {}", full_path.display()), e))?;
        } else if metadata.is_dir() {
            append_directory(builder, &full_path, name, options)?;
        } else {
            skip_or_fail(options, name, "not a regular file or directory")?;
        }
    }

    Ok(())
}

fn append_directory<W: Write>(
    builder: &mut Builder<W>,
    source_dir: &Path,
    name: &Path,
    options: &ArchiveOptions,
) -> CacheResult<()> {
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            StowError::io(
                format!("Failed to walk {}", source_dir.display()),
                std::io::Error::new(std::io::ErrorKind::Other, e),
            )
        })?;
        let path = entry.path();
        let relative = path.strip_prefix(source_dir).map_err(|e| {
            StowError::io(
                format!("Failed to strip prefix: {}", e),
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;
        let archived_name = name.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            builder
                .append_dir(&archived_name, path)
                .map_err(|e| StowError::io(format!("Failed to archive {}", path.display()), e))?;
        } else if file_type.is_file() {
            builder
                .append_path_with_name(path, &archived_name)
                .map_err(|e| StowError::io(format!("Failed to archive {}", path.display()), e))?;
        } else {
            skip_or_fail(options, &archived_name, "symlinks and special files are not archived")?;
        }
    }

    Ok(())
}

fn skip_or_fail(options: &ArchiveOptions, name: &Path, reason: &str) -> CacheResult<()> {
    if options.strict {
        return Err(StowError::InvalidArchiveEntry {
            entry: name.display().to_string(),
            reason: reason.to_string(),
        });
    }

    warn!("Skipping archive entry {}: {}", name.display(), reason);
    Ok(())
}

fn is_relative_entry(name: &Path) -> bool {
    !name.as_os_str().is_empty()
        && name
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tarball::extract::extract_tarball;
    use flate2::read::GzDecoder;
    use std::io::{Cursor, Read};
    use tempfile::tempdir;

    fn entry_names(tarball: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(tarball));
        archive
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap().path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_single_file_archive() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "target\n").unwrap();
        fs::write(temp_dir.path().join("other.txt"), "not archived").unwrap();

        let tarball = create_tarball_bytes(
            temp_dir.path(),
            &[PathBuf::from(".gitignore")],
            &ArchiveOptions::default(),
        )
        .unwrap();

        assert_eq!(entry_names(&tarball), vec![".gitignore".to_string()]);

        let mut archive = tar::Archive::new(GzDecoder::new(tarball.as_slice()));
        let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "target\n");
    }

    #[test]
    fn test_directory_entry() {
        let temp_dir = tempdir().unwrap();
        let source_dir = temp_dir.path().join("pkg");
        fs::create_dir_all(source_dir.join("sub")).unwrap();
        fs::write(source_dir.join("a.txt"), "a").unwrap();
        fs::write(source_dir.join("sub").join("b.txt"), "b").unwrap();

        let tarball = create_tarball_bytes(
            temp_dir.path(),
            &[PathBuf::from("pkg")],
            &ArchiveOptions::default(),
        )
        .unwrap();

        let extract_dir = temp_dir.path().join("out");
        extract_tarball(Cursor::new(tarball), &extract_dir).unwrap();
        assert_eq!(fs::read_to_string(extract_dir.join("pkg/a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(extract_dir.join("pkg/sub/b.txt")).unwrap(), "b");
    }

    #[test]
    fn test_plain_tar() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("file"), "x").unwrap();
        let options = ArchiveOptions {
            gzip: false,
            ..ArchiveOptions::default()
        };

        let tarball = create_tarball_bytes(temp_dir.path(), &[PathBuf::from("file")], &options).unwrap();

        let mut archive = tar::Archive::new(tarball.as_slice());
        assert_eq!(archive.entries().unwrap().count(), 1);
    }

    #[test]
    fn test_strict_missing_entry_fails() {
        let temp_dir = tempdir().unwrap();

        let err = create_tarball_bytes(
            temp_dir.path(),
            &[PathBuf::from("missing")],
            &ArchiveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StowError::InvalidArchiveEntry { .. }));
    }

    const LENIENT: ArchiveOptions = ArchiveOptions {
        gzip: true,
        strict: false,
        compression_level: 6,
    };

    #[test]
    fn test_lenient_missing_entry_is_skipped() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("present"), "here").unwrap();

        let tarball = create_tarball_bytes(
            temp_dir.path(),
            &[PathBuf::from("missing"), PathBuf::from("present")],
            &LENIENT,
        )
        .unwrap();
        assert_eq!(entry_names(&tarball), vec!["present".to_string()]);
    }

    #[test]
    fn test_rejects_escaping_entries() {
        let temp_dir = tempdir().unwrap();

        for name in ["../etc/passwd", "/etc/passwd", ""] {
            let err = create_tarball_bytes(
                temp_dir.path(),
                &[PathBuf::from(name)],
                &LENIENT,
            )
            .unwrap_err();
            assert!(matches!(err, StowError::InvalidArchiveEntry { .. }), "{name}");
        }
    }

    #[test]
    fn test_compression_level_is_clamped() {
        let options = ArchiveOptions::default().with_compression_level(42);
        assert_eq!(options.compression_level, 9);
    }
}
