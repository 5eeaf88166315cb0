//! Deterministic enumeration of source files
//!
//! Directories are walked with entries sorted by file name, so the same
//! inputs always produce the same ordered file list (and therefore a
//! byte-identical archive). Directories themselves never become entries;
//! an empty directory yields nothing.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Component, Path, PathBuf};
use stowaway_core::{Error, FileMode, Result};
use walkdir::WalkDir;

/// A file selected for embedding
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Where to read the bytes from
    pub disk_path: PathBuf,

    /// Slash-separated name relative to the namespace root
    pub name: String,

    /// Permission bits
    pub permissions: u32,

    /// Last modification time
    pub modified: Option<DateTime<Utc>>,
}

/// Collect every file under `source`.
///
/// `source` is named as given (minus any root or `.` components); relative
/// sources are resolved against `base_dir` when one is supplied.
///
/// # Errors
///
/// - [`Error::Validation`] if `source` contains a `..` component or a
///   non-UTF-8 name
/// - [`Error::NotFound`] if `source` does not exist
/// - [`Error::Io`] if a directory cannot be read
pub fn collect_files(base_dir: Option<&Path>, source: &Path) -> Result<Vec<SourceFile>> {
    let root_name = entry_name(source)?;
    let disk_root = match base_dir {
        Some(base) if source.is_relative() => base.join(source),
        _ => source.to_path_buf(),
    };

    let metadata = fs::metadata(&disk_root).map_err(|e| Error::from_io_at(e, &disk_root))?;

    if !metadata.is_dir() {
        return Ok(vec![SourceFile {
            disk_path: disk_root,
            name: root_name,
            permissions: permissions_of(&metadata),
            modified: modified_of(&metadata),
        }]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&disk_root)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&disk_root)
            .map_err(|_| Error::validation(format!("'{}' escaped its source root", entry.path().display())))?;
        let relative = entry_name(relative)?;
        let name = if root_name.is_empty() {
            relative
        } else {
            format!("{}/{}", root_name, relative)
        };

        let metadata = entry.metadata().map_err(|e| Error::Io(e.into()))?;
        files.push(SourceFile {
            disk_path: entry.path().to_path_buf(),
            name,
            permissions: permissions_of(&metadata),
            modified: modified_of(&metadata),
        });
    }

    Ok(files)
}

/// Slash-joined normal components of a path
fn entry_name(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                Error::validation(format!("non-UTF-8 path: {}", path.display()))
            })?),
            Component::ParentDir => {
                return Err(Error::validation(format!(
                    "source path '{}' must not contain '..'",
                    path.display()
                )))
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn permissions_of(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & FileMode::PERMISSION_MASK
}

#[cfg(not(unix))]
fn permissions_of(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        FileMode::DEFAULT_FILE_PERMISSIONS
    }
}

fn modified_of(metadata: &fs::Metadata) -> Option<DateTime<Utc>> {
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("foo"), "foo").unwrap();
        fs::create_dir_all(dir.path().join("dir")).unwrap();
        fs::write(dir.path().join("dir/baz"), "baz").unwrap();
        fs::write(dir.path().join("dir/bar"), "bar").unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        dir
    }

    fn names(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_collect_single_file() {
        let dir = fixture();
        let files = collect_files(Some(dir.path()), Path::new("foo")).unwrap();
        assert_eq!(names(&files), vec!["foo"]);
        assert_eq!(files[0].disk_path, dir.path().join("foo"));
    }

    #[test]
    fn test_collect_directory_is_sorted() {
        let dir = fixture();
        let files = collect_files(Some(dir.path()), Path::new("dir")).unwrap();
        assert_eq!(names(&files), vec!["dir/bar", "dir/baz"]);
    }

    #[test]
    fn test_collect_empty_directory_yields_nothing() {
        let dir = fixture();
        let files = collect_files(Some(dir.path()), Path::new("empty")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_collect_strips_current_dir() {
        let dir = fixture();
        let files = collect_files(Some(dir.path()), Path::new("./dir/bar")).unwrap();
        assert_eq!(names(&files), vec!["dir/bar"]);
    }

    #[test]
    fn test_collect_missing_source() {
        let dir = fixture();
        let err = collect_files(Some(dir.path()), Path::new("missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_collect_rejects_parent_traversal() {
        let dir = fixture();
        let err = collect_files(Some(&dir.path().join("dir")), Path::new("../foo")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
