//! Core types for Stowaway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix-style file mode: permission bits plus the directory type bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileMode(u32);

impl FileMode {
    /// `S_IFDIR`
    pub const DIR: u32 = 0o040_000;

    /// `S_IFREG`
    pub const REGULAR: u32 = 0o100_000;

    /// Permission and sticky/setuid bits
    pub const PERMISSION_MASK: u32 = 0o7777;

    /// Default permissions for files whose archive entry carries none
    pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o644;

    /// A regular file with the given permission bits
    pub fn file(permissions: u32) -> Self {
        Self(Self::REGULAR | (permissions & Self::PERMISSION_MASK))
    }

    /// A directory with the given permission bits
    pub fn directory(permissions: u32) -> Self {
        Self(Self::DIR | (permissions & Self::PERMISSION_MASK))
    }

    pub fn is_dir(self) -> bool {
        self.0 & Self::DIR == Self::DIR && self.0 & Self::REGULAR != Self::REGULAR
    }

    pub fn permissions(self) -> u32 {
        self.0 & Self::PERMISSION_MASK
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dir() { 'd' } else { '-' };
        let perms = self.permissions();
        let mut out = String::with_capacity(10);
        out.push(kind);
        for shift in [6u32, 3, 0] {
            let triple = (perms >> shift) & 0o7;
            out.push(if triple & 0o4 != 0 { 'r' } else { '-' });
            out.push(if triple & 0o2 != 0 { 'w' } else { '-' });
            out.push(if triple & 0o1 != 0 { 'x' } else { '-' });
        }
        f.write_str(&out)
    }
}

/// Metadata of an embedded file or a synthesized directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Final path segment
    pub name: String,

    /// Size in bytes (0 for directories)
    pub size: u64,

    /// Mode including the directory bit
    pub mode: FileMode,

    /// Last modification time, if the source recorded one
    pub modified: Option<DateTime<Utc>>,
}

impl FileMetadata {
    /// Metadata for a regular file
    pub fn file(name: impl Into<String>, size: u64, permissions: u32) -> Self {
        Self {
            name: name.into(),
            size,
            mode: FileMode::file(permissions),
            modified: None,
        }
    }

    /// Metadata for a directory (always zero-sized)
    pub fn directory(name: impl Into<String>, permissions: u32) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mode: FileMode::directory(permissions),
            modified: None,
        }
    }

    /// Set modification timestamp
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }
}

impl fmt::Display for FileMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>12} {}",
            self.mode,
            if self.is_dir() {
                "<DIR>".to_string()
            } else {
                format_size(self.size)
            },
            self.name
        )
    }
}

/// Format size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata() {
        let file = FileMetadata::file("index.html", 1024, 0o644);
        assert_eq!(file.name, "index.html");
        assert!(!file.is_dir());
        assert_eq!(file.size, 1024);
        assert_eq!(file.mode.permissions(), 0o644);
    }

    #[test]
    fn test_directory_metadata() {
        let dir = FileMetadata::directory("css", 0o777);
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);
    }

    #[test]
    fn test_file_mode_strips_type_bits() {
        // zip stores S_IFREG in the external attributes
        let mode = FileMode::file(0o100_755);
        assert!(!mode.is_dir());
        assert_eq!(mode.permissions(), 0o755);
        assert_eq!(mode.to_string(), "-rwxr-xr-x");
        assert_eq!(FileMode::directory(0o777).to_string(), "drwxrwxrwx");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(1536 * 1024), "1.50 MB");
    }
}
