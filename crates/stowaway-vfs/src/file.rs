//! Embedded files and open handles

use bytes::Bytes;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use stowaway_core::{Error, FileMetadata, OpenedFile, Result};

/// Permissions reported for directories that only exist implicitly
pub const SYNTHETIC_DIR_PERMISSIONS: u32 = 0o777;

/// A file stored in a [`VirtualFileSystem`](crate::VirtualFileSystem).
///
/// Cloning is cheap: the content is a reference-counted slice of the
/// filesystem's shared buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    path: String,
    metadata: FileMetadata,
    content: Bytes,
}

impl VirtualFile {
    pub(crate) fn new(path: String, metadata: FileMetadata, content: Bytes) -> Self {
        Self {
            path,
            metadata,
            content,
        }
    }

    /// Full slash-separated path, including the namespace segment
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// A new handle with its own read position
    pub fn open(&self) -> RegularFile {
        RegularFile {
            metadata: self.metadata.clone(),
            cursor: Cursor::new(self.content.clone()),
        }
    }
}

/// Result of [`VirtualFileSystem::open`](crate::VirtualFileSystem::open)
#[derive(Debug)]
pub enum OpenFile {
    /// An embedded file
    Regular(RegularFile),

    /// Stand-in for any path that is not an embedded file
    SyntheticDirectory(SyntheticDirectory),
}

impl OpenFile {
    pub fn metadata(&self) -> &FileMetadata {
        match self {
            OpenFile::Regular(file) => &file.metadata,
            OpenFile::SyntheticDirectory(dir) => &dir.metadata,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, OpenFile::SyntheticDirectory(_))
    }
}

/// Open handle on an embedded file
#[derive(Debug)]
pub struct RegularFile {
    metadata: FileMetadata,
    cursor: Cursor<Bytes>,
}

impl RegularFile {
    /// Current read position
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }
}

/// Open handle on a path with no embedded file behind it.
///
/// Reads always hit end-of-file; seeking behaves like seeking an empty
/// stream.
#[derive(Debug)]
pub struct SyntheticDirectory {
    metadata: FileMetadata,
    position: u64,
}

impl SyntheticDirectory {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            metadata: FileMetadata::directory(name, SYNTHETIC_DIR_PERMISSIONS),
            position: 0,
        }
    }
}

impl Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            OpenFile::Regular(file) => file.cursor.read(buf),
            OpenFile::SyntheticDirectory(_) => Ok(0),
        }
    }
}

impl Seek for OpenFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            OpenFile::Regular(file) => file.cursor.seek(pos),
            OpenFile::SyntheticDirectory(dir) => {
                let target = match pos {
                    SeekFrom::Start(offset) => Some(offset),
                    SeekFrom::End(offset) | SeekFrom::Current(offset) if offset < 0 => None,
                    SeekFrom::End(offset) => Some(offset as u64),
                    SeekFrom::Current(offset) => dir.position.checked_add(offset as u64),
                };
                dir.position = target.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "invalid seek on directory")
                })?;
                Ok(dir.position)
            }
        }
    }
}

impl OpenedFile for OpenFile {
    fn stat(&self) -> Result<FileMetadata> {
        Ok(self.metadata().clone())
    }

    fn readdir(&mut self, _count: usize) -> Result<Vec<FileMetadata>> {
        Err(Error::unsupported(format!(
            "cannot list '{}': directory listing is not supported",
            self.metadata().name
        )))
    }
}
