//! Core traits for Stowaway

use crate::{error::Result, types::FileMetadata};
use std::io::{Read, Seek};

/// A hierarchical, read-only source of files addressed by slash paths.
///
/// This is the contract a static-file server consumes. `open` on a path
/// that does not name a file may either fail with
/// [`Error::NotFound`](crate::Error::NotFound) or return a directory-shaped
/// handle; servers must check [`OpenedFile::stat`] before reading.
pub trait FileSource: Send + Sync {
    /// Handle returned by [`FileSource::open`]
    type File: OpenedFile;

    /// Open a file by slash-separated path (a leading `/` is allowed)
    fn open(&self, name: &str) -> Result<Self::File>;
}

/// A file handle with its own read position
pub trait OpenedFile: Read + Seek + Send {
    /// Metadata of the opened entry
    fn stat(&self) -> Result<FileMetadata>;

    /// List up to `count` directory entries (0 = all)
    fn readdir(&mut self, count: usize) -> Result<Vec<FileMetadata>>;

    /// Release the handle
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Combined trait for Read + Seek
pub trait ReadSeek: Read + Seek + Send {}

/// Blanket implementation for any type that implements Read + Seek
impl<T: Read + Seek + Send> ReadSeek for T {}
