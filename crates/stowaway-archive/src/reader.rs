//! Archive reader - decodes an archive region into its file entries

use crate::time;
use crate::zip_error;
use std::io::{Cursor, Read, Seek};
use stowaway_core::path::{base_name, has_parent_segment, normalize};
use stowaway_core::{
    validate_allocation_size, Error, FileMetadata, FileMode, Result, MAX_ARCHIVE_ENTRIES,
    MAX_ENTRY_SIZE,
};
use zip::ZipArchive;

/// One decoded file
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Full slash-separated path, including the namespace segment
    pub path: String,

    /// Name (final segment), size, mode and timestamp
    pub metadata: FileMetadata,

    /// Decompressed content
    pub content: Vec<u8>,
}

/// Decode every file entry in the archive read from `reader`.
///
/// `reader` must start at the first byte of the archive and end at its last
/// byte. Directory entries are skipped. Entries come back in archive order.
///
/// # Errors
///
/// Any malformed entry fails the whole extraction with [`Error::Format`]:
/// a damaged central directory, an entry that fails to decompress, an entry
/// naming a parent directory, or one larger than [`MAX_ENTRY_SIZE`].
pub fn extract<R: Read + Seek>(reader: R) -> Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(reader).map_err(zip_error)?;

    if archive.len() > MAX_ARCHIVE_ENTRIES {
        return Err(Error::format(format!(
            "archive holds {} entries, limit is {}",
            archive.len(),
            MAX_ARCHIVE_ENTRIES
        )));
    }

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(zip_error)?;
        if file.is_dir() {
            continue;
        }

        let raw_name = file.name().to_string();
        if has_parent_segment(&raw_name) {
            return Err(Error::format(format!(
                "entry '{}' escapes the archive root",
                raw_name
            )));
        }
        let path = normalize(&raw_name);
        if path.is_empty() {
            return Err(Error::format(format!("entry {} has an empty name", index)));
        }

        let size = validate_allocation_size(file.size(), MAX_ENTRY_SIZE, &path)?;
        let mut content = Vec::with_capacity(size);
        file.by_ref()
            .take(size as u64 + 1)
            .read_to_end(&mut content)
            .map_err(|e| Error::format(format!("failed to decompress '{}': {}", path, e)))?;
        if content.len() > size {
            return Err(Error::format(format!(
                "entry '{}' inflates past its declared size of {} bytes",
                path, size
            )));
        }

        let permissions = file
            .unix_mode()
            .map(|mode| mode & FileMode::PERMISSION_MASK)
            .unwrap_or(FileMode::DEFAULT_FILE_PERMISSIONS);
        let mut metadata =
            FileMetadata::file(base_name(&path), content.len() as u64, permissions);
        if let Some(modified) = file.last_modified().and_then(time::from_zip) {
            metadata = metadata.with_modified(modified);
        }

        tracing::trace!("extracted {} ({} bytes)", path, content.len());
        entries.push(ArchiveEntry {
            path,
            metadata,
            content,
        });
    }

    Ok(entries)
}

/// [`extract`] over an in-memory archive
pub fn extract_bytes(data: &[u8]) -> Result<Vec<ArchiveEntry>> {
    extract(Cursor::new(data))
}
