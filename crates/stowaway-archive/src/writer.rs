//! Archive writer - bundles source files into an in-memory zip blob

use crate::time;
use crate::walk::{collect_files, SourceFile};
use crate::zip_error;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use stowaway_core::{Error, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds the archive region of a container.
///
/// Every file is stored under `namespace/`. Directory entries are never
/// written; a directory source contributes only its descendant files.
/// [`ArchiveWriter::finish`] consumes the writer, so nothing can be added
/// once the archive is closed.
///
/// # Example
///
/// ```rust,no_run
/// use stowaway_archive::ArchiveWriter;
/// use std::path::Path;
///
/// let mut writer = ArchiveWriter::new("stowaway");
/// writer.add(Path::new("web/public")).unwrap();
/// let blob = writer.finish().unwrap();
/// ```
pub struct ArchiveWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    namespace: String,
    base_dir: Option<PathBuf>,
    names: BTreeSet<String>,
}

impl ArchiveWriter {
    /// Create an empty archive rooted at `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            namespace: namespace.into(),
            base_dir: None,
            names: BTreeSet::new(),
        }
    }

    /// Resolve relative sources against `dir` instead of the working directory
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Add a file, or every file below a directory
    ///
    /// Returns the number of files added.
    ///
    /// # Errors
    ///
    /// Fails if the source is missing or unreadable, contains `..`, or would
    /// produce an entry name that is already in the archive.
    pub fn add(&mut self, source: &Path) -> Result<usize> {
        let files = collect_files(self.base_dir.as_deref(), source)?;
        if files.is_empty() {
            tracing::debug!("{} contains no files, nothing added", source.display());
        }

        for file in &files {
            self.add_source_file(file)?;
        }
        Ok(files.len())
    }

    /// Add in-memory content as `name` (relative to the namespace)
    pub fn add_bytes(
        &mut self,
        name: &str,
        content: &[u8],
        permissions: u32,
        modified: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let name = stowaway_core::path::normalize(name);
        if name.is_empty() || stowaway_core::path::has_parent_segment(&name) {
            return Err(Error::validation(format!("invalid entry name '{}'", name)));
        }
        let full_name = format!("{}/{}", self.namespace, name);
        if !self.names.insert(full_name.clone()) {
            return Err(Error::validation(format!("duplicate entry '{}'", full_name)));
        }

        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(permissions);
        // Always set explicitly: the codec's default is "now", which would
        // make repeated builds differ.
        options = options.last_modified_time(modified.map(time::to_zip).unwrap_or_default());

        self.writer
            .start_file(full_name.as_str(), options)
            .map_err(zip_error)?;
        self.writer.write_all(content)?;

        tracing::debug!("added {} ({} bytes)", full_name, content.len());
        Ok(())
    }

    /// Number of files added so far
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Close the archive and return its bytes
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish().map_err(zip_error)?;
        Ok(cursor.into_inner())
    }

    fn add_source_file(&mut self, file: &SourceFile) -> Result<()> {
        let content =
            fs::read(&file.disk_path).map_err(|e| Error::from_io_at(e, &file.disk_path))?;
        self.add_bytes(&file.name, &content, file.permissions, file.modified)
    }
}
