//! Path-keyed, immutable filesystem of embedded files

use crate::file::{OpenFile, SyntheticDirectory, VirtualFile};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use stowaway_core::path::{base_name, has_parent_segment, join, normalize, strip_root};
use stowaway_core::{Error, FileMetadata, FileSource, Result, Signature};

/// Read-only view of embedded files below a root path.
///
/// Every key is a full slash path beginning with `root + "/"`. Lookups take
/// paths relative to the root. A published filesystem is never mutated;
/// use [`FileSystemBuilder`] to create one.
#[derive(Debug, Clone)]
pub struct VirtualFileSystem {
    root: String,
    entries: BTreeMap<String, VirtualFile>,
    signature: Option<Arc<Signature>>,
}

impl VirtualFileSystem {
    /// Scoping prefix of this filesystem (e.g. `stowaway/web`)
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Trailer of the container this filesystem was restored from
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_deref()
    }

    /// Number of files visible from this root
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a file by path relative to the root
    ///
    /// Both `/` and `\` are accepted as separators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] unless `path` names a file exactly.
    pub fn get_file(&self, path: &str) -> Result<&VirtualFile> {
        let key = join(&self.root, path);
        self.entries
            .get(&key)
            .ok_or_else(|| Error::not_found(key))
    }

    /// Whole content of a file
    pub fn read_file(&self, path: &str) -> Result<Bytes> {
        self.get_file(path).map(|file| file.content().clone())
    }

    /// Whole content of a file as UTF-8 text
    pub fn read_file_string(&self, path: &str) -> Result<String> {
        let content = self.read_file(path)?;
        String::from_utf8(content.to_vec())
            .map_err(|e| Error::encoding(format!("{} is not valid UTF-8: {}", path, e)))
    }

    /// Paths relative to the root, ascending
    pub fn paths(&self) -> Vec<&str> {
        self.entries
            .keys()
            .filter_map(|key| strip_root(key, &self.root))
            .collect()
    }

    /// Files in path order
    pub fn files(&self) -> impl Iterator<Item = &VirtualFile> {
        self.entries.values()
    }

    /// A filesystem rooted at `relative_root` below this one.
    ///
    /// The result shares this filesystem's signature and content buffers but
    /// holds its own entry map. A root with no files under it is valid and
    /// simply empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `relative_root` has a `..` segment.
    pub fn sub_file_system(&self, relative_root: &str) -> Result<VirtualFileSystem> {
        if has_parent_segment(relative_root) {
            return Err(Error::validation(format!(
                "sub-filesystem root '{}' must not contain '..'",
                relative_root
            )));
        }

        let root = join(&self.root, relative_root);
        if root == self.root {
            return Ok(self.clone());
        }

        let prefix = format!("{}/", root);
        let entries: BTreeMap<String, VirtualFile> = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, file)| (key.clone(), file.clone()))
            .collect();

        tracing::debug!("sub-filesystem {} holds {} files", root, entries.len());
        Ok(VirtualFileSystem {
            root,
            entries,
            signature: self.signature.clone(),
        })
    }

    /// Open a path for reading.
    ///
    /// A leading `/` is ignored. A path that does not name a file opens as
    /// an empty directory named after its final segment, so servers can
    /// probe for an index document beneath it.
    pub fn open(&self, name: &str) -> OpenFile {
        let name = name.trim_start_matches('/');
        match self.get_file(name) {
            Ok(file) => OpenFile::Regular(file.open()),
            Err(_) => OpenFile::SyntheticDirectory(SyntheticDirectory::new(base_name(name))),
        }
    }
}

impl FileSource for VirtualFileSystem {
    type File = OpenFile;

    fn open(&self, name: &str) -> Result<Self::File> {
        Ok(VirtualFileSystem::open(self, name))
    }
}

impl fmt::Display for VirtualFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.signature {
            Some(signature) => write!(f, "{} [{}]", signature, self.root),
            None => write!(f, "local [{}]", self.root),
        }
    }
}

/// Collects files, then freezes them into a [`VirtualFileSystem`].
///
/// All content is packed into a single buffer; each file ends up holding a
/// slice of it.
#[derive(Debug)]
pub struct FileSystemBuilder {
    root: String,
    arena: Vec<u8>,
    pending: BTreeMap<String, (FileMetadata, Range<usize>)>,
    signature: Option<Signature>,
}

impl FileSystemBuilder {
    /// Start a filesystem whose keys all live under `root`
    pub fn new(root: &str) -> Self {
        Self {
            root: normalize(root),
            arena: Vec::new(),
            pending: BTreeMap::new(),
            signature: None,
        }
    }

    /// Attach the trailer of the source container
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Add a file by its full path (including the root segment).
    ///
    /// The metadata's size is set from `content`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the path lies outside the root,
    /// contains `..`, or was already inserted.
    pub fn insert(&mut self, path: &str, metadata: FileMetadata, content: &[u8]) -> Result<()> {
        if has_parent_segment(path) {
            return Err(Error::validation(format!("path '{}' must not contain '..'", path)));
        }
        let key = normalize(path);
        match strip_root(&key, &self.root) {
            Some(relative) if !relative.is_empty() => {}
            _ => {
                return Err(Error::validation(format!(
                    "path '{}' is outside root '{}'",
                    key, self.root
                )))
            }
        }
        if self.pending.contains_key(&key) {
            return Err(Error::validation(format!("duplicate path '{}'", key)));
        }

        let start = self.arena.len();
        self.arena.extend_from_slice(content);
        let metadata = FileMetadata {
            size: content.len() as u64,
            ..metadata
        };
        self.pending.insert(key, (metadata, start..self.arena.len()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Freeze the collected files
    pub fn build(self) -> VirtualFileSystem {
        let arena = Bytes::from(self.arena);
        let entries = self
            .pending
            .into_iter()
            .map(|(key, (metadata, range))| {
                let file = VirtualFile::new(key.clone(), metadata, arena.slice(range));
                (key, file)
            })
            .collect();

        VirtualFileSystem {
            root: self.root,
            entries,
            signature: self.signature.map(Arc::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};
    use stowaway_core::{ContainerConfig, OpenedFile};

    fn sample() -> VirtualFileSystem {
        let mut builder = FileSystemBuilder::new("stowaway");
        for (path, content) in [
            ("stowaway/A", "alpha"),
            ("stowaway/B/C", "charlie"),
            ("stowaway/B/D", "delta"),
            ("stowaway/BB/E", "echo"),
        ] {
            let name = base_name(path);
            builder
                .insert(path, FileMetadata::file(name, 0, 0o644), content.as_bytes())
                .unwrap();
        }
        let config = ContainerConfig::default();
        builder
            .signature(Signature::new(&config, 1000, 200).unwrap())
            .build()
    }

    #[test]
    fn test_paths_sorted_and_relative() {
        let fs = sample();
        assert_eq!(fs.paths(), vec!["A", "B/C", "B/D", "BB/E"]);
        assert_eq!(fs.len(), 4);
    }

    #[test]
    fn test_get_and_read() {
        let fs = sample();
        assert_eq!(fs.get_file("B/C").unwrap().path(), "stowaway/B/C");
        assert_eq!(fs.get_file("B\\D").unwrap().metadata().size, 5);
        assert_eq!(fs.read_file_string("A").unwrap(), "alpha");
        assert_eq!(&fs.read_file("B/D").unwrap()[..], b"delta");
        assert!(fs.get_file("B").unwrap_err().is_not_found());
        assert!(fs.read_file("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_file_string_rejects_invalid_utf8() {
        let mut builder = FileSystemBuilder::new("stowaway");
        builder
            .insert("stowaway/bin", FileMetadata::file("bin", 0, 0o644), &[0xff, 0xfe])
            .unwrap();
        let fs = builder.build();
        assert!(matches!(fs.read_file_string("bin"), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_sub_file_system() {
        let fs = sample();
        let sub = fs.sub_file_system("B").unwrap();
        assert_eq!(sub.root(), "stowaway/B");
        assert_eq!(sub.paths(), vec!["C", "D"]);
        assert_eq!(sub.read_file_string("C").unwrap(), "charlie");
        assert_eq!(sub.signature(), fs.signature());

        let nested = sub.sub_file_system("./").unwrap();
        assert_eq!(nested.paths(), sub.paths());

        let empty = fs.sub_file_system("nothing/here").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_sub_file_system_rejects_parent() {
        let fs = sample();
        let err = fs.sub_file_system("B/../..").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_open_regular_and_missing() {
        let fs = sample();

        let mut file = fs.open("/B/C");
        assert!(!file.is_dir());
        file.seek(SeekFrom::Start(4)).unwrap();
        let mut rest = String::new();
        file.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "lie");

        let dir = fs.open("/B");
        assert!(dir.is_dir());
        assert_eq!(dir.stat().unwrap().name, "B");

        let root = fs.open("/");
        assert_eq!(root.stat().unwrap().name, ".");
    }

    #[test]
    fn test_shared_buffer() {
        let fs = sample();
        let a = fs.read_file("A").unwrap();
        let c = fs.read_file("B/C").unwrap();
        // Both are slices of one arena
        assert_eq!(a.as_ptr().wrapping_add(a.len()), c.as_ptr());
    }

    #[test]
    fn test_builder_rejects_bad_paths() {
        let mut builder = FileSystemBuilder::new("stowaway");
        let meta = || FileMetadata::file("x", 0, 0o644);
        assert!(builder.insert("other/x", meta(), b"").is_err());
        assert!(builder.insert("stowaway", meta(), b"").is_err());
        assert!(builder.insert("stowaway/../x", meta(), b"").is_err());
        builder.insert("stowaway/x", meta(), b"1").unwrap();
        assert!(builder.insert("stowaway//x", meta(), b"2").is_err());
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_display() {
        let fs = sample();
        assert_eq!(
            fs.to_string(),
            "stowaway-0.1.0(exe:1000,archive:200,total:1264) [stowaway]"
        );
        let local = FileSystemBuilder::new("stowaway").build();
        assert_eq!(local.to_string(), "local [stowaway]");
    }
}
