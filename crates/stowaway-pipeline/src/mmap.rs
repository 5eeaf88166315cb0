//! Memory-mapped pipeline for reading whole containers

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use stowaway_core::MAX_MMAP_SIZE;

/// A read-only, memory-mapped view of a container file.
///
/// Reading a container's trailer and archive region through a mapping
/// avoids pulling the (possibly large) executable prefix into memory.
///
/// # Example
///
/// ```rust,no_run
/// use stowaway_pipeline::MmapPipeline;
/// use std::io::{Read, Seek, SeekFrom};
/// use std::path::Path;
///
/// let mut pipeline = MmapPipeline::open(Path::new("app.bundle")).unwrap();
/// let mut trailer = [0u8; 64];
/// pipeline.seek(SeekFrom::End(-64)).unwrap();
/// pipeline.read_exact(&mut trailer).unwrap();
/// ```
pub struct MmapPipeline {
    mmap: Mmap,
    position: u64,
}

impl MmapPipeline {
    /// Map a file by path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped
    ///
    /// # Safety
    ///
    /// Uses `unsafe` for memory mapping because:
    /// - The OS guarantees memory safety for valid file descriptors
    /// - We validate the file is a regular, non-empty file before mapping
    /// - The mapping is read-only
    /// - File must not be truncated during access (caller responsibility)
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_file(&file)
    }

    /// Map an already opened file
    ///
    /// See [`MmapPipeline::open`] for the checks performed.
    pub fn from_file(file: &File) -> io::Result<Self> {
        let metadata = file.metadata()?;

        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Only regular files can be memory-mapped",
            ));
        }

        if metadata.len() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot memory-map an empty file",
            ));
        }

        if metadata.len() > MAX_MMAP_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "File size {} exceeds memory mapping limit {}",
                    metadata.len(),
                    MAX_MMAP_SIZE
                ),
            ));
        }

        // SAFETY: regular, non-empty file within the size limit; read-only map
        let mmap = unsafe { Mmap::map(file)? };

        Ok(Self { mmap, position: 0 })
    }

    /// Length of the mapped file
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position)
    }
}

impl Read for MmapPipeline {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining() as usize;
        if remaining == 0 {
            return Ok(0);
        }

        let to_read = buf.len().min(remaining);
        let start = self.position as usize;

        buf[..to_read].copy_from_slice(&self.mmap[start..start + to_read]);
        self.position += to_read as u64;

        Ok(to_read)
    }
}

impl Seek for MmapPipeline {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(offset) => self.len() as i128 + offset as i128,
            SeekFrom::Current(offset) => self.position as i128 + offset as i128,
        };

        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Seek before beginning of file",
            ));
        }

        // Seeking past EOF is allowed; reads there return 0
        self.position = u64::try_from(new_pos).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "Seek position overflows u64")
        })?;

        Ok(self.position)
    }
}
