//! Container restorer - reads the trailer and rebuilds the embedded files

use std::fs::File;
use std::io::SeekFrom;
use std::path::Path;
use stowaway_archive::extract;
use stowaway_core::{
    validate_range, ContainerConfig, Error, ReadSeek, Result, Signature, SignatureCodec,
    SIGNATURE_SIZE,
};
use stowaway_pipeline::{MmapPipeline, PartialPipeline};
use stowaway_vfs::{FileSystemBuilder, VirtualFileSystem};

/// Configuration for opening containers
#[derive(Debug, Clone, Copy)]
pub struct RestoreConfig {
    /// Memory-map the container instead of reading it through the file handle
    pub use_mmap: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self { use_mmap: true }
    }
}

/// Reads containers written with the same [`ContainerConfig`].
///
/// # Example
///
/// ```rust,no_run
/// use stowaway_container::Restorer;
/// use stowaway_core::ContainerConfig;
///
/// let exe = std::env::current_exe().unwrap();
/// let vfs = Restorer::new(ContainerConfig::default()).restore(&exe).unwrap();
/// for path in vfs.paths() {
///     println!("{}", path);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Restorer {
    codec: SignatureCodec,
    config: RestoreConfig,
}

impl Restorer {
    pub fn new(container: ContainerConfig) -> Self {
        Self::with_config(container, RestoreConfig::default())
    }

    pub fn with_config(container: ContainerConfig, config: RestoreConfig) -> Self {
        Self {
            codec: SignatureCodec::new(container),
            config,
        }
    }

    /// Decode only the trailer of `path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the file is shorter than a trailer, the
    /// trailer does not decode, or the sizes it records do not fit the file.
    pub fn read_signature(&self, path: &Path) -> Result<Signature> {
        let (mut stream, length) = self.open(path)?;
        self.read_trailer(&mut *stream, length)
    }

    /// Rebuild the filesystem embedded in `path`.
    ///
    /// The result is rooted at the configured namespace, so its paths are the
    /// source names given at build time.
    ///
    /// # Errors
    ///
    /// Everything [`Restorer::read_signature`] reports, plus
    /// [`Error::Format`] for a corrupt archive region. Nothing is skipped: a
    /// single bad entry fails the restore.
    pub fn restore(&self, path: &Path) -> Result<VirtualFileSystem> {
        let (mut stream, length) = self.open(path)?;
        let signature = self.read_trailer(&mut *stream, length)?;

        let window = PartialPipeline::new(
            stream,
            signature.archive_offset(),
            signature.archive_size(),
        )?;
        let entries = extract(window)?;

        let mut builder = FileSystemBuilder::new(self.codec.config().namespace());
        for entry in entries {
            builder
                .insert(&entry.path, entry.metadata, &entry.content)
                .map_err(|e| match e {
                    // A rejected path inside the archive is a damaged container
                    Error::Validation(msg) => Error::format(msg),
                    other => other,
                })?;
        }

        tracing::info!(
            "restored {} files from {} ({})",
            builder.len(),
            path.display(),
            signature
        );
        Ok(builder.signature(signature).build())
    }

    fn open(&self, path: &Path) -> Result<(Box<dyn ReadSeek>, u64)> {
        let file = File::open(path).map_err(|e| Error::from_io_at(e, path))?;
        let length = file.metadata()?.len();

        if length < SIGNATURE_SIZE as u64 {
            return Err(Error::format(format!(
                "{} is {} bytes, too short to hold a {}-byte signature",
                path.display(),
                length,
                SIGNATURE_SIZE
            )));
        }

        let stream: Box<dyn ReadSeek> = if self.config.use_mmap {
            Box::new(MmapPipeline::from_file(&file)?)
        } else {
            Box::new(file)
        };

        Ok((stream, length))
    }

    fn read_trailer(&self, stream: &mut dyn ReadSeek, length: u64) -> Result<Signature> {
        let mut trailer = [0u8; SIGNATURE_SIZE];
        stream.seek(SeekFrom::End(-(SIGNATURE_SIZE as i64)))?;
        stream.read_exact(&mut trailer)?;

        let signature = self.codec.decode(&trailer)?;
        validate_range(
            signature.exe_size(),
            signature.archive_size(),
            length - SIGNATURE_SIZE as u64,
            "archive region",
        )?;

        tracing::debug!("signature: {}", signature);
        Ok(signature)
    }
}
