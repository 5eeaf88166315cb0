//! Container builder - appends an archive and trailer to a copy of an executable

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use stowaway_archive::ArchiveWriter;
use stowaway_core::{ContainerConfig, Error, Result, Signature, SignatureCodec};
use tempfile::NamedTempFile;

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Where the container was written
    pub output: PathBuf,

    /// Trailer written at the end of the container
    pub signature: Signature,

    /// Number of files embedded
    pub files: usize,
}

/// Builds a container from an executable and a set of source paths.
///
/// The output is `[exe][archive][64-byte trailer]`. It is written to a
/// temporary file next to `output` and renamed into place once flushed, so a
/// failed build never leaves a partial container behind.
///
/// # Example
///
/// ```rust,no_run
/// use stowaway_container::ContainerBuilder;
/// use stowaway_core::ContainerConfig;
/// use std::path::Path;
///
/// let report = ContainerBuilder::new(ContainerConfig::default())
///     .exe("target/release/server")
///     .source("web/public")
///     .build(Path::new("server.bundle"))
///     .unwrap();
/// println!("{}", report.signature);
/// ```
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    codec: SignatureCodec,
    exe: Option<PathBuf>,
    sources: Vec<PathBuf>,
    base_dir: Option<PathBuf>,
}

impl ContainerBuilder {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            codec: SignatureCodec::new(config),
            exe: None,
            sources: Vec::new(),
            base_dir: None,
        }
    }

    /// Executable to copy into the front of the container
    pub fn exe(mut self, path: impl Into<PathBuf>) -> Self {
        self.exe = Some(path.into());
        self
    }

    /// Add a file or directory to embed
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    pub fn sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sources.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Resolve relative sources against `dir`; entry names stay relative
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Write the container to `output`, replacing any existing file
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if no executable or no sources were given, the
    ///   executable is empty, or a source path is rejected
    /// - [`Error::NotFound`] if the executable or a source is missing
    /// - [`Error::Io`] on any read or write failure
    pub fn build(&self, output: &Path) -> Result<BuildReport> {
        let exe_path = self
            .exe
            .as_deref()
            .ok_or_else(|| Error::validation("no executable given"))?;
        if self.sources.is_empty() {
            return Err(Error::validation("at least one source path is required"));
        }

        let exe = fs::read(exe_path).map_err(|e| Error::from_io_at(e, exe_path))?;
        if exe.is_empty() {
            return Err(Error::validation(format!(
                "executable {} is empty",
                exe_path.display()
            )));
        }
        tracing::debug!("read {} ({} bytes)", exe_path.display(), exe.len());

        let config = self.codec.config();
        let mut writer = ArchiveWriter::new(config.namespace());
        if let Some(dir) = &self.base_dir {
            writer = writer.with_base_dir(dir);
        }
        for source in &self.sources {
            let added = writer.add(source)?;
            tracing::debug!("{}: {} files", source.display(), added);
        }
        let files = writer.len();
        let archive = writer.finish()?;

        let signature = Signature::new(config, exe.len() as u64, archive.len() as u64)?;
        let trailer = self.codec.encode(&signature)?;

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&exe)?;
        tmp.write_all(&archive)?;
        tmp.write_all(&trailer)?;
        tmp.flush()?;

        let permissions = fs::metadata(exe_path)?.permissions();
        fs::set_permissions(tmp.path(), permissions)?;
        tmp.as_file().sync_all()?;

        tmp.persist(output).map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            "built {} with {} files: {}",
            output.display(),
            files,
            signature
        );

        Ok(BuildReport {
            output: output.to_path_buf(),
            signature,
            files,
        })
    }
}
