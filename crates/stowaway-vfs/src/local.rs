//! Filesystem loaded straight from local directories

use crate::filesystem::{FileSystemBuilder, VirtualFileSystem};
use std::fs;
use std::path::Path;
use stowaway_archive::collect_files;
use stowaway_core::path::join;
use stowaway_core::{ContainerConfig, Error, FileMetadata, Result};

impl VirtualFileSystem {
    /// Load `roots` from disk with the same layout a container build would
    /// give them.
    ///
    /// Useful while developing, when the running binary carries no payload.
    /// Relative roots are resolved against `base_dir` if one is given. The
    /// result has no signature.
    pub fn from_local<P: AsRef<Path>>(
        config: &ContainerConfig,
        base_dir: Option<&Path>,
        roots: &[P],
    ) -> Result<VirtualFileSystem> {
        let mut builder = FileSystemBuilder::new(config.namespace());

        for root in roots {
            for source in collect_files(base_dir, root.as_ref())? {
                let content = fs::read(&source.disk_path)
                    .map_err(|e| Error::from_io_at(e, &source.disk_path))?;

                let mut metadata = FileMetadata::file(
                    stowaway_core::path::base_name(&source.name),
                    content.len() as u64,
                    source.permissions,
                );
                if let Some(modified) = source.modified {
                    metadata = metadata.with_modified(modified);
                }

                builder.insert(&join(config.namespace(), &source.name), metadata, &content)?;
            }
        }

        tracing::info!(
            "loaded {} local files under {}",
            builder.len(),
            config.namespace()
        );
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_local_matches_build_layout() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("web/public")).unwrap();
        fs::write(dir.path().join("web/public/index.html"), "<h1>hi</h1>").unwrap();
        fs::write(dir.path().join("web/app.js"), "run()").unwrap();
        fs::create_dir_all(dir.path().join("web/empty")).unwrap();

        let config = ContainerConfig::default();
        let vfs = VirtualFileSystem::from_local(&config, Some(dir.path()), &["web"]).unwrap();

        assert!(vfs.signature().is_none());
        assert_eq!(vfs.root(), "stowaway");
        assert_eq!(vfs.paths(), vec!["web/app.js", "web/public/index.html"]);

        let public = vfs.sub_file_system("web/public").unwrap();
        assert_eq!(public.read_file_string("index.html").unwrap(), "<h1>hi</h1>");
        assert_eq!(public.get_file("index.html").unwrap().metadata().name, "index.html");
    }

    #[test]
    fn test_from_local_missing_root() {
        let dir = TempDir::new().unwrap();
        let config = ContainerConfig::default();
        let err = VirtualFileSystem::from_local(&config, Some(dir.path()), &["nope"]).unwrap_err();
        assert!(err.is_not_found());
    }
}
