//! # Stowaway VFS
//!
//! An immutable, in-memory filesystem over the files restored from a
//! container (or loaded from local directories during development).
//!
//! - **VirtualFileSystem**: sorted map from full slash path to file, scoped
//!   to a root prefix; implements [`FileSource`](stowaway_core::FileSource)
//! - **FileSystemBuilder**: the only way to populate one
//! - **OpenFile**: per-open handle, either a regular file or a synthetic
//!   directory
//!
//! ## Example
//!
//! ```rust
//! use stowaway_core::FileMetadata;
//! use stowaway_vfs::FileSystemBuilder;
//!
//! let mut builder = FileSystemBuilder::new("stowaway");
//! builder
//!     .insert("stowaway/web/index.html", FileMetadata::file("index.html", 0, 0o644), b"hi")
//!     .unwrap();
//! let vfs = builder.build();
//!
//! let web = vfs.sub_file_system("web").unwrap();
//! assert_eq!(web.paths(), vec!["index.html"]);
//! assert_eq!(web.read_file_string("index.html").unwrap(), "hi");
//! ```

pub mod file;
pub mod filesystem;
mod local;

pub use file::{OpenFile, RegularFile, SyntheticDirectory, VirtualFile};
pub use filesystem::{FileSystemBuilder, VirtualFileSystem};
