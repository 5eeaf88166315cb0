//! # Stowaway Container
//!
//! Builds and restores containers: a copy of an executable followed by a zip
//! archive of assets and a fixed 64-byte trailer.
//!
//! ```text
//! [exe bytes: exe_size][archive bytes: archive_size][signature: 64]
//! ```
//!
//! The executable still runs unchanged; at startup it can pass its own path
//! (`std::env::current_exe()`) to [`Restorer::restore`] and serve the
//! embedded files from memory.

pub mod builder;
pub mod restorer;

pub use builder::{BuildReport, ContainerBuilder};
pub use restorer::{RestoreConfig, Restorer};
