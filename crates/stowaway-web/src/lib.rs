//! # Stowaway Web
//!
//! Serves the files of a restored container (or any other
//! [`FileSource`](stowaway_core::FileSource)) over HTTP with axum.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stowaway_container::Restorer;
//! use stowaway_core::ContainerConfig;
//! use stowaway_web::{serve, FileServerExt, ServeConfig};
//!
//! # async fn run() -> stowaway_core::Result<()> {
//! let exe = std::env::current_exe()?;
//! let vfs = Restorer::new(ContainerConfig::default()).restore(&exe)?;
//! let router = vfs.file_server("web/public")?;
//! serve(router, &ServeConfig::default()).await
//! # }
//! ```

pub mod files;
pub mod server;

pub use files::{serve_source, status_for, FileServerExt, INDEX_FILE};
pub use server::{layered, serve, ServeConfig};
