//! # Stowaway Core
//!
//! Core types, traits, and error handling for Stowaway, a toolkit that
//! embeds asset files into a copy of an executable and serves them back out
//! of the running binary.
//!
//! This crate provides the foundational pieces shared by every other crate:
//! - **ContainerConfig**: tag, version and namespace of the container format
//! - **SignatureCodec**: the fixed 64-byte trailer at the end of a container
//! - **FileSource / OpenedFile**: the read-only file contract servers consume
//! - **Error**: the error taxonomy (validation, not found, format, I/O, unsupported)
//!
//! ## Container layout
//!
//! ```text
//! [executable bytes][archive bytes][64-byte signature]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use stowaway_core::{ContainerConfig, Signature, SignatureCodec};
//!
//! let codec = SignatureCodec::new(ContainerConfig::default());
//! let sig = Signature::new(codec.config(), 4096, 512).unwrap();
//! let trailer = codec.encode(&sig).unwrap();
//! assert_eq!(codec.decode(&trailer).unwrap(), sig);
//! ```

pub mod config;
pub mod error;
pub mod path;
pub mod security;
pub mod signature;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use config::ContainerConfig;
pub use error::{Error, ErrorKind, Result};
pub use security::*;
pub use signature::{Signature, SignatureCodec, APP_TAG_SIZE, SIGNATURE_SIZE};
pub use traits::{FileSource, OpenedFile, ReadSeek};
pub use types::{format_size, FileMetadata, FileMode};
