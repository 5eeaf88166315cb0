//! # Stowaway Pipeline
//!
//! I/O abstractions for reading containers.
//!
//! - **PartialPipeline**: window into a subset of a stream (the archive region)
//! - **MmapPipeline**: memory-mapped, read-only access to a whole container
//!
//! ## Example
//!
//! ```rust,no_run
//! use stowaway_pipeline::{MmapPipeline, PartialPipeline};
//! use std::path::Path;
//!
//! let mmap = MmapPipeline::open(Path::new("app.bundle")).unwrap();
//!
//! // Expose only the archive region to the archive reader
//! let archive = PartialPipeline::new(mmap, 0x8000, 0x1000).unwrap();
//! ```

pub mod mmap;
pub mod partial;

pub use mmap::MmapPipeline;
pub use partial::PartialPipeline;
