//! # Stowaway Archive
//!
//! The archive region of a container is a standard zip stream. This crate
//! is the only place that knows that: the builder hands it source paths and
//! gets bytes back, the restorer hands it a bounded reader and gets decoded
//! entries back.
//!
//! Every entry is named `<namespace>/<relative path>`. Directory entries are
//! never written, so empty directories do not survive a round trip.

mod time;

pub mod reader;
pub mod walk;
pub mod writer;

pub use reader::{extract, extract_bytes, ArchiveEntry};
pub use walk::{collect_files, SourceFile};
pub use writer::ArchiveWriter;

use stowaway_core::Error;
use zip::result::ZipError;

/// Map a zip codec error onto the Stowaway taxonomy
pub(crate) fn zip_error(err: ZipError) -> Error {
    match err {
        ZipError::Io(e) => Error::Io(e),
        other => Error::format(other.to_string()),
    }
}
