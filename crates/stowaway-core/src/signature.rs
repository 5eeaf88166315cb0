//! Container trailer (signature) codec
//!
//! Every container ends with a fixed 64-byte big-endian record:
//!
//! ```text
//! offset  size  field
//!      0     8  app tag (NUL-padded ASCII)
//!      8     2  major version
//!     10     2  minor version
//!     12     2  revision
//!     14     8  exe size (i64, > 0)
//!     22     8  archive size (i64, > 0)
//!     30    34  reserved, zero
//! ```

use crate::config::ContainerConfig;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Size of the trailer in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Width of the app tag field
pub const APP_TAG_SIZE: usize = 8;

/// Decoded container trailer
///
/// Both sizes are strictly positive and their sum plus the trailer size
/// fits in a `u64`; the constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    app_tag: String,
    major: u16,
    minor: u16,
    revision: u16,
    exe_size: u64,
    archive_size: u64,
}

impl Signature {
    /// Create a signature for a freshly built container
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either size is zero or does not fit
    /// the trailer's signed 64-bit fields.
    pub fn new(config: &ContainerConfig, exe_size: u64, archive_size: u64) -> Result<Self> {
        let (major, minor, revision) = config.version();
        check_sizes(exe_size, archive_size).map_err(Error::validation)?;
        Ok(Self {
            app_tag: config.app_tag().to_string(),
            major,
            minor,
            revision,
            exe_size,
            archive_size,
        })
    }

    pub fn app_tag(&self) -> &str {
        &self.app_tag
    }

    pub fn version(&self) -> (u16, u16, u16) {
        (self.major, self.minor, self.revision)
    }

    /// Byte length of the executable prefix
    pub fn exe_size(&self) -> u64 {
        self.exe_size
    }

    /// Byte length of the archive region
    pub fn archive_size(&self) -> u64 {
        self.archive_size
    }

    /// Offset of the first archive byte within the container
    pub fn archive_offset(&self) -> u64 {
        self.exe_size
    }

    /// `exe_size + archive_size + SIGNATURE_SIZE`
    pub fn total_size(&self) -> u64 {
        self.exe_size + self.archive_size + SIGNATURE_SIZE as u64
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}.{}.{}(exe:{},archive:{},total:{})",
            self.app_tag,
            self.major,
            self.minor,
            self.revision,
            self.exe_size,
            self.archive_size,
            self.total_size()
        )
    }
}

fn check_sizes(exe_size: u64, archive_size: u64) -> std::result::Result<(), String> {
    if exe_size == 0 || exe_size > i64::MAX as u64 {
        return Err(format!("exe size {} out of range", exe_size));
    }
    if archive_size == 0 || archive_size > i64::MAX as u64 {
        return Err(format!("archive size {} out of range", archive_size));
    }
    exe_size
        .checked_add(archive_size)
        .and_then(|sum| sum.checked_add(SIGNATURE_SIZE as u64))
        .map(|_| ())
        .ok_or_else(|| "container size overflows u64".to_string())
}

/// Encodes and decodes trailers for one [`ContainerConfig`]
#[derive(Debug, Clone)]
pub struct SignatureCodec {
    config: ContainerConfig,
}

impl SignatureCodec {
    pub fn new(config: ContainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Serialize a signature into its 64-byte trailer
    ///
    /// The tag is truncated or NUL-padded to [`APP_TAG_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a size cannot be represented as a
    /// positive `i64`.
    pub fn encode(&self, sig: &Signature) -> Result<[u8; SIGNATURE_SIZE]> {
        check_sizes(sig.exe_size, sig.archive_size).map_err(Error::validation)?;

        let mut bytes = [0u8; SIGNATURE_SIZE];

        let tag = sig.app_tag.as_bytes();
        let tag_len = tag.len().min(APP_TAG_SIZE);
        bytes[0..tag_len].copy_from_slice(&tag[..tag_len]);

        bytes[8..10].copy_from_slice(&sig.major.to_be_bytes());
        bytes[10..12].copy_from_slice(&sig.minor.to_be_bytes());
        bytes[12..14].copy_from_slice(&sig.revision.to_be_bytes());
        bytes[14..22].copy_from_slice(&(sig.exe_size as i64).to_be_bytes());
        bytes[22..30].copy_from_slice(&(sig.archive_size as i64).to_be_bytes());
        // 30..64 stays zero

        Ok(bytes)
    }

    /// Parse a trailer
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the slice is not exactly
    /// [`SIGNATURE_SIZE`] bytes, the tag does not match this codec's
    /// configuration, or either size is not positive.
    pub fn decode(&self, bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != SIGNATURE_SIZE {
            return Err(Error::format(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_SIZE,
                bytes.len()
            )));
        }

        let app_tag = decode_app_tag(&bytes[0..APP_TAG_SIZE]);
        if app_tag != self.config.app_tag() {
            return Err(Error::format(format!(
                "unexpected app tag: expected '{}', got '{}'",
                self.config.app_tag(),
                app_tag
            )));
        }

        let major = u16::from_be_bytes([bytes[8], bytes[9]]);
        let minor = u16::from_be_bytes([bytes[10], bytes[11]]);
        let revision = u16::from_be_bytes([bytes[12], bytes[13]]);
        let exe_size = i64::from_be_bytes([
            bytes[14], bytes[15], bytes[16], bytes[17],
            bytes[18], bytes[19], bytes[20], bytes[21],
        ]);
        let archive_size = i64::from_be_bytes([
            bytes[22], bytes[23], bytes[24], bytes[25],
            bytes[26], bytes[27], bytes[28], bytes[29],
        ]);

        if exe_size <= 0 {
            return Err(Error::format(format!("non-positive exe size: {}", exe_size)));
        }
        if archive_size <= 0 {
            return Err(Error::format(format!(
                "non-positive archive size: {}",
                archive_size
            )));
        }
        check_sizes(exe_size as u64, archive_size as u64).map_err(Error::format)?;

        Ok(Signature {
            app_tag,
            major,
            minor,
            revision,
            exe_size: exe_size as u64,
            archive_size: archive_size as u64,
        })
    }
}

impl Default for SignatureCodec {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

/// Tag bytes up to the first NUL, or the whole field
fn decode_app_tag(field: &[u8]) -> String {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..len]).into_owned()
}
