//! Security validation constants and helpers
//!
//! Limits applied while reading containers, so a truncated or hostile
//! trailer cannot make the restorer allocate unbounded memory.

use crate::Error;

/// Maximum decompressed size of a single embedded file (1 GB)
pub const MAX_ENTRY_SIZE: u64 = 1024 * 1024 * 1024;

/// Maximum number of entries accepted from one archive
pub const MAX_ARCHIVE_ENTRIES: usize = 1_000_000;

/// Maximum file size for memory mapping (16 GB - practical limit for most systems)
pub const MAX_MMAP_SIZE: u64 = 16 * 1024 * 1024 * 1024;

/// Validate that a size is within allocation limits
///
/// # Security
/// Prevents memory exhaustion from archive entries that claim huge sizes
pub fn validate_allocation_size(size: u64, limit: u64, context: &str) -> crate::Result<usize> {
    if size > limit {
        return Err(Error::format(format!(
            "{} size {} exceeds limit {}",
            context, size, limit
        )));
    }

    u64_to_usize(size, context)
}

/// Safely convert u64 to usize with platform checking
///
/// # Security
/// Prevents truncation on 32-bit platforms
pub fn u64_to_usize(value: u64, context: &str) -> crate::Result<usize> {
    value.try_into().map_err(|_| {
        Error::format(format!(
            "{}: value {} exceeds platform usize limit",
            context, value
        ))
    })
}

/// Check that `[offset, offset + length)` lies inside `0..limit`
pub fn validate_range(offset: u64, length: u64, limit: u64, context: &str) -> crate::Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(Error::format(format!(
            "{} range {}+{} exceeds available {} bytes",
            context, offset, length, limit
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_allocation_size() {
        assert_eq!(validate_allocation_size(1024, MAX_ENTRY_SIZE, "entry").unwrap(), 1024);
        assert!(validate_allocation_size(MAX_ENTRY_SIZE + 1, MAX_ENTRY_SIZE, "entry").is_err());
    }

    #[test]
    fn test_u64_to_usize() {
        assert_eq!(u64_to_usize(1024, "test").unwrap(), 1024);

        #[cfg(target_pointer_width = "32")]
        {
            assert!(u64_to_usize(0xFFFFFFFF + 1, "test").is_err());
        }
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(10, 20, 30, "archive").is_ok());
        assert!(validate_range(10, 21, 30, "archive").is_err());
        assert!(validate_range(u64::MAX, 2, u64::MAX, "archive").is_err());
    }
}
