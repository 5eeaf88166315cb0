//! Partial pipeline - a bounded window into a larger stream

use std::io::{self, Read, Seek, SeekFrom};

/// A pipeline that exposes only `[start, start + length)` of an underlying
/// stream, with offsets rebased to zero.
///
/// The restorer uses this to hand the archive region of a container to the
/// archive reader without copying it: the reader sees a stream that begins
/// at the first archive byte and ends right before the signature.
///
/// # Example
///
/// ```rust
/// use stowaway_pipeline::PartialPipeline;
/// use std::io::{Cursor, Read};
///
/// let data: Vec<u8> = (0..100).collect();
/// let mut window = PartialPipeline::new(Cursor::new(data), 10, 5).unwrap();
///
/// let mut buf = Vec::new();
/// window.read_to_end(&mut buf).unwrap();
/// assert_eq!(buf, vec![10, 11, 12, 13, 14]);
/// ```
pub struct PartialPipeline<R: Read + Seek> {
    inner: R,
    start: u64,
    length: u64,
    position: u64,
}

impl<R: Read + Seek> PartialPipeline<R> {
    /// Create a window over `inner`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the window extends past the end of the
    /// underlying stream, or any error from seeking it.
    pub fn new(mut inner: R, start: u64, length: u64) -> io::Result<Self> {
        let inner_len = inner.seek(SeekFrom::End(0))?;
        let end = start.checked_add(length).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "window end overflows u64")
        })?;
        if end > inner_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "window {}..{} exceeds stream length {}",
                    start, end, inner_len
                ),
            ));
        }

        inner.seek(SeekFrom::Start(start))?;

        Ok(Self {
            inner,
            start,
            length,
            position: 0,
        })
    }

    /// Offset of the window within the underlying stream
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Position relative to the window start
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }
}

impl<R: Read + Seek> Read for PartialPipeline<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let to_read = (buf.len() as u64).min(remaining) as usize;

        self.inner.seek(SeekFrom::Start(self.start + self.position))?;
        let bytes_read = self.inner.read(&mut buf[..to_read])?;
        self.position += bytes_read as u64;

        Ok(bytes_read)
    }
}

impl<R: Read + Seek> Seek for PartialPipeline<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        // i128 so neither u64 offsets nor negative deltas can overflow
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(offset) => self.length as i128 + offset as i128,
            SeekFrom::Current(offset) => self.position as i128 + offset as i128,
        };

        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before beginning of window",
            ));
        }
        if new_pos > self.length as i128 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek beyond end of window",
            ));
        }

        self.position = new_pos as u64;
        Ok(self.position)
    }
}
