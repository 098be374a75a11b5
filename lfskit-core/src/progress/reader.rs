use std::io::{self, Read, Write};

use crate::{LfsError, Result};

/// Progress callback: `(total_size, read_so_far, bytes_this_read)`.
///
/// Returning an error aborts the copy that owns the callback.
pub type CopyCallback<'a> = &'a mut dyn FnMut(u64, u64, usize) -> Result<()>;

/// Reader that counts the bytes passing through it and reports each read
pub struct CallbackReader<'a, R> {
    inner: R,
    callback: Option<CopyCallback<'a>>,
    total_size: u64,
    read_so_far: u64,
}

impl<'a, R: Read> CallbackReader<'a, R> {
    /// `total_size` is only passed through to the callback. It may be an
    /// estimate and is allowed to be smaller than what actually gets read.
    pub fn new(inner: R, total_size: u64, callback: Option<CopyCallback<'a>>) -> Self {
        Self {
            inner,
            callback,
            total_size,
            read_so_far: 0,
        }
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Bytes returned by all reads so far
    pub fn read_so_far(&self) -> u64 {
        self.read_so_far
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CallbackReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read_so_far += n as u64;

        if let Some(callback) = self.callback.as_mut() {
            // The bytes stay consumed even when the callback fails.
            callback(self.total_size, self.read_so_far, n).map_err(io::Error::other)?;
        }

        Ok(n)
    }
}

/// Copy `reader` into `writer`, reporting progress to `callback`.
///
/// Without a callback this is a plain `io::copy`. Returns the number of bytes
/// written. A callback failure is returned as the error the callback produced.
pub fn copy_with_callback<W, R>(
    writer: &mut W,
    reader: R,
    total_size: u64,
    callback: Option<CopyCallback<'_>>,
) -> Result<u64>
where
    W: Write + ?Sized,
    R: Read,
{
    let Some(callback) = callback else {
        let mut reader = reader;
        return Ok(io::copy(&mut reader, writer)?);
    };

    let mut reader = CallbackReader::new(reader, total_size, Some(callback));
    let copied = io::copy(&mut reader, writer).map_err(LfsError::from_read)?;

    tracing::trace!(copied, total_size, "copy finished");
    Ok(copied)
}
