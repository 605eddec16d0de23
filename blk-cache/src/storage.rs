//! # Storage Capability
//!
//! Interface between the cache and whatever it sits in front of: a file, a
//! block device, an in-memory buffer or a remote blob. The cache only needs
//! cursor-style seek/read/write.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Seekable storage consumed by the block cache
///
/// All operations are synchronous and block the caller.
pub trait Storage {
    /// Move the cursor, returning the resulting absolute offset
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Read up to `buf.len()` bytes at the cursor
    ///
    /// `Ok(0)` signals end of data.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes at the cursor
    ///
    /// A count smaller than `buf.len()` is a short write.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (**self).seek(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (**self).seek(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

/// Storage backed by any std stream (`File`, `Cursor<Vec<u8>>`, ...)
#[derive(Debug)]
pub struct IoStorage<T> {
    inner: T,
}

impl<T> IoStorage<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl IoStorage<File> {
    /// Open a file-backed storage
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the backing file
    /// * `writable` - Open read-write instead of read-only
    pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> io::Result<Self> {
        let file = if writable {
            OpenOptions::new().read(true).write(true).open(path.as_ref())?
        } else {
            File::open(path.as_ref())?
        };

        Ok(Self::new(file))
    }
}

impl<T: Read + Write + Seek> Storage for IoStorage<T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Fill as much of `buf` as the stream allows; a single `read` on a
        // pipe or socket may return early. An error part way through fails the
        // whole read so a truncated block is never mistaken for end of data.
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if filled > 0 {
                        log::debug!("Read failed after {} bytes: {}", filled, e);
                    }
                    return Err(e);
                }
            }
        }
        Ok(filled)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            match self.inner.write(&buf[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if written > 0 {
                        log::debug!("Write failed after {} bytes: {}", written, e);
                    }
                    return Err(e);
                }
            }
        }
        self.inner.flush()?;
        Ok(written)
    }
}
