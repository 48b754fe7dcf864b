//! Storage backends for the checked byte stream
//!
//! A backend stores physical bytes; page framing and logical offsets are
//! handled one layer up by [`CheckedFile`](crate::checked_file::CheckedFile).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

#[cfg(feature = "mmap")]
use memmap2::Mmap;

/// Random-access physical storage
pub trait StorageBackend {
    /// Fill `buf` from the bytes starting at `offset`
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Store `buf` starting at `offset`; the range must be within the
    /// current length
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;

    /// Current physical length in bytes
    fn len(&self) -> u64;

    /// Whether the backend holds no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow to `len` bytes; new bytes read as zero
    fn extend_to(&mut self, len: u64) -> io::Result<()>;

    /// Whether writes are accepted
    fn is_writable(&self) -> bool;

    /// Push buffered writes to the underlying medium
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Whole contents, when the backend keeps them in memory
    fn as_slice(&self) -> Option<&[u8]> {
        None
    }
}

fn out_of_range(offset: u64, count: usize, len: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("range {offset}+{count} beyond length {len}"),
    )
}

fn checked_range(offset: u64, count: usize, len: u64) -> io::Result<std::ops::Range<usize>> {
    let end = offset
        .checked_add(count as u64)
        .filter(|&end| end <= len)
        .ok_or_else(|| out_of_range(offset, count, len))?;
    Ok(offset as usize..end as usize)
}

/// Backend holding the whole file in a growable buffer
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Vec<u8>,
    writable: bool,
}

impl MemoryBackend {
    /// Empty writable buffer
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            writable: true,
        }
    }

    /// Read-only view over existing file contents
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            writable: false,
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let range = checked_range(offset, buf.len(), self.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let range = checked_range(offset, buf.len(), self.len())?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn extend_to(&mut self, len: u64) -> io::Result<()> {
        if len <= self.len() {
            return Ok(());
        }
        let new_len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "length exceeds address space"))?;
        self.data
            .try_reserve(new_len - self.data.len())
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        self.data.resize(new_len, 0);
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.data)
    }
}

/// Backend over an open file handle
#[derive(Debug)]
pub struct FileBackend {
    file: File,
    len: u64,
    writable: bool,
}

impl FileBackend {
    /// Wrap a freshly created, truncated file
    pub fn create(file: File) -> io::Result<Self> {
        file.set_len(0)?;
        Ok(Self {
            file,
            len: 0,
            writable: true,
        })
    }

    /// Wrap an existing file for reading
    pub fn open(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            writable: false,
        })
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        checked_range(offset, buf.len(), self.len)?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        checked_range(offset, buf.len(), self.len)?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn extend_to(&mut self, len: u64) -> io::Result<()> {
        if len > self.len {
            self.file.set_len(len)?;
            self.len = len;
        }
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}

/// Read-only backend over a memory-mapped file
#[cfg(feature = "mmap")]
#[derive(Debug)]
pub struct MmapBackend {
    map: Mmap,
}

#[cfg(feature = "mmap")]
impl MmapBackend {
    /// Map an existing file
    pub fn open(file: &File) -> io::Result<Self> {
        // SAFETY: the map is read-only and the session never writes through
        // another handle while it is open.
        let map = unsafe { Mmap::map(file)? };
        Ok(Self { map })
    }
}

#[cfg(feature = "mmap")]
impl StorageBackend for MmapBackend {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let range = checked_range(offset, buf.len(), self.len())?;
        buf.copy_from_slice(&self.map[range]);
        Ok(())
    }

    fn write_at(&mut self, _offset: u64, _buf: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "memory map is read-only",
        ))
    }

    fn len(&self) -> u64 {
        self.map.len() as u64
    }

    fn extend_to(&mut self, _len: u64) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "memory map is read-only",
        ))
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.map)
    }
}
