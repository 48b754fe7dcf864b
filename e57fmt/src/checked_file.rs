//! Paged byte stream with logical addressing
//!
//! The physical file is a sequence of pages, each ending with a checksum
//! slot. Callers address the stream in logical offsets that skip those
//! slots; this module splits every transfer at page boundaries and
//! translates offsets with [`PageLayout`]. Checksum slots are left zeroed.

use crate::backend::StorageBackend;
use crate::error::{Error, Result};
use e57fmt_core::{ErrorCode, PageLayout};

/// Logical byte stream over a paged physical backend
pub struct CheckedFile {
    backend: Box<dyn StorageBackend>,
    layout: PageLayout,
    name: String,
    position: u64,
    logical_length: u64,
}

impl CheckedFile {
    /// Wrap a backend; its current physical length must be whole pages
    pub fn new(
        name: impl Into<String>,
        backend: Box<dyn StorageBackend>,
        layout: PageLayout,
    ) -> Result<Self> {
        let name = name.into();
        let physical = backend.len();
        if physical % layout.page_size() != 0 {
            return Err(Error::new(
                ErrorCode::BadFileLength,
                format!(
                    "fileName={name} physicalLength={physical} pageSize={}",
                    layout.page_size()
                ),
            ));
        }
        let logical_length = physical / layout.page_size() * layout.logical_page_size();

        Ok(Self {
            backend,
            layout,
            name,
            position: 0,
            logical_length,
        })
    }

    /// Name used in error contexts
    pub fn file_name(&self) -> &str {
        &self.name
    }

    /// Page framing of this stream
    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Current logical position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Logical bytes available
    pub fn logical_length(&self) -> u64 {
        self.logical_length
    }

    /// Physical bytes in the backend, always whole pages
    pub fn physical_length(&self) -> u64 {
        self.backend.len()
    }

    /// Whether the backend accepts writes
    pub fn is_writable(&self) -> bool {
        self.backend.is_writable()
    }

    /// Translate a logical offset to its physical position
    pub fn logical_to_physical(&self, logical: u64) -> u64 {
        self.layout.logical_to_physical(logical)
    }

    /// Translate a physical offset to logical space
    pub fn physical_to_logical(&self, physical: u64) -> Result<u64> {
        self.layout.physical_to_logical(physical).ok_or_else(|| {
            Error::new(
                ErrorCode::BadApiArgument,
                format!(
                    "fileName={} physicalOffset={physical} lands in a checksum slot",
                    self.name
                ),
            )
        })
    }

    /// Move to a logical offset; the end of the stream is a valid position
    pub fn seek(&mut self, logical: u64) -> Result<()> {
        if logical > self.logical_length {
            return Err(Error::new(
                ErrorCode::LseekFailed,
                format!(
                    "fileName={} offset={logical} logicalLength={}",
                    self.name, self.logical_length
                ),
            ));
        }
        tracing::trace!(file = %self.name, offset = logical, "seek");
        self.position = logical;
        Ok(())
    }

    /// Grow the logical length, zero filling whole new pages
    pub fn extend(&mut self, new_logical_length: u64) -> Result<()> {
        if new_logical_length <= self.logical_length {
            return Ok(());
        }
        self.check_writable()?;

        let physical = self
            .layout
            .physical_length(new_logical_length)
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::WriteFailed,
                    format!("fileName={} newLogicalLength={new_logical_length}", self.name),
                )
            })?;
        self.backend.extend_to(physical).map_err(|e| {
            Error::io(
                ErrorCode::WriteFailed,
                format!("fileName={} newLength={physical}", self.name),
                e,
            )
        })?;
        self.logical_length = physical / self.layout.page_size() * self.layout.logical_page_size();
        Ok(())
    }

    /// Fill `buf` from the current position and advance past it
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let end = self.position.checked_add(buf.len() as u64);
        if end.map_or(true, |end| end > self.logical_length) {
            return Err(Error::new(
                ErrorCode::ReadFailed,
                format!(
                    "fileName={} position={} count={} logicalLength={}",
                    self.name,
                    self.position,
                    buf.len(),
                    self.logical_length
                ),
            ));
        }

        let mut done = 0;
        while done < buf.len() {
            let n = self.page_chunk(buf.len() - done);
            let physical = self.layout.logical_to_physical(self.position);
            self.backend
                .read_at(physical, &mut buf[done..done + n])
                .map_err(|e| {
                    Error::io(
                        ErrorCode::ReadFailed,
                        format!("fileName={} physicalOffset={physical}", self.name),
                        e,
                    )
                })?;
            done += n;
            self.position += n as u64;
        }
        Ok(())
    }

    /// Write `buf` at the current position, extending the stream if needed
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.check_writable()?;
        let end = self.position.checked_add(buf.len() as u64).ok_or_else(|| {
            Error::new(
                ErrorCode::WriteFailed,
                format!("fileName={} position overflow", self.name),
            )
        })?;
        self.extend(end)?;

        let mut done = 0;
        while done < buf.len() {
            let n = self.page_chunk(buf.len() - done);
            let physical = self.layout.logical_to_physical(self.position);
            self.backend
                .write_at(physical, &buf[done..done + n])
                .map_err(|e| {
                    Error::io(
                        ErrorCode::WriteFailed,
                        format!("fileName={} physicalOffset={physical}", self.name),
                        e,
                    )
                })?;
            done += n;
            self.position += n as u64;
        }
        Ok(())
    }

    /// Flush buffered writes to the medium
    pub fn flush(&mut self) -> Result<()> {
        self.backend
            .flush()
            .map_err(|e| Error::io(ErrorCode::CloseFailed, format!("fileName={}", self.name), e))
    }

    /// Whole physical contents for in-memory backends
    pub fn as_slice(&self) -> Option<&[u8]> {
        self.backend.as_slice()
    }

    /// Bytes that can be transferred before the next page boundary
    fn page_chunk(&self, remaining: usize) -> usize {
        let logical_page = self.layout.logical_page_size();
        let left_in_page = logical_page - self.position % logical_page;
        remaining.min(left_in_page as usize)
    }

    fn check_writable(&self) -> Result<()> {
        if self.backend.is_writable() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorCode::FileIsReadOnly,
                format!("fileName={}", self.name),
            ))
        }
    }
}

impl std::fmt::Debug for CheckedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckedFile")
            .field("name", &self.name)
            .field("page_size", &self.layout.page_size())
            .field("position", &self.position)
            .field("logical_length", &self.logical_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn memory_file() -> CheckedFile {
        CheckedFile::new("mem", Box::new(MemoryBackend::new()), PageLayout::STANDARD).unwrap()
    }

    #[test]
    fn test_extend_is_page_granular() {
        let mut cf = memory_file();
        assert_eq!(cf.logical_length(), 0);
        cf.extend(10).unwrap();
        assert_eq!(cf.logical_length(), 1020);
        assert_eq!(cf.physical_length(), 1024);
        cf.extend(1021).unwrap();
        assert_eq!(cf.physical_length(), 2048);
    }

    #[test]
    fn test_write_skips_checksum_slots() {
        let mut cf = memory_file();
        let data: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8 + 1).collect();
        cf.seek(0).unwrap();
        cf.write(&data).unwrap();
        assert_eq!(cf.position(), 2000);

        let raw = cf.as_slice().unwrap();
        assert_eq!(&raw[0..1020], &data[0..1020]);
        assert_eq!(&raw[1020..1024], &[0, 0, 0, 0]);
        assert_eq!(&raw[1024..2004], &data[1020..2000]);

        let mut back = vec![0u8; 2000];
        cf.seek(0).unwrap();
        cf.read(&mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut cf = memory_file();
        cf.extend(4).unwrap();
        cf.seek(1016).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(cf.read(&mut buf).unwrap_err().code(), ErrorCode::ReadFailed);
        assert_eq!(cf.seek(2000).unwrap_err().code(), ErrorCode::LseekFailed);
    }

    #[test]
    fn test_read_only_backend() {
        let mut cf = CheckedFile::new(
            "ro",
            Box::new(MemoryBackend::from_bytes(vec![0; 1024])),
            PageLayout::STANDARD,
        )
        .unwrap();
        assert_eq!(cf.logical_length(), 1020);
        assert_eq!(cf.write(&[1]).unwrap_err().code(), ErrorCode::FileIsReadOnly);
    }

    #[test]
    fn test_partial_page_rejected() {
        let err = CheckedFile::new(
            "bad",
            Box::new(MemoryBackend::from_bytes(vec![0; 1000])),
            PageLayout::STANDARD,
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadFileLength);
    }

    #[test]
    fn test_offset_translation() {
        let cf = memory_file();
        assert_eq!(cf.logical_to_physical(1020), 1024);
        assert_eq!(cf.physical_to_logical(1024).unwrap(), 1020);
        assert_eq!(
            cf.physical_to_logical(1021).unwrap_err().code(),
            ErrorCode::BadApiArgument
        );
    }
}
