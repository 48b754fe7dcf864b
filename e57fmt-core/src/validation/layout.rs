//! Binary layout arithmetic for E57 files
//!
//! Pure functions over offsets: section padding and the translation between
//! logical offsets (checksum slots skipped) and physical file offsets.

use crate::format::constants::{CHECKSUM_SIZE, PAGE_SIZE, SECTION_ALIGNMENT};
use crate::format::{BlobSectionHeader, FileHeader};
use crate::ErrorCode;

/// Align an offset to a specific boundary
///
/// `boundary` must be a power of two. Returns `None` if the aligned offset
/// does not fit in 64 bits.
pub const fn align_to_boundary(offset: u64, boundary: u64) -> Option<u64> {
    match offset.checked_add(boundary - 1) {
        Some(end) => Some(end & !(boundary - 1)),
        None => None,
    }
}

/// Total logical length of a blob section carrying `payload_length` bytes
///
/// Header plus payload, rounded up to the next multiple of four. Returns
/// `None` if the length does not fit in 64 bits.
pub const fn blob_section_logical_length(payload_length: u64) -> Option<u64> {
    match payload_length.checked_add(BlobSectionHeader::SIZE as u64) {
        Some(unpadded) => align_to_boundary(unpadded, SECTION_ALIGNMENT),
        None => None,
    }
}

/// Validate that a page size can carry the E57 page framing
///
/// The page must be a power of two and its logical part must hold the
/// whole file header.
pub const fn validate_page_size(page_size: u64) -> Result<(), ErrorCode> {
    if page_size == 0 || (page_size & (page_size - 1)) != 0 {
        return Err(ErrorCode::BadConfiguration);
    }
    if page_size < CHECKSUM_SIZE + FileHeader::SIZE as u64 {
        return Err(ErrorCode::BadConfiguration);
    }
    Ok(())
}

/// Page framing of the checked byte stream
///
/// Every physical page ends with a checksum slot; logical offsets count
/// only payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: u64,
}

impl PageLayout {
    /// Layout with the standard 1024 byte page
    pub const STANDARD: PageLayout = PageLayout {
        page_size: PAGE_SIZE,
    };

    /// Create a layout with a validated page size
    pub const fn new(page_size: u64) -> Result<Self, ErrorCode> {
        match validate_page_size(page_size) {
            Ok(()) => Ok(Self { page_size }),
            Err(e) => Err(e),
        }
    }

    /// Physical bytes per page
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Logical bytes per page
    pub const fn logical_page_size(&self) -> u64 {
        self.page_size - CHECKSUM_SIZE
    }

    /// Translate a logical offset to its physical position
    pub const fn logical_to_physical(&self, logical: u64) -> u64 {
        let page = logical / self.logical_page_size();
        let remainder = logical % self.logical_page_size();
        page * self.page_size + remainder
    }

    /// Translate a physical offset to logical space
    ///
    /// Returns `None` when the offset lands inside a checksum slot.
    pub const fn physical_to_logical(&self, physical: u64) -> Option<u64> {
        let page = physical / self.page_size;
        let remainder = physical % self.page_size;
        if remainder >= self.logical_page_size() {
            return None;
        }
        Some(page * self.logical_page_size() + remainder)
    }

    /// Number of pages needed to carry `logical_length` bytes
    pub const fn page_count(&self, logical_length: u64) -> u64 {
        logical_length.div_ceil(self.logical_page_size())
    }

    /// Physical length of a stream carrying `logical_length` bytes
    ///
    /// Always a whole number of pages. Returns `None` if the length does not
    /// fit in 64 bits.
    pub const fn physical_length(&self, logical_length: u64) -> Option<u64> {
        self.page_count(logical_length).checked_mul(self.page_size)
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_to_boundary() {
        assert_eq!(align_to_boundary(0, 4), Some(0));
        assert_eq!(align_to_boundary(1, 4), Some(4));
        assert_eq!(align_to_boundary(3, 4), Some(4));
        assert_eq!(align_to_boundary(4, 4), Some(4));
        assert_eq!(align_to_boundary(5, 4), Some(8));
        assert_eq!(align_to_boundary(9, 8), Some(16));
        assert_eq!(align_to_boundary(u64::MAX - 1, 4), None);
    }

    #[test]
    fn test_blob_section_length() {
        assert_eq!(blob_section_logical_length(0), Some(16));
        assert_eq!(blob_section_logical_length(1), Some(20));
        assert_eq!(blob_section_logical_length(4), Some(20));
        assert_eq!(blob_section_logical_length(5), Some(24));
        assert_eq!(blob_section_logical_length(8), Some(24));
        assert_eq!(blob_section_logical_length(u64::MAX), None);
    }

    #[test]
    fn test_blob_section_length_invariants() {
        for n in 0..200u64 {
            let len = blob_section_logical_length(n).unwrap();
            assert_eq!(len % 4, 0);
            assert!(len >= 16 + n);
            assert!(len < 16 + n + 4);
        }
    }

    #[test]
    fn test_validate_page_size() {
        assert_eq!(validate_page_size(1024), Ok(()));
        assert_eq!(validate_page_size(64), Ok(()));
        assert_eq!(validate_page_size(0), Err(ErrorCode::BadConfiguration));
        assert_eq!(validate_page_size(1000), Err(ErrorCode::BadConfiguration));
        assert_eq!(validate_page_size(32), Err(ErrorCode::BadConfiguration));
    }

    #[test]
    fn test_offset_translation() {
        let layout = PageLayout::STANDARD;
        assert_eq!(layout.logical_page_size(), 1020);
        assert_eq!(layout.logical_to_physical(0), 0);
        assert_eq!(layout.logical_to_physical(1019), 1019);
        assert_eq!(layout.logical_to_physical(1020), 1024);
        assert_eq!(layout.logical_to_physical(2041), 2049);

        assert_eq!(layout.physical_to_logical(1024), Some(1020));
        assert_eq!(layout.physical_to_logical(1020), None);
        assert_eq!(layout.physical_to_logical(1023), None);

        for logical in (0..10_000).step_by(7) {
            let physical = layout.logical_to_physical(logical);
            assert_eq!(layout.physical_to_logical(physical), Some(logical));
        }
    }

    #[test]
    fn test_physical_length() {
        let layout = PageLayout::STANDARD;
        assert_eq!(layout.physical_length(0), Some(0));
        assert_eq!(layout.physical_length(1), Some(1024));
        assert_eq!(layout.physical_length(1020), Some(1024));
        assert_eq!(layout.physical_length(1021), Some(2048));
        assert_eq!(layout.physical_length(u64::MAX - 1000), None);
    }
}
