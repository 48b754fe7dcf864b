//! Binary section header preceding every blob payload

use bytemuck::{Pod, Zeroable};
use core::mem::size_of;

use super::constants::section_id;
use crate::{ErrorCode, Result};

/// Fixed-size header at the start of a blob binary section
///
/// All multi-byte fields are little-endian on disk.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlobSectionHeader {
    /// Section kind, always [`section_id::BLOB`]
    pub section_id: u8,
    /// Reserved, written as zero
    pub reserved: [u8; 7],
    /// Length of the whole section (header + payload + padding)
    pub section_logical_length: u64,
}

impl BlobSectionHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// Create a header for a section of the given total logical length
    pub const fn new(section_logical_length: u64) -> Self {
        Self {
            section_id: section_id::BLOB,
            reserved: [0; 7],
            section_logical_length,
        }
    }

    /// Validate the section id and alignment of the recorded length
    pub fn is_valid(&self) -> bool {
        self.section_id == section_id::BLOB
            && self.section_logical_length >= Self::SIZE as u64
            && self.section_logical_length % super::constants::SECTION_ALIGNMENT == 0
    }

    /// Read a header from its on-disk encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ErrorCode::BadFileLength);
        }

        let mut header: Self = bytemuck::pod_read_unaligned(&bytes[..Self::SIZE]);
        header.section_logical_length = u64::from_le(header.section_logical_length);

        if !header.is_valid() {
            return Err(ErrorCode::BadXmlFormat);
        }

        Ok(header)
    }

    /// Encode the header for writing
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.section_id;
        bytes[1..8].copy_from_slice(&self.reserved);
        bytes[8..16].copy_from_slice(&self.section_logical_length.to_le_bytes());
        bytes
    }
}

impl Default for BlobSectionHeader {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(BlobSectionHeader::SIZE, 16);
    }

    #[test]
    fn test_header_encoding() {
        let header = BlobSectionHeader::new(24);
        let bytes = header.to_bytes();
        assert_eq!(bytes[0], 0);
        assert_eq!(&bytes[1..8], &[0u8; 7]);
        assert_eq!(&bytes[8..16], &24u64.to_le_bytes());
        assert_eq!(BlobSectionHeader::from_bytes(&bytes), Ok(header));
    }

    #[test]
    fn test_header_rejects_bad_input() {
        assert_eq!(
            BlobSectionHeader::from_bytes(&[0u8; 8]),
            Err(ErrorCode::BadFileLength)
        );

        let mut bytes = BlobSectionHeader::new(24).to_bytes();
        bytes[0] = 1;
        assert_eq!(
            BlobSectionHeader::from_bytes(&bytes),
            Err(ErrorCode::BadXmlFormat)
        );

        // unaligned section length
        let bytes = BlobSectionHeader::new(21).to_bytes();
        assert!(BlobSectionHeader::from_bytes(&bytes).is_err());
    }
}
