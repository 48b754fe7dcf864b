//! File header stored at the start of every E57 file
//!
//! The header lives in the first logical bytes of page 0 and records where
//! the XML section starts and how long the whole file is.

use bytemuck::{Pod, Zeroable};
use core::mem::size_of;

use super::constants::{FILE_SIGNATURE, FORMAT_MAJOR, FORMAT_MINOR, PAGE_SIZE};
use crate::{ErrorCode, Result};

/// Fixed-size E57 file header (48 bytes, little-endian)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileHeader {
    /// Signature: "ASTM-E57"
    pub signature: [u8; 8],
    /// Major version of the standard
    pub major_version: u32,
    /// Minor version of the standard
    pub minor_version: u32,
    /// Total physical length of the file, a multiple of the page size
    pub file_physical_length: u64,
    /// Physical offset of the first byte of the XML section
    pub xml_physical_offset: u64,
    /// Logical length of the XML section
    pub xml_logical_length: u64,
    /// Physical page size used by the checked byte stream
    pub page_size: u64,
}

impl FileHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// Create a header for the current format version
    pub const fn new() -> Self {
        Self {
            signature: FILE_SIGNATURE,
            major_version: FORMAT_MAJOR,
            minor_version: FORMAT_MINOR,
            file_physical_length: 0,
            xml_physical_offset: 0,
            xml_logical_length: 0,
            page_size: PAGE_SIZE,
        }
    }

    /// Read and validate a header from its on-disk encoding
    ///
    /// `actual_physical_length` is the size of the byte stream the header
    /// was read from.
    pub fn from_bytes(bytes: &[u8], actual_physical_length: u64) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ErrorCode::BadFileLength);
        }

        if bytes[0..8] != FILE_SIGNATURE {
            return Err(ErrorCode::BadFileSignature);
        }

        let mut header: Self = bytemuck::pod_read_unaligned(&bytes[..Self::SIZE]);
        header.major_version = u32::from_le(header.major_version);
        header.minor_version = u32::from_le(header.minor_version);
        header.file_physical_length = u64::from_le(header.file_physical_length);
        header.xml_physical_offset = u64::from_le(header.xml_physical_offset);
        header.xml_logical_length = u64::from_le(header.xml_logical_length);
        header.page_size = u64::from_le(header.page_size);

        // Minor versions are forward compatible, major versions are not
        if header.major_version != FORMAT_MAJOR {
            return Err(ErrorCode::UnknownFileVersion);
        }

        if header.file_physical_length != actual_physical_length
            || header.page_size == 0
            || header.file_physical_length % header.page_size != 0
            || header.xml_physical_offset >= header.file_physical_length
        {
            return Err(ErrorCode::BadFileLength);
        }

        Ok(header)
    }

    /// Encode the header for writing
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.signature);
        bytes[8..12].copy_from_slice(&self.major_version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.minor_version.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.file_physical_length.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.xml_physical_offset.to_le_bytes());
        bytes[32..40].copy_from_slice(&self.xml_logical_length.to_le_bytes());
        bytes[40..48].copy_from_slice(&self.page_size.to_le_bytes());
        bytes
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}
